use proptest::prelude::*;

use skill::core::{ContentDigest, VersionConstraint};
use skill::registry::{ArtifactKind, MemoryRegistry};
use skill::resolver::{resolve, ResolveOptions};
use skill::storage::{Manifest, Requirement};

const NAMES: [&str; 6] = ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"];

fn registry(published: &[(usize, u64, u64)]) -> MemoryRegistry {
    let registry = MemoryRegistry::new("memory://props");
    for &(name, major, minor) in published {
        let name = NAMES[name];
        let version = format!("{major}.{minor}.0");
        registry
            .publish(
                name,
                &version,
                &format!("memory://props/{name}/{version}"),
                ContentDigest::of_bytes(format!("{name}@{version}").as_bytes()),
                ArtifactKind::Markdown,
            )
            .unwrap();
    }
    registry
}

fn arb_published() -> impl Strategy<Value = Vec<(usize, u64, u64)>> {
    prop::collection::vec((0..NAMES.len(), 0u64..4, 0u64..6), 1..20)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn resolution_is_deterministic_and_maximal(
        published in arb_published(),
        concurrency in 1usize..8,
    ) {
        let registry = registry(&published);
        let mut names: Vec<usize> = published.iter().map(|p| p.0).collect();
        names.sort_unstable();
        names.dedup();
        let requirements = names
            .iter()
            .rev()
            .map(|&i| Requirement::new(NAMES[i], VersionConstraint::latest()).unwrap())
            .collect();
        let manifest = Manifest::from_requirements(requirements).unwrap();

        let serial = resolve(&manifest, &registry, &ResolveOptions {
            concurrency: 1,
            ..ResolveOptions::default()
        })
        .unwrap();
        let parallel = resolve(&manifest, &registry, &ResolveOptions {
            concurrency,
            ..ResolveOptions::default()
        })
        .unwrap();
        prop_assert_eq!(&serial, &parallel);

        let resolved: Vec<&str> = serial.entries().iter().map(|e| e.name.as_str()).collect();
        let mut expected: Vec<&str> = names.iter().map(|&i| NAMES[i]).collect();
        expected.sort_unstable();
        prop_assert_eq!(resolved, expected);

        for entry in serial.entries() {
            let idx = NAMES.iter().position(|n| *n == entry.name).unwrap();
            let highest = published
                .iter()
                .filter(|p| p.0 == idx)
                .map(|p| (p.1, p.2))
                .max()
                .unwrap();
            prop_assert_eq!((entry.version.major, entry.version.minor), highest);
        }
    }

    #[test]
    fn every_selected_version_satisfies_its_constraint(
        published in arb_published(),
        major in 0u64..4,
    ) {
        let registry = registry(&published);
        let constraint = VersionConstraint::parse(&format!("^{major}")).unwrap();
        let manifest = Manifest::from_requirements(vec![
            Requirement::new("alpha", constraint.clone()).unwrap(),
        ])
        .unwrap();

        match resolve(&manifest, &registry, &ResolveOptions::default()) {
            Ok(resolution) => {
                prop_assert!(constraint.matches(&resolution.entries()[0].version));
            }
            Err(err) => {
                let code = err.code().to_string();
                prop_assert!(code == "E101" || code == "E102", "unexpected error {code}");
            }
        }
    }
}
