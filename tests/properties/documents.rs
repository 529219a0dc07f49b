use std::path::Path;

use proptest::prelude::*;
use semver::Version;

use skill::core::{ContentDigest, VersionConstraint};
use skill::registry::{ArtifactKind, ResolvedArtifact};
use skill::storage::{LockStatus, Lockfile, Manifest, Requirement};

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}"
}

fn arb_constraint() -> impl Strategy<Value = VersionConstraint> {
    prop_oneof![
        Just("latest".to_string()),
        (0u64..4, 0u64..10, 0u64..10).prop_map(|(a, b, c)| format!("{a}.{b}.{c}")),
        (0u64..4, 0u64..10).prop_map(|(a, b)| format!("^{a}.{b}")),
        (0u64..4, 0u64..10).prop_map(|(a, b)| format!(">={a}.{b}, <{}.0", a + 1)),
    ]
    .prop_map(|raw| VersionConstraint::parse(&raw).unwrap())
}

fn arb_requirements() -> impl Strategy<Value = Vec<Requirement>> {
    prop::collection::vec((arb_name(), arb_constraint()), 0..8).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(name, version)| Requirement::new(name, version).unwrap())
            .collect()
    })
}

fn arb_artifacts() -> impl Strategy<Value = Vec<ResolvedArtifact>> {
    prop::collection::btree_map(arb_name(), (0u64..5, 0u64..20, 0u64..20, any::<bool>()), 0..8)
        .prop_map(|map| {
            map.into_iter()
                .map(|(name, (major, minor, patch, bundle))| ResolvedArtifact {
                    url: format!("https://r.example/{name}/{major}.{minor}.{patch}"),
                    digest: ContentDigest::of_bytes(name.as_bytes()),
                    version: Version::new(major, minor, patch),
                    kind: if bundle {
                        ArtifactKind::Bundle
                    } else {
                        ArtifactKind::Markdown
                    },
                    source: "https://r.example".to_string(),
                    name,
                })
                .collect()
        })
}

proptest! {
    #[test]
    fn manifest_text_round_trips(requirements in arb_requirements()) {
        let manifest = Manifest::from_requirements(requirements).unwrap();
        let text = manifest.to_toml_string().unwrap();
        let parsed = Manifest::parse(Path::new("skill.toml"), &text).unwrap();
        prop_assert_eq!(parsed, manifest);
    }

    #[test]
    fn requirements_digest_ignores_order(requirements in arb_requirements()) {
        let forward = Manifest::from_requirements(requirements.clone()).unwrap();
        let mut reversed = requirements;
        reversed.reverse();
        let backward = Manifest::from_requirements(reversed).unwrap();
        prop_assert_eq!(forward.requirements_digest(), backward.requirements_digest());
    }

    #[test]
    fn lockfile_text_round_trips(entries in arb_artifacts()) {
        let lockfile = Lockfile::new(ContentDigest::of_bytes(b"manifest"), entries).unwrap();
        let text = lockfile.to_toml_string().unwrap();
        let parsed = Lockfile::parse(Path::new("skill.lock"), &text).unwrap();
        prop_assert_eq!(parsed.entries(), lockfile.entries());
        prop_assert_eq!(parsed.manifest_digest(), lockfile.manifest_digest());
    }

    #[test]
    fn lockfile_entries_are_sorted_by_name(mut entries in arb_artifacts()) {
        entries.reverse();
        let lockfile = Lockfile::new(ContentDigest::of_bytes(b"m"), entries).unwrap();
        let names: Vec<&str> = lockfile.entries().iter().map(|e| e.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        prop_assert_eq!(names, sorted);
    }

    #[test]
    fn lockfile_built_from_a_manifest_is_current(entries in arb_artifacts()) {
        let requirements = entries
            .iter()
            .map(|e| {
                let exact = VersionConstraint::parse(&e.version.to_string()).unwrap();
                Requirement::new(e.name.clone(), exact).unwrap()
            })
            .collect();
        let manifest = Manifest::from_requirements(requirements).unwrap();
        let lockfile = Lockfile::new(manifest.requirements_digest(), entries).unwrap();
        prop_assert_eq!(lockfile.check_against(&manifest), LockStatus::Current);
    }
}
