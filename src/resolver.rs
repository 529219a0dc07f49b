//! Manifest resolution.
//!
//! Requirements are grouped by name and each group is one registry lookup.
//! Lookups run concurrently on a bounded pool; results are sorted by name
//! before anything is returned, so the outcome never depends on scheduling.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::core::{worker_pool, CancellationToken, VersionConstraint};
use crate::error::Result;
use crate::registry::{self, RegistryClient, ResolvedArtifact};
use crate::storage::{Lockfile, Manifest};

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Maximum concurrent registry lookups.
    pub concurrency: usize,
    pub cancel: CancellationToken,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            cancel: CancellationToken::new(),
        }
    }
}

/// One artifact per requested skill, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    entries: Vec<ResolvedArtifact>,
}

impl Resolution {
    #[must_use]
    pub fn entries(&self) -> &[ResolvedArtifact] {
        &self.entries
    }

    /// The lockfile recording this resolution for `manifest`.
    pub fn into_lockfile(self, manifest: &Manifest) -> Result<Lockfile> {
        Lockfile::new(manifest.requirements_digest(), self.entries)
    }
}

/// Resolve every requirement in `manifest` against `registry`.
///
/// Fails as a whole if any skill cannot be resolved. When several skills
/// fail, the error reported is the one for the first name in sort order.
pub fn resolve(
    manifest: &Manifest,
    registry: &dyn RegistryClient,
    options: &ResolveOptions,
) -> Result<Resolution> {
    resolve_with(manifest, registry, options, None)
}

/// Like [`resolve`], but a skill whose entry in `previous` still satisfies
/// every constraint on it keeps that entry without a registry lookup.
/// Skills `previous` does not mention, or locks to an unacceptable version,
/// are resolved; entries for names no longer in the manifest are dropped.
pub fn resolve_stale(
    manifest: &Manifest,
    registry: &dyn RegistryClient,
    options: &ResolveOptions,
    previous: &Lockfile,
) -> Result<Resolution> {
    resolve_with(manifest, registry, options, Some(previous))
}

fn resolve_with(
    manifest: &Manifest,
    registry: &dyn RegistryClient,
    options: &ResolveOptions,
    previous: Option<&Lockfile>,
) -> Result<Resolution> {
    let mut groups: BTreeMap<&str, Vec<VersionConstraint>> = BTreeMap::new();
    for req in manifest.requirements() {
        groups
            .entry(req.name.as_str())
            .or_default()
            .push(req.version.clone());
    }

    let mut kept = Vec::new();
    let mut lookups = Vec::new();
    for (name, constraints) in groups {
        let locked = previous
            .and_then(|lockfile| lockfile.get(name))
            .filter(|entry| constraints.iter().all(|c| c.matches(&entry.version)));
        match locked {
            Some(entry) => {
                debug!(skill = name, version = %entry.version, "keeping locked version");
                kept.push(entry.clone());
            }
            None => lookups.push((name, constraints)),
        }
    }
    info!(skills = lookups.len(), kept = kept.len(), "resolving manifest");

    let pool = worker_pool(options.concurrency, "resolve")?;
    let results: Vec<Result<ResolvedArtifact>> = pool.install(|| {
        lookups
            .par_iter()
            .map(|(name, constraints)| {
                options.cancel.check()?;
                let entry = registry.fetch_index(name)?;
                let artifact = registry::select(&entry, constraints)?;
                debug!(
                    skill = *name,
                    version = %artifact.version,
                    source = %artifact.source,
                    "resolved"
                );
                Ok(artifact)
            })
            .collect()
    });

    let mut entries = results.into_iter().collect::<Result<Vec<_>>>()?;
    entries.extend(kept);
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Resolution { entries })
}
