//! In-process registry.
//!
//! Holds index entries in memory and counts lookups, so resolver and engine
//! tests can assert on registry traffic without a server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;
use semver::Version;

use super::{ArtifactKind, IndexEntry, IndexVersion, RegistryClient};
use crate::core::ContentDigest;
use crate::error::{Result, SkillError};

pub struct MemoryRegistry {
    source: String,
    entries: RwLock<HashMap<String, IndexEntry>>,
    lookups: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryRegistry {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entries: RwLock::new(HashMap::new()),
            lookups: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    /// Publish one version. Re-publishing a version replaces it.
    pub fn publish(
        &self,
        name: &str,
        version: &str,
        url: &str,
        digest: ContentDigest,
        kind: ArtifactKind,
    ) -> Result<()> {
        let version = Version::parse(version).map_err(|err| SkillError::InvalidIndex {
            name: name.to_string(),
            reason: err.to_string(),
        })?;

        let mut entries = self.entries.write();
        let entry = entries.entry(name.to_string()).or_insert_with(|| IndexEntry {
            name: name.to_string(),
            url_template: None,
            versions: Vec::new(),
            source: self.source.clone(),
        });
        entry.versions.retain(|v| v.version != version);
        entry.versions.push(IndexVersion {
            version,
            digest,
            url: Some(url.to_string()),
            kind,
            yanked: false,
        });
        entry.versions.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(())
    }

    /// Mark a published version as yanked.
    pub fn yank(&self, name: &str, version: &str) {
        if let Some(entry) = self.entries.write().get_mut(name) {
            for v in &mut entry.versions {
                if v.version.to_string() == version {
                    v.yanked = true;
                }
            }
        }
    }

    /// Simulate an outage: every lookup fails with `RegistryUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `fetch_index` calls so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl RegistryClient for MemoryRegistry {
    fn source(&self) -> &str {
        &self.source
    }

    fn fetch_index(&self, name: &str) -> Result<IndexEntry> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(SkillError::RegistryUnavailable {
                source_url: self.source.clone(),
                reason: "offline".to_string(),
            });
        }
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| SkillError::NotFound {
                name: name.to_string(),
            })
    }
}
