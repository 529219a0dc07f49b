//! Ordered list of registries.
//!
//! The first registry that knows a name answers for it. A registry that
//! does not know the name passes the lookup on; an unreachable one is
//! skipped, and if nobody answers the outage is reported instead of a
//! misleading "not found".

use tracing::{debug, warn};

use super::{HttpRegistry, IndexEntry, LocalRegistry, RegistryClient};
use crate::config::Config;
use crate::error::{Result, SkillError};

pub struct SourceList {
    sources: Vec<Box<dyn RegistryClient>>,
    label: String,
}

impl SourceList {
    #[must_use]
    pub fn new(sources: Vec<Box<dyn RegistryClient>>) -> Self {
        let label = sources
            .iter()
            .map(|s| s.source().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self { sources, label }
    }

    /// Build clients for `registry.sources`.
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.registry.sources.is_empty() {
            return Err(SkillError::MissingConfig("registry.sources".to_string()));
        }
        let sources = config
            .registry
            .sources
            .iter()
            .map(|location| open_source(location, config))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(sources))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn open_source(location: &str, config: &Config) -> Result<Box<dyn RegistryClient>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpRegistry::new(location, config.fetch.timeout)?))
    } else if location.starts_with("file://") || !super::is_absolute_url(location) {
        Ok(Box::new(LocalRegistry::open(location)?))
    } else {
        Err(SkillError::Config(format!(
            "unsupported registry source '{location}' (expected http(s)://, file:// or a path)"
        )))
    }
}

impl RegistryClient for SourceList {
    fn source(&self) -> &str {
        &self.label
    }

    fn fetch_index(&self, name: &str) -> Result<IndexEntry> {
        let mut outage = None;

        for source in &self.sources {
            match source.fetch_index(name) {
                Ok(entry) => return Ok(entry),
                Err(SkillError::NotFound { .. }) => {
                    debug!(skill = name, source = source.source(), "not in registry");
                }
                Err(err @ SkillError::RegistryUnavailable { .. }) => {
                    warn!(skill = name, source = source.source(), "registry unavailable: {err}");
                    outage.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(outage.unwrap_or_else(|| SkillError::NotFound {
            name: name.to_string(),
        }))
    }
}
