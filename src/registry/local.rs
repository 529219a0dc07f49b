//! Registry on the local filesystem.
//!
//! Same layout as the HTTP registry, rooted at a directory:
//! `<root>/index/<name>.json`. Useful for mirrors, air-gapped setups and
//! tests.

use std::path::{Path, PathBuf};

use super::{IndexEntry, RegistryClient};
use crate::core::validate_skill_name;
use crate::error::{Result, SkillError};

pub struct LocalRegistry {
    root: PathBuf,
    source: String,
}

impl LocalRegistry {
    /// Open a registry from a `file://` URL or a directory path.
    pub fn open(location: &str) -> Result<Self> {
        let path = path_from_file_url(location).unwrap_or_else(|| PathBuf::from(location));
        let root = std::path::absolute(&path)?;
        Ok(Self {
            source: file_url(&root),
            root,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl RegistryClient for LocalRegistry {
    fn source(&self) -> &str {
        &self.source
    }

    fn fetch_index(&self, name: &str) -> Result<IndexEntry> {
        validate_skill_name(name)?;

        if !self.root.is_dir() {
            return Err(SkillError::RegistryUnavailable {
                source_url: self.source.clone(),
                reason: "registry directory does not exist".to_string(),
            });
        }

        let path = self.root.join("index").join(format!("{name}.json"));
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(SkillError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(err) => {
                return Err(SkillError::RegistryUnavailable {
                    source_url: self.source.clone(),
                    reason: format!("read {}: {err}", path.display()),
                });
            }
        };

        IndexEntry::from_json(name, &bytes, &self.source, |relative| {
            file_url(&self.root.join(relative))
        })
    }
}

/// `file://` URL for an absolute path.
#[must_use]
pub fn file_url(path: &Path) -> String {
    let display = path.to_string_lossy().replace('\\', "/");
    if display.starts_with('/') {
        format!("file://{display}")
    } else {
        format!("file:///{display}")
    }
}

/// Local path named by a `file://` URL.
#[must_use]
pub fn path_from_file_url(url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix("file://")?;
    let decoded = urlencoding::decode(rest).map_or_else(|_| rest.to_string(), |s| s.into_owned());
    // Windows drive paths arrive as /C:/...
    let trimmed = if decoded.len() > 2 && decoded.as_bytes()[2] == b':' {
        decoded[1..].to_string()
    } else {
        decoded
    };
    Some(PathBuf::from(trimmed))
}
