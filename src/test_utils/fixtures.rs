use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use semver::Version;
use tempfile::TempDir;

use crate::core::ContentDigest;
use crate::error::{Result, SkillError};
use crate::registry::local::file_url;
use crate::registry::{ArtifactKind, IndexEntry, IndexVersion, LocalRegistry};
use crate::vendor::artifact::pack_directory;

/// A filesystem registry in a temporary directory.
///
/// Artifacts land under `artifacts/<name>/<version>` and every publish
/// rewrites `index/<name>.json` with relative URLs, the same layout an HTTP
/// registry serves.
pub struct RegistryFixture {
    pub temp_dir: TempDir,
    entries: BTreeMap<String, IndexEntry>,
}

impl RegistryFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            entries: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// `file://` URL suitable for `registry.sources` or `SKILL_REGISTRY`.
    #[must_use]
    pub fn location(&self) -> String {
        file_url(self.root())
    }

    pub fn registry(&self) -> Result<LocalRegistry> {
        LocalRegistry::open(&self.location())
    }

    /// Publish a markdown skill and return its digest.
    pub fn publish(&mut self, name: &str, version: &str, body: &str) -> Result<ContentDigest> {
        self.publish_bytes(name, version, body.as_bytes(), ArtifactKind::Markdown)
    }

    /// Publish the directory tree at `dir` as a bundle.
    pub fn publish_bundle(&mut self, name: &str, version: &str, dir: &Path) -> Result<ContentDigest> {
        let bytes = pack_directory(dir)?;
        self.publish_bytes(name, version, &bytes, ArtifactKind::Bundle)
    }

    pub fn publish_bytes(
        &mut self,
        name: &str,
        version: &str,
        bytes: &[u8],
        kind: ArtifactKind,
    ) -> Result<ContentDigest> {
        let parsed = parse_version(version)?;
        let relative = format!("artifacts/{name}/{version}");
        let path = self.root().join(&relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;

        let digest = ContentDigest::of_bytes(bytes);
        let entry = self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| IndexEntry {
                name: name.to_string(),
                url_template: None,
                versions: Vec::new(),
                source: String::new(),
            });
        entry.versions.retain(|v| v.version != parsed);
        entry.versions.push(IndexVersion {
            version: parsed,
            digest: digest.clone(),
            url: Some(relative),
            kind,
            yanked: false,
        });
        entry.versions.sort_by(|a, b| a.version.cmp(&b.version));
        self.write_index(name)?;
        Ok(digest)
    }

    pub fn yank(&mut self, name: &str, version: &str) -> Result<()> {
        let parsed = parse_version(version)?;
        if let Some(entry) = self.entries.get_mut(name) {
            for published in &mut entry.versions {
                if published.version == parsed {
                    published.yanked = true;
                }
            }
        }
        self.write_index(name)
    }

    /// Overwrite a published artifact so it no longer matches its digest.
    pub fn tamper(&self, name: &str, version: &str, bytes: &[u8]) -> Result<()> {
        std::fs::write(self.artifact_path(name, version), bytes)?;
        Ok(())
    }

    #[must_use]
    pub fn artifact_path(&self, name: &str, version: &str) -> PathBuf {
        self.root().join("artifacts").join(name).join(version)
    }

    fn write_index(&self, name: &str) -> Result<()> {
        let entry = self.entries.get(name).ok_or_else(|| SkillError::NotFound {
            name: name.to_string(),
        })?;
        let dir = self.root().join("index");
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(format!("{name}.json")), serde_json::to_vec_pretty(entry)?)?;
        Ok(())
    }
}

fn parse_version(raw: &str) -> Result<Version> {
    Version::parse(raw)
        .map_err(|err| SkillError::ValidationFailed(format!("invalid version '{raw}': {err}")))
}
