//! The generated lockfile, `skill.lock`.
//!
//! Entries are kept sorted by name and the file carries no timestamps, so
//! the same resolution always serializes to the same bytes.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{atomic_write, check_schema, corrupt, Manifest, SCHEMA_VERSION};
use crate::core::{validate_skill_name, ContentDigest};
use crate::error::{Result, SkillError};
use crate::registry::ResolvedArtifact;

pub const LOCKFILE_FILE: &str = "skill.lock";

const HEADER: &str = "# This file is generated by `skill lock`. Do not edit it by hand.\n\n";

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LockDocument {
    version: u32,
    manifest_digest: ContentDigest,
    #[serde(default, rename = "skill", skip_serializing_if = "Vec::is_empty")]
    skills: Vec<ResolvedArtifact>,
}

/// How a lockfile relates to the current manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockStatus {
    /// Generated from exactly this manifest.
    Current,
    /// The manifest changed, but every locked version still satisfies it.
    Satisfied,
    /// These skills are missing, extra, or locked to a version the manifest
    /// no longer accepts.
    Stale(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lockfile {
    manifest_digest: ContentDigest,
    entries: Vec<ResolvedArtifact>,
}

impl Lockfile {
    /// Build a lockfile. Entries are sorted; a name may appear only once.
    pub fn new(manifest_digest: ContentDigest, mut entries: Vec<ResolvedArtifact>) -> Result<Self> {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = entries.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(SkillError::ValidationFailed(format!(
                "skill '{}' is locked more than once",
                pair[0].name
            )));
        }
        Ok(Self {
            manifest_digest,
            entries,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    /// Like [`Lockfile::load`], but a missing file is `Ok(None)`.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content).map(Some),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        check_schema(path, content)?;
        let doc: LockDocument = toml::from_str(content).map_err(|err| corrupt(path, &err))?;
        for entry in &doc.skills {
            validate_skill_name(&entry.name).map_err(|err| corrupt(path, &err))?;
        }
        Self::new(doc.manifest_digest, doc.skills).map_err(|err| corrupt(path, &err))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        atomic_write(path, self.to_toml_string()?.as_bytes())
    }

    /// Write to `path` unless it already holds exactly these bytes.
    ///
    /// Returns whether the file changed.
    pub fn save_if_changed(&self, path: &Path) -> Result<bool> {
        let rendered = self.to_toml_string()?;
        match fs::read(path) {
            Ok(existing) if existing == rendered.as_bytes() => return Ok(false),
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        atomic_write(path, rendered.as_bytes())?;
        Ok(true)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let doc = LockDocument {
            version: SCHEMA_VERSION,
            manifest_digest: self.manifest_digest.clone(),
            skills: self.entries.clone(),
        };
        let body = toml::to_string(&doc)
            .map_err(|err| SkillError::ValidationFailed(format!("serialize lockfile: {err}")))?;
        Ok(format!("{HEADER}{body}"))
    }

    #[must_use]
    pub fn entries(&self) -> &[ResolvedArtifact] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResolvedArtifact> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    #[must_use]
    pub const fn manifest_digest(&self) -> &ContentDigest {
        &self.manifest_digest
    }

    /// Same entries, recorded against a different manifest.
    #[must_use]
    pub fn with_manifest_digest(mut self, manifest_digest: ContentDigest) -> Self {
        self.manifest_digest = manifest_digest;
        self
    }

    /// Compare against `manifest`.
    #[must_use]
    pub fn check_against(&self, manifest: &Manifest) -> LockStatus {
        let mut stale = BTreeSet::new();

        for req in manifest.requirements() {
            match self.get(&req.name) {
                Some(entry) if req.version.matches(&entry.version) => {}
                _ => {
                    stale.insert(req.name.clone());
                }
            }
        }
        for entry in &self.entries {
            if !manifest.contains(&entry.name) {
                stale.insert(entry.name.clone());
            }
        }

        if !stale.is_empty() {
            LockStatus::Stale(stale.into_iter().collect())
        } else if self.manifest_digest == manifest.requirements_digest() {
            LockStatus::Current
        } else {
            LockStatus::Satisfied
        }
    }
}
