//! The project manifest, `skill.toml`.
//!
//! ```toml
//! version = 1
//!
//! [[skill]]
//! name = "alpha"
//! version = "^1.0.0"
//! ```
//!
//! Requirements keep file order. Duplicate names survive a load so the
//! resolver can report conflicting constraints instead of silently picking
//! one.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{atomic_write, check_schema, corrupt, SCHEMA_VERSION};
use crate::core::{validate_skill_name, ContentDigest, VersionConstraint};
use crate::error::{Result, SkillError};

pub const MANIFEST_FILE: &str = "skill.toml";

/// One requested skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Requirement {
    pub name: String,
    #[serde(default)]
    pub version: VersionConstraint,
}

impl Requirement {
    pub fn new(name: impl Into<String>, version: VersionConstraint) -> Result<Self> {
        let name = name.into();
        validate_skill_name(&name)?;
        Ok(Self { name, version })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestDocument {
    version: u32,
    #[serde(default, rename = "skill", skip_serializing_if = "Vec::is_empty")]
    skills: Vec<Requirement>,
}

/// What [`Manifest::add`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// An entry with the same name existed; holds its old constraint.
    Replaced(VersionConstraint),
    Unchanged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    requirements: Vec<Requirement>,
}

impl Manifest {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requirements: Vec::new(),
        }
    }

    /// Build a manifest from requirements, validating every name.
    pub fn from_requirements(requirements: Vec<Requirement>) -> Result<Self> {
        for req in &requirements {
            validate_skill_name(&req.name)?;
        }
        Ok(Self { requirements })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    /// Parse manifest text. `path` is only used in error messages.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        check_schema(path, content)?;
        let doc: ManifestDocument = toml::from_str(content).map_err(|err| corrupt(path, &err))?;
        for req in &doc.skills {
            validate_skill_name(&req.name).map_err(|err| corrupt(path, &err))?;
        }
        Ok(Self {
            requirements: doc.skills,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        atomic_write(path, self.to_toml_string()?.as_bytes())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let doc = ManifestDocument {
            version: SCHEMA_VERSION,
            skills: self.requirements.clone(),
        };
        toml::to_string(&doc)
            .map_err(|err| SkillError::ValidationFailed(format!("serialize manifest: {err}")))
    }

    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.requirements.iter().any(|r| r.name == name)
    }

    /// Every constraint recorded for `name`, in file order.
    #[must_use]
    pub fn constraints_for(&self, name: &str) -> Vec<&VersionConstraint> {
        self.requirements
            .iter()
            .filter(|r| r.name == name)
            .map(|r| &r.version)
            .collect()
    }

    /// Add or replace the requirement for `name`.
    ///
    /// The first existing entry is replaced in place and any further
    /// duplicates are dropped, so after `add` the name appears exactly once.
    pub fn add(&mut self, name: &str, version: VersionConstraint) -> Result<AddOutcome> {
        validate_skill_name(name)?;

        let Some(first) = self.requirements.iter().position(|r| r.name == name) else {
            self.requirements.push(Requirement {
                name: name.to_string(),
                version,
            });
            return Ok(AddOutcome::Added);
        };

        let duplicates = self.requirements.iter().filter(|r| r.name == name).count();
        let previous = std::mem::replace(&mut self.requirements[first].version, version.clone());
        let mut index = 0;
        self.requirements.retain(|r| {
            let keep = r.name != name || index == first;
            index += 1;
            keep
        });

        if previous == version && duplicates == 1 {
            Ok(AddOutcome::Unchanged)
        } else {
            Ok(AddOutcome::Replaced(previous))
        }
    }

    /// Remove every requirement named `name`, returning what was removed.
    pub fn remove(&mut self, name: &str) -> Result<Vec<Requirement>> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.requirements)
            .into_iter()
            .partition(|r| r.name == name);
        self.requirements = kept;
        if removed.is_empty() {
            return Err(SkillError::NotInManifest(name.to_string()));
        }
        Ok(removed)
    }

    /// Digest of the canonical requirement list.
    ///
    /// Independent of entry order, so reordering `skill.toml` does not make
    /// the lockfile stale.
    #[must_use]
    pub fn requirements_digest(&self) -> ContentDigest {
        let mut lines: Vec<String> = self
            .requirements
            .iter()
            .map(|r| format!("{}\0{}\n", r.name, r.version))
            .collect();
        lines.sort();
        lines.dedup();
        ContentDigest::of_bytes(lines.concat().as_bytes())
    }
}
