//! Registry clients.
//!
//! A registry serves one JSON index document per skill name listing its
//! published versions, download URLs and digests. Everything read from a
//! registry is untrusted: digests are validated on parse and artifacts are
//! verified again after download.

pub mod http;
pub mod local;
pub mod memory;
pub mod sources;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::core::{ContentDigest, VersionConstraint};
use crate::error::{Result, SkillError};

pub use http::HttpRegistry;
pub use local::LocalRegistry;
pub use memory::MemoryRegistry;
pub use sources::SourceList;

/// How an artifact turns into files in the vendor directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// A single markdown document, installed as `SKILL.md`.
    #[default]
    Markdown,
    /// A packed directory tree.
    Bundle,
}

impl ArtifactKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Bundle => "bundle",
        }
    }
}

/// One published version in an index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexVersion {
    pub version: Version,
    pub digest: ContentDigest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub kind: ArtifactKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub yanked: bool,
}

/// The index document a registry serves for one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    /// Fallback download location; `{name}` and `{version}` are substituted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_template: Option<String>,
    #[serde(default)]
    pub versions: Vec<IndexVersion>,
    /// The registry that answered. Filled in by the client.
    #[serde(skip)]
    pub source: String,
}

impl IndexEntry {
    /// Parse an index document and make every version URL absolute.
    ///
    /// `join` turns a relative URL into an absolute one for the answering
    /// registry.
    pub fn from_json(
        requested: &str,
        bytes: &[u8],
        source: &str,
        join: impl Fn(&str) -> String,
    ) -> Result<Self> {
        let mut entry: Self =
            serde_json::from_slice(bytes).map_err(|err| SkillError::InvalidIndex {
                name: requested.to_string(),
                reason: err.to_string(),
            })?;

        if entry.name != requested {
            return Err(SkillError::InvalidIndex {
                name: requested.to_string(),
                reason: format!("index describes '{}'", entry.name),
            });
        }

        let template = entry.url_template.clone();
        for version in &mut entry.versions {
            let raw = match (&version.url, &template) {
                (Some(url), _) => url.clone(),
                (None, Some(template)) => template
                    .replace("{name}", requested)
                    .replace("{version}", &version.version.to_string()),
                (None, None) => {
                    return Err(SkillError::InvalidIndex {
                        name: requested.to_string(),
                        reason: format!("version {} has no download url", version.version),
                    });
                }
            };
            version.url = Some(if is_absolute_url(&raw) { raw } else { join(&raw) });
        }

        entry.versions.sort_by(|a, b| a.version.cmp(&b.version));
        entry.source = source.to_string();
        Ok(entry)
    }

    /// Published, non-yanked versions in ascending order.
    #[must_use]
    pub fn available(&self) -> Vec<&Version> {
        self.versions
            .iter()
            .filter(|v| !v.yanked)
            .map(|v| &v.version)
            .collect()
    }

    /// Highest version accepted by every constraint.
    ///
    /// Yanked versions are only eligible when an exact pin names them.
    #[must_use]
    pub fn best_match(&self, constraints: &[&VersionConstraint]) -> Option<&IndexVersion> {
        let pinned = constraints.iter().any(|c| c.is_exact());
        self.versions
            .iter()
            .filter(|v| !v.yanked || pinned)
            .filter(|v| constraints.iter().all(|c| c.matches(&v.version)))
            .max_by(|a, b| a.version.cmp(&b.version))
    }

    fn to_artifact(&self, version: &IndexVersion) -> ResolvedArtifact {
        ResolvedArtifact {
            name: self.name.clone(),
            version: version.version.clone(),
            url: version.url.clone().unwrap_or_default(),
            digest: version.digest.clone(),
            kind: version.kind,
            source: self.source.clone(),
        }
    }
}

/// A concrete artifact chosen for one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    pub name: String,
    pub version: Version,
    pub url: String,
    pub digest: ContentDigest,
    #[serde(default)]
    pub kind: ArtifactKind,
    pub source: String,
}

/// Pick the artifact satisfying all `constraints` for one skill.
///
/// With several constraints and no common version, the failure is a
/// [`SkillError::Conflict`] naming all of them, unless one constraint cannot
/// be met on its own.
pub fn select(entry: &IndexEntry, constraints: &[VersionConstraint]) -> Result<ResolvedArtifact> {
    let mut distinct: Vec<&VersionConstraint> = Vec::new();
    for constraint in constraints {
        if !distinct.contains(&constraint) {
            distinct.push(constraint);
        }
    }
    if distinct.is_empty() {
        distinct.push(&LATEST);
    }

    if let Some(version) = entry.best_match(&distinct) {
        return Ok(entry.to_artifact(version));
    }

    let available = entry.available().iter().map(ToString::to_string).collect();
    if let Some(unsatisfiable) = distinct
        .iter()
        .find(|c| entry.best_match(&[**c]).is_none())
    {
        return Err(SkillError::NoMatchingVersion {
            name: entry.name.clone(),
            constraint: unsatisfiable.to_string(),
            available,
        });
    }

    Err(SkillError::Conflict {
        name: entry.name.clone(),
        constraints: distinct.iter().map(ToString::to_string).collect(),
    })
}

static LATEST: std::sync::LazyLock<VersionConstraint> =
    std::sync::LazyLock::new(VersionConstraint::latest);

/// Read-only access to a skill registry.
pub trait RegistryClient: Send + Sync {
    /// Identifier recorded in the lockfile for artifacts from this registry.
    fn source(&self) -> &str;

    /// Fetch the index entry for `name`.
    ///
    /// Fails with `NotFound` when the registry does not know the name and
    /// `RegistryUnavailable` when it cannot be asked.
    fn fetch_index(&self, name: &str) -> Result<IndexEntry>;

    /// Published versions in ascending semver order, yanked ones excluded.
    fn list_versions(&self, name: &str) -> Result<Vec<Version>> {
        let entry = self.fetch_index(name)?;
        Ok(entry.available().into_iter().cloned().collect())
    }

    /// Highest version of `name` satisfying `constraint`.
    fn resolve_constraint(
        &self,
        name: &str,
        constraint: &VersionConstraint,
    ) -> Result<ResolvedArtifact> {
        let entry = self.fetch_index(name)?;
        select(&entry, std::slice::from_ref(constraint))
    }
}

pub(crate) fn is_absolute_url(url: &str) -> bool {
    url.contains("://")
}
