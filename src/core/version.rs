//! Version constraints as written in `skill.toml`.
//!
//! Three forms are accepted: `latest`, an exact version (`1.2.0`, `=1.2.0`,
//! `v1.2.0`), or any semver requirement (`^1.0`, `~1.2.3`, `>=1, <2`, `*`).

use std::fmt;
use std::str::FromStr;

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Latest,
    Exact(Version),
    Range(VersionReq),
}

/// A parsed version constraint that remembers how the user spelled it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionConstraint {
    raw: String,
    kind: Kind,
}

impl VersionConstraint {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SkillError::ValidationFailed(
                "version constraint must not be empty".to_string(),
            ));
        }

        if trimmed.eq_ignore_ascii_case("latest") {
            return Ok(Self::latest());
        }

        let bare = trimmed
            .strip_prefix('=')
            .or_else(|| trimmed.strip_prefix('v'))
            .unwrap_or(trimmed)
            .trim();
        if let Ok(version) = Version::parse(bare) {
            return Ok(Self {
                raw: trimmed.to_string(),
                kind: Kind::Exact(version),
            });
        }

        let req = VersionReq::parse(trimmed).map_err(|err| {
            SkillError::ValidationFailed(format!("invalid version constraint '{trimmed}': {err}"))
        })?;
        Ok(Self {
            raw: trimmed.to_string(),
            kind: Kind::Range(req),
        })
    }

    #[must_use]
    pub fn latest() -> Self {
        Self {
            raw: "latest".to_string(),
            kind: Kind::Latest,
        }
    }

    #[must_use]
    pub fn is_latest(&self) -> bool {
        matches!(self.kind, Kind::Latest)
    }

    /// Exact pins may select yanked versions; ranges and `latest` may not.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        matches!(self.kind, Kind::Exact(_))
    }

    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        match &self.kind {
            Kind::Latest => true,
            Kind::Exact(pinned) => pinned == version,
            Kind::Range(req) => req.matches(version),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Default for VersionConstraint {
    fn default() -> Self {
        Self::latest()
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for VersionConstraint {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionConstraint {
    type Error = SkillError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<VersionConstraint> for String {
    fn from(value: VersionConstraint) -> Self {
        value.raw
    }
}
