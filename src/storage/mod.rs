//! Project documents and the file primitives they are written with.
//!
//! `skill.toml` is authored by people; `skill.lock` is generated. Both are
//! replaced atomically and both carry a schema tag that is checked on load.

pub mod lockfile;
pub mod manifest;
pub mod tx;

pub use lockfile::{LockStatus, Lockfile, LOCKFILE_FILE};
pub use manifest::{AddOutcome, Manifest, Requirement, MANIFEST_FILE};
pub use tx::{atomic_write, LockHolder, ProjectLock};

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SkillError};

pub(crate) const SCHEMA_VERSION: u32 = 1;

#[derive(Deserialize)]
struct SchemaProbe {
    version: Option<toml::Value>,
}

/// Reject documents whose schema tag is missing or not ours, before the
/// full parse produces a less helpful error.
pub(crate) fn check_schema(path: &Path, content: &str) -> Result<()> {
    let probe: SchemaProbe = toml::from_str(content).map_err(|err| corrupt(path, &err))?;
    match probe.version {
        Some(toml::Value::Integer(v)) if v == i64::from(SCHEMA_VERSION) => Ok(()),
        Some(other) => Err(SkillError::CorruptDocument {
            path: path.to_path_buf(),
            reason: format!("unsupported schema version {other} (expected {SCHEMA_VERSION})"),
        }),
        None => Err(SkillError::CorruptDocument {
            path: path.to_path_buf(),
            reason: "missing schema version".to_string(),
        }),
    }
}

pub(crate) fn corrupt(path: &Path, err: &impl std::fmt::Display) -> SkillError {
    SkillError::CorruptDocument {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
