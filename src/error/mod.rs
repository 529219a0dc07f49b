//! Error handling for skill.
//!
//! This module provides:
//! - [`SkillError`]: The main error enum for all skill operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type with suggestions and context
//! - Suggestion helpers for context-aware error recovery hints

mod codes;
mod suggestions;

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;
pub use suggestions::{suggest_for_error, suggest_similar_skills};

/// Main error type for skill operations.
#[derive(Error, Debug)]
pub enum SkillError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Skill not found in any registry: {name}")]
    NotFound { name: String },

    #[error("No version of '{name}' satisfies '{constraint}'")]
    NoMatchingVersion {
        name: String,
        constraint: String,
        available: Vec<String>,
    },

    #[error("Conflicting constraints for '{name}': {}", .constraints.join(" vs "))]
    Conflict {
        name: String,
        constraints: Vec<String>,
    },

    #[error("Registry unavailable ({source_url}): {reason}")]
    RegistryUnavailable { source_url: String, reason: String },

    #[error("Invalid registry index for '{name}': {reason}")]
    InvalidIndex { name: String, reason: String },

    #[error("Failed to fetch '{name}' from {url}: {reason}")]
    Fetch {
        name: String,
        url: String,
        reason: String,
    },

    #[error("Integrity check failed for '{name}': expected {expected}, got {actual}")]
    Integrity {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Corrupt document {}: {reason}", .path.display())]
    CorruptDocument { path: PathBuf, reason: String },

    #[error("Project is locked by another run: {holder}")]
    LockHeld { path: PathBuf, holder: String },

    #[error("Lockfile is out of date: {0}")]
    LockfileOutdated(String),

    #[error("Skill '{0}' is not in the manifest")]
    NotInManifest(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

impl SkillError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::NotFound { .. } => ErrorCode::SkillNotFound,
            Self::NoMatchingVersion { .. } => ErrorCode::NoMatchingVersion,
            Self::Conflict { .. } => ErrorCode::ConstraintConflict,
            Self::NotInManifest(_) => ErrorCode::NotInManifest,
            Self::RegistryUnavailable { .. } => ErrorCode::RegistryUnavailable,
            Self::InvalidIndex { .. } => ErrorCode::RegistryIndexInvalid,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::CorruptDocument { .. } => ErrorCode::DocumentCorrupt,
            Self::LockfileOutdated(_) => ErrorCode::LockfileOutdated,
            Self::Fetch { .. } => ErrorCode::FetchFailed,
            Self::Integrity { .. } => ErrorCode::IntegrityMismatch,
            Self::ValidationFailed(_) => ErrorCode::ValidationFailed,
            Self::LockHeld { .. } => ErrorCode::LockHeld,
            Self::Cancelled => ErrorCode::Cancelled,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::NotFound { name } | Self::NotInManifest(name) => {
                Some(serde_json::json!({ "skill": name }))
            }
            Self::NoMatchingVersion {
                name,
                constraint,
                available,
            } => Some(serde_json::json!({
                "skill": name,
                "constraint": constraint,
                "available": available,
            })),
            Self::Conflict { name, constraints } => {
                Some(serde_json::json!({ "skill": name, "constraints": constraints }))
            }
            Self::RegistryUnavailable { source_url, reason } => {
                Some(serde_json::json!({ "source": source_url, "reason": reason }))
            }
            Self::InvalidIndex { name, reason } => {
                Some(serde_json::json!({ "skill": name, "reason": reason }))
            }
            Self::Fetch { name, url, reason } => {
                Some(serde_json::json!({ "skill": name, "url": url, "reason": reason }))
            }
            Self::Integrity {
                name,
                expected,
                actual,
            } => Some(serde_json::json!({
                "skill": name,
                "expected": expected,
                "actual": actual,
            })),
            Self::CorruptDocument { path, reason } => Some(serde_json::json!({
                "path": path.display().to_string(),
                "reason": reason,
            })),
            Self::LockHeld { path, holder } => Some(serde_json::json!({
                "path": path.display().to_string(),
                "holder": holder,
            })),
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            _ => None,
        }
    }

    /// Whether a caller may retry the failed operation unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_skill_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
///
/// This type is what `--machine` output prints so scripts and agents can
/// branch on the failure instead of scraping text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "SKILL_NOT_FOUND")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// Whether retrying the same operation may succeed
    pub retryable: bool,

    /// Error category (e.g., "resolve", "config", "network")
    pub category: String,
}

impl StructuredError {
    /// Create a new structured error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            retryable: code.is_retryable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    /// Create a structured error from a [`SkillError`].
    #[must_use]
    pub fn from_skill_error(err: &SkillError) -> Self {
        let code = err.code();
        let context = err.context();
        let suggestion = suggest_for_error(code, context.as_ref());

        Self {
            code,
            numeric_code: code.numeric(),
            message: err.to_string(),
            suggestion,
            context,
            recoverable: code.is_recoverable(),
            retryable: code.is_retryable(),
            category: code.category().to_string(),
        }
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<SkillError> for StructuredError {
    fn from(err: SkillError) -> Self {
        Self::from_skill_error(&err)
    }
}

impl From<&SkillError> for StructuredError {
    fn from(err: &SkillError) -> Self {
        Self::from_skill_error(err)
    }
}

/// Result type alias using SkillError.
pub type Result<T> = std::result::Result<T, SkillError>;
