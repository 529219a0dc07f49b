//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Resolution errors
//! - 2xx: Registry errors
//! - 3xx: Config errors
//! - 4xx: Document errors (manifest, lockfile)
//! - 5xx: Integrity errors
//! - 6xx: Network errors
//! - 7xx: Storage errors
//! - 8xx: Validation errors (85x: locking)
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for `--machine` output.
///
/// Each variant maps to a numeric code (e.g., `SkillNotFound` -> E101).
/// Codes are grouped by category for easy identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Resolution errors (1xx)
    // ========================================
    /// E101: No configured registry knows the skill
    SkillNotFound,
    /// E102: The skill exists but no version satisfies the constraint
    NoMatchingVersion,
    /// E103: The manifest requests one skill with incompatible constraints
    ConstraintConflict,
    /// E104: The skill is not declared in the manifest
    NotInManifest,

    // ========================================
    // Registry errors (2xx)
    // ========================================
    /// E201: Registry could not be reached or answered with a server error
    RegistryUnavailable,
    /// E202: Registry answered with an index entry that cannot be used
    RegistryIndexInvalid,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E301: Config file has invalid syntax or values
    ConfigInvalid,
    /// E302: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Document errors (4xx)
    // ========================================
    /// E401: Manifest or lockfile is unparsable or has the wrong schema
    DocumentCorrupt,
    /// E402: Lockfile does not match the manifest
    LockfileOutdated,

    // ========================================
    // Integrity errors (5xx)
    // ========================================
    /// E501: Artifact bytes do not match the locked digest
    IntegrityMismatch,

    // ========================================
    // Network errors (6xx)
    // ========================================
    /// E601: Artifact download failed after all attempts
    FetchFailed,

    // ========================================
    // Storage errors (7xx)
    // ========================================
    /// E701: IO operation failed
    IoError,
    /// E702: Serialization/deserialization failed
    SerializationError,

    // ========================================
    // Validation errors (8xx)
    // ========================================
    /// E801: Input failed validation
    ValidationFailed,

    // ========================================
    // Lock errors (85x)
    // ========================================
    /// E851: Another run holds the project lock
    LockHeld,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E901: Operation was cancelled by the user
    Cancelled,
    /// E902: Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `SkillNotFound` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::SkillNotFound => 101,
            Self::NoMatchingVersion => 102,
            Self::ConstraintConflict => 103,
            Self::NotInManifest => 104,

            Self::RegistryUnavailable => 201,
            Self::RegistryIndexInvalid => 202,

            Self::ConfigInvalid => 301,
            Self::ConfigMissingRequired => 302,

            Self::DocumentCorrupt => 401,
            Self::LockfileOutdated => 402,

            Self::IntegrityMismatch => 501,

            Self::FetchFailed => 601,

            Self::IoError => 701,
            Self::SerializationError => 702,

            Self::ValidationFailed => 801,

            Self::LockHeld => 851,

            Self::Cancelled => 901,
            Self::InternalError => 902,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::SkillNotFound => "Check the skill name for typos, or add the registry that publishes it to `registry.sources`",
            Self::NoMatchingVersion => "Run `skill versions <name>` to see published versions and relax the constraint",
            Self::ConstraintConflict => "Keep a single entry per skill in skill.toml, or make the constraints overlap",
            Self::NotInManifest => "Run `skill status` to see the declared skills",

            Self::RegistryUnavailable => "Check your network connection and the registry URL, then retry",
            Self::RegistryIndexInvalid => "The registry published a malformed index entry. Report it to the registry maintainers",

            Self::ConfigInvalid => "Check TOML syntax and values in the config file",
            Self::ConfigMissingRequired => "Set the missing value in .skill/config.toml or through the matching SKILL_* environment variable",

            Self::DocumentCorrupt => "Fix the file by hand or restore it from version control. skill.lock can be regenerated with `skill lock`",
            Self::LockfileOutdated => "Run `skill lock` to refresh skill.lock, or drop --frozen",

            Self::IntegrityMismatch => "The artifact does not match its locked digest. Do not bypass this; re-run `skill lock` if the registry republished it",

            Self::FetchFailed => "The download failed after several attempts. Check connectivity and retry",

            Self::IoError => "File operation failed. Check the path exists and permissions are correct",
            Self::SerializationError => "The data format may be corrupted. Check input data for validity",

            Self::ValidationFailed => "Review the reported value and correct it",

            Self::LockHeld => "Another skill process is working on this project. Wait for it to finish and retry",

            Self::Cancelled => "The operation was interrupted. Re-run it to finish; completed skills are kept",
            Self::InternalError => "An unexpected error occurred. Please report this issue with full error output",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            // User can take action to fix these
            Self::SkillNotFound
            | Self::NoMatchingVersion
            | Self::ConstraintConflict
            | Self::NotInManifest
            | Self::RegistryUnavailable
            | Self::ConfigInvalid
            | Self::ConfigMissingRequired
            | Self::DocumentCorrupt
            | Self::LockfileOutdated
            | Self::FetchFailed
            | Self::IoError
            | Self::ValidationFailed
            | Self::LockHeld
            | Self::Cancelled => true,

            Self::RegistryIndexInvalid
            | Self::IntegrityMismatch
            | Self::SerializationError
            | Self::InternalError => false,
        }
    }

    /// Check if retrying the same operation later may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RegistryUnavailable | Self::FetchFailed | Self::LockHeld
        )
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() {
            100..=199 => "resolve",
            200..=299 => "registry",
            300..=399 => "config",
            400..=499 => "document",
            500..=599 => "integrity",
            600..=699 => "network",
            700..=799 => "storage",
            850..=899 => "lock",
            800..=849 => "validation",
            900..=999 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::SkillNotFound,
            Self::NoMatchingVersion,
            Self::ConstraintConflict,
            Self::NotInManifest,
            Self::RegistryUnavailable,
            Self::RegistryIndexInvalid,
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::DocumentCorrupt,
            Self::LockfileOutdated,
            Self::IntegrityMismatch,
            Self::FetchFailed,
            Self::IoError,
            Self::SerializationError,
            Self::ValidationFailed,
            Self::LockHeld,
            Self::Cancelled,
            Self::InternalError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
