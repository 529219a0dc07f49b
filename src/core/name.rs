//! Skill name rules.
//!
//! Names become directory names under the vendor directory, so they are
//! restricted to a portable lowercase alphabet.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, SkillError};

pub const MAX_NAME_LEN: usize = 128;

static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9._-]*$").expect("static skill name pattern"));

/// Reject names that are empty, too long, or unsafe as a path component.
pub fn validate_skill_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SkillError::ValidationFailed(
            "skill name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(SkillError::ValidationFailed(format!(
            "skill name is longer than {MAX_NAME_LEN} characters: {name}"
        )));
    }
    if !NAME_REGEX.is_match(name) || name.contains("..") {
        return Err(SkillError::ValidationFailed(format!(
            "invalid skill name '{name}': use lowercase letters, digits, '.', '_' or '-', starting with a letter or digit"
        )));
    }
    Ok(())
}
