//! Context-aware error suggestions.
//!
//! Complements the static suggestions in the `codes` module with hints that
//! name the skill, constraint, or file involved.

use serde_json::Value;

use super::codes::ErrorCode;

/// Generate a context-aware suggestion for an error.
///
/// Falls back to [`ErrorCode::suggestion`] when the context carries nothing
/// more specific.
pub fn suggest_for_error(code: ErrorCode, context: Option<&Value>) -> String {
    match code {
        ErrorCode::SkillNotFound => suggest_skill_not_found(context),
        ErrorCode::NoMatchingVersion => suggest_no_matching_version(context),
        ErrorCode::ConstraintConflict => suggest_constraint_conflict(context),
        ErrorCode::DocumentCorrupt => suggest_document_corrupt(context),
        ErrorCode::ConfigMissingRequired => suggest_config_missing_required(context),
        ErrorCode::IntegrityMismatch => suggest_integrity_mismatch(context),
        _ => code.suggestion().to_string(),
    }
}

fn str_field<'a>(context: Option<&'a Value>, key: &str) -> Option<&'a str> {
    context.and_then(|c| c.get(key)).and_then(Value::as_str)
}

fn suggest_skill_not_found(context: Option<&Value>) -> String {
    match str_field(context, "skill") {
        Some(name) => format!(
            "Skill '{name}' was not found. Try:\n  - checking the name for typos\n  - `skill versions {name}` against each configured registry\n  - adding the publishing registry to `registry.sources`"
        ),
        None => ErrorCode::SkillNotFound.suggestion().to_string(),
    }
}

fn suggest_no_matching_version(context: Option<&Value>) -> String {
    let name = str_field(context, "skill");
    let available = context
        .and_then(|c| c.get("available"))
        .and_then(Value::as_array);

    match (name, available) {
        (Some(name), Some(versions)) if !versions.is_empty() => {
            let recent: Vec<_> = versions
                .iter()
                .rev()
                .filter_map(Value::as_str)
                .take(5)
                .collect();
            format!(
                "Published versions of '{name}' include: {}\nAdjust the constraint with `skill add {name} <constraint>`",
                recent.join(", ")
            )
        }
        (Some(name), _) => format!(
            "'{name}' has no usable published versions. Run `skill versions {name}` to check"
        ),
        _ => ErrorCode::NoMatchingVersion.suggestion().to_string(),
    }
}

fn suggest_constraint_conflict(context: Option<&Value>) -> String {
    let name = str_field(context, "skill");
    let constraints = context
        .and_then(|c| c.get("constraints"))
        .and_then(Value::as_array);

    match (name, constraints) {
        (Some(name), Some(list)) if !list.is_empty() => {
            let list: Vec<_> = list.iter().filter_map(Value::as_str).collect();
            format!(
                "skill.toml requests '{name}' as {}. Keep one entry, e.g. `skill add {name} <constraint>` replaces all of them",
                list.join(" and ")
            )
        }
        _ => ErrorCode::ConstraintConflict.suggestion().to_string(),
    }
}

fn suggest_document_corrupt(context: Option<&Value>) -> String {
    match str_field(context, "path") {
        Some(path) if path.ends_with(".lock") => format!(
            "{path} is unreadable. Delete it and run `skill lock` to regenerate it"
        ),
        Some(path) => format!("Fix {path} by hand or restore it from version control"),
        None => ErrorCode::DocumentCorrupt.suggestion().to_string(),
    }
}

fn suggest_config_missing_required(context: Option<&Value>) -> String {
    match str_field(context, "config_key") {
        Some("registry.sources") => "No registry is configured. Add one to .skill/config.toml:\n  [registry]\n  sources = [\"https://...\"]\nor set SKILL_REGISTRY".to_string(),
        Some(key) => format!("Required config '{key}' is missing. Set it in .skill/config.toml"),
        None => ErrorCode::ConfigMissingRequired.suggestion().to_string(),
    }
}

fn suggest_integrity_mismatch(context: Option<&Value>) -> String {
    match str_field(context, "skill") {
        Some(name) => format!(
            "The artifact for '{name}' does not match skill.lock. If the registry legitimately republished it, run `skill lock` and review the digest change before installing"
        ),
        None => ErrorCode::IntegrityMismatch.suggestion().to_string(),
    }
}

/// Suggest names similar to a misspelled skill name.
pub fn suggest_similar_skills(query: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let query_lower = query.to_lowercase();
    let mut scored: Vec<_> = available
        .iter()
        .map(|s| (s, similarity_score(&query_lower, &s.to_lowercase())))
        .filter(|(_, score)| *score > 0.3)
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(s, _)| (*s).to_string())
        .collect()
}

/// Jaccard similarity on character trigrams.
fn similarity_score(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a_trigrams: std::collections::HashSet<_> = trigrams(a).collect();
    let b_trigrams: std::collections::HashSet<_> = trigrams(b).collect();

    if a_trigrams.is_empty() || b_trigrams.is_empty() {
        // Short strings have no trigrams
        if a.starts_with(b) || b.starts_with(a) {
            return 0.8;
        }
        if a.contains(b) || b.contains(a) {
            return 0.5;
        }
        return 0.0;
    }

    let intersection = a_trigrams.intersection(&b_trigrams).count();
    let union = a_trigrams.union(&b_trigrams).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn trigrams(s: &str) -> impl Iterator<Item = &str> {
    (0..s.len().saturating_sub(2)).filter_map(move |i| s.get(i..i + 3))
}
