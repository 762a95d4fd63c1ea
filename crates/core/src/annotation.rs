//! Annotation judgment constants and validation.
//!
//! A judgment is what an annotator says about one error occurrence: a set of
//! taxonomy tags and a severity from 0 (none) to 5 (critical).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Lowest severity: the error has no safety impact.
pub const MIN_SEVERITY: i32 = 0;

/// Highest severity: critical impact.
pub const MAX_SEVERITY: i32 = 5;

/// Human-readable labels indexed by severity.
pub const SEVERITY_LABELS: [&str; 6] = ["None", "Minor", "Low", "Medium", "High", "Critical"];

/// Maximum number of taxonomy tags on one annotation.
pub const MAX_TAGS_PER_ANNOTATION: usize = 32;

/// Maximum length of a single taxonomy tag in characters.
pub const MAX_TAG_LENGTH: usize = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of an upsert keyed on `(annotator_id, error_identity)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAction {
    Created,
    Updated,
}

impl UpsertAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// What the annotator was looking at when submitting, kept for audit even if
/// the source unit changes later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub unit_index: Option<i64>,
    pub reference_text: Option<String>,
    pub raw_transcript: Option<String>,
    pub marked_text: Option<String>,
}

/// Rules applied to a judgment before it reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Reject empty tag sets when severity is above zero.
    pub require_tags_for_severity: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            require_tags_for_severity: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate that a severity is within [`MIN_SEVERITY`]..=[`MAX_SEVERITY`]
/// and narrow it to its stored width.
pub fn validate_severity(severity: i64) -> Result<i32, CoreError> {
    i32::try_from(severity)
        .ok()
        .filter(|s| (MIN_SEVERITY..=MAX_SEVERITY).contains(s))
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "severity must be between {MIN_SEVERITY} and {MAX_SEVERITY}, got {severity}"
            ))
        })
}

/// Trim tags, drop blanks, and return them sorted and deduplicated.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Validate a judgment whose tags have already been normalized. Returns the
/// validated severity.
pub fn validate_judgment(
    policy: &ValidationPolicy,
    severity: i64,
    tags: &[String],
) -> Result<i32, CoreError> {
    let severity = validate_severity(severity)?;

    if policy.require_tags_for_severity && severity > MIN_SEVERITY && tags.is_empty() {
        return Err(CoreError::Validation(format!(
            "taxonomy_tags must not be empty when severity is {severity}"
        )));
    }

    if tags.len() > MAX_TAGS_PER_ANNOTATION {
        return Err(CoreError::Validation(format!(
            "taxonomy_tags has {} entries, maximum is {MAX_TAGS_PER_ANNOTATION}",
            tags.len()
        )));
    }

    if let Some(tag) = tags.iter().find(|t| t.chars().count() > MAX_TAG_LENGTH) {
        return Err(CoreError::Validation(format!(
            "taxonomy tag '{tag}' exceeds {MAX_TAG_LENGTH} characters"
        )));
    }

    Ok(severity)
}

/// Label for a severity value, `None` if out of range.
pub fn severity_label(severity: i32) -> Option<&'static str> {
    usize::try_from(severity)
        .ok()
        .and_then(|i| SEVERITY_LABELS.get(i).copied())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn severity_bounds_accepted() {
        assert!(validate_severity(0).is_ok());
        assert!(validate_severity(5).is_ok());
    }

    #[test]
    fn severity_out_of_range_rejected() {
        assert!(validate_severity(-1).is_err());
        let err = validate_severity(6).unwrap_err();
        assert!(err.to_string().contains("between 0 and 5"));
    }

    #[test]
    fn severity_beyond_i32_rejected_not_truncated() {
        let err = validate_severity(3_000_000_000).unwrap_err();
        assert!(err.to_string().contains("got 3000000000"));
        assert_eq!(validate_severity(4).unwrap(), 4);
    }

    #[test]
    fn normalize_sorts_and_dedups() {
        let out = normalize_tags(&tags(&[" medical ", "", "dosage", "medical", "  "]));
        assert_eq!(out, tags(&["dosage", "medical"]));
    }

    #[test]
    fn zero_severity_allows_empty_tags() {
        let policy = ValidationPolicy::default();
        assert!(validate_judgment(&policy, 0, &[]).is_ok());
    }

    #[test]
    fn positive_severity_requires_tags_by_default() {
        let policy = ValidationPolicy::default();
        let err = validate_judgment(&policy, 3, &[]).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
        assert!(validate_judgment(&policy, 3, &tags(&["medical"])).is_ok());
    }

    #[test]
    fn relaxed_policy_accepts_empty_tags() {
        let policy = ValidationPolicy {
            require_tags_for_severity: false,
        };
        assert!(validate_judgment(&policy, 4, &[]).is_ok());
    }

    #[test]
    fn too_many_tags_rejected() {
        let many: Vec<String> = (0..=MAX_TAGS_PER_ANNOTATION).map(|i| format!("t{i}")).collect();
        assert!(validate_judgment(&ValidationPolicy::default(), 1, &many).is_err());
    }

    #[test]
    fn overlong_tag_rejected() {
        let long = vec!["x".repeat(MAX_TAG_LENGTH + 1)];
        assert!(validate_judgment(&ValidationPolicy::default(), 1, &long).is_err());
    }

    #[test]
    fn labels() {
        assert_eq!(severity_label(0), Some("None"));
        assert_eq!(severity_label(5), Some("Critical"));
        assert_eq!(severity_label(6), None);
        assert_eq!(severity_label(-1), None);
    }

    #[test]
    fn upsert_action_serializes_lowercase() {
        assert_eq!(serde_json::to_value(UpsertAction::Created).unwrap(), "created");
        assert_eq!(UpsertAction::Updated.as_str(), "updated");
    }
}
