//! Annotator progress reports.
//!
//! Progress is a per-annotator, per-collection cursor plus the set of units
//! the annotator marked complete. Clients report it explicitly; annotation
//! submissions never move it.

use serde::Deserialize;

use crate::error::CoreError;

/// Partial progress update. Unset fields leave the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProgressReport {
    pub current_index: Option<i64>,
    pub completed_unit_ids: Option<Vec<String>>,
}

impl ProgressReport {
    /// Reject negative cursors. Moving backward is allowed.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(index) = self.current_index {
            if index < 0 {
                return Err(CoreError::Validation(format!(
                    "current_index must be >= 0, got {index}"
                )));
            }
        }
        Ok(())
    }

    /// Validate and clean up the completed list.
    pub fn normalized(&self) -> Result<Self, CoreError> {
        self.validate()?;
        Ok(Self {
            current_index: self.current_index,
            completed_unit_ids: self
                .completed_unit_ids
                .as_deref()
                .map(normalize_completed),
        })
    }
}

/// Drop blank ids and duplicates, keeping first-seen order.
pub fn normalize_completed(ids: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !out.iter().any(|existing| existing == id) {
            out.push(id.to_string());
        }
    }
    out
}

/// Share of error occurrences the annotator has judged, in percent with one
/// decimal. Zero when there are no occurrences.
pub fn progress_percent(annotations: i64, error_occurrences: i64) -> f64 {
    if error_occurrences <= 0 {
        return 0.0;
    }
    let pct = annotations as f64 / error_occurrences as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_index_rejected() {
        let report = ProgressReport {
            current_index: Some(-1),
            completed_unit_ids: None,
        };
        assert!(report.validate().is_err());
    }

    #[test]
    fn empty_report_is_valid() {
        assert!(ProgressReport::default().validate().is_ok());
    }

    #[test]
    fn normalized_dedups_completed() {
        let report = ProgressReport {
            current_index: Some(3),
            completed_unit_ids: Some(vec!["b".into(), "a".into(), "b".into(), " ".into()]),
        };
        let out = report.normalized().unwrap();
        assert_eq!(out.current_index, Some(3));
        assert_eq!(out.completed_unit_ids, Some(vec!["b".to_string(), "a".to_string()]));
    }

    #[test]
    fn partial_report_deserializes() {
        let report: ProgressReport =
            serde_json::from_str(r#"{"completed_unit_ids": ["u1"]}"#).unwrap();
        assert_eq!(report.current_index, None);
        assert_eq!(report.completed_unit_ids, Some(vec!["u1".to_string()]));
    }

    #[test]
    fn percent_with_zero_denominator() {
        assert_eq!(progress_percent(5, 0), 0.0);
    }

    #[test]
    fn percent_rounds_to_one_decimal() {
        assert_eq!(progress_percent(1, 3), 33.3);
        assert_eq!(progress_percent(2, 3), 66.7);
        assert_eq!(progress_percent(4, 4), 100.0);
    }
}
