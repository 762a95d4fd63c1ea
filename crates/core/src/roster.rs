//! Annotator roster parsing.
//!
//! The roster is reference data maintained outside the system:
//!
//! ```json
//! { "annotators": [
//!     { "annotatorId": "A1", "name": "Ada", "email": "ada@example.org", "affiliation": "Lab" }
//! ] }
//! ```
//!
//! Annotator ids are compared uppercase and emails lowercase, so the roster
//! and incoming requests are normalized the same way.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::CoreError;

/// Maximum length of an annotator id.
pub const MAX_ANNOTATOR_ID_LENGTH: usize = 50;

/// One roster entry after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosterEntry {
    #[serde(rename = "annotatorId")]
    pub annotator_id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub affiliation: Option<String>,
}

#[derive(Deserialize)]
struct RosterFile {
    #[serde(default)]
    annotators: Vec<RosterEntry>,
}

/// Canonical form of an annotator id.
pub fn normalize_annotator_id(id: &str) -> String {
    id.trim().to_uppercase()
}

/// Canonical form of an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an annotator id as received from a client.
pub fn validate_annotator_id(id: &str) -> Result<(), CoreError> {
    if id.is_empty() {
        return Err(CoreError::Validation("annotator id must not be empty".to_string()));
    }
    if id.len() > MAX_ANNOTATOR_ID_LENGTH {
        return Err(CoreError::Validation(format!(
            "annotator id exceeds {MAX_ANNOTATOR_ID_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Parse and validate a roster document.
///
/// Ids and emails must be unique after normalization.
pub fn parse_roster(json: &str) -> Result<Vec<RosterEntry>, CoreError> {
    let file: RosterFile = serde_json::from_str(json)
        .map_err(|e| CoreError::Validation(format!("Invalid roster JSON: {e}")))?;

    let mut ids = HashSet::new();
    let mut emails = HashSet::new();
    let mut out = Vec::with_capacity(file.annotators.len());

    for entry in file.annotators {
        let annotator_id = normalize_annotator_id(&entry.annotator_id);
        let email = normalize_email(&entry.email);
        validate_annotator_id(&annotator_id)?;
        if !email.contains('@') {
            return Err(CoreError::Validation(format!(
                "Annotator '{annotator_id}' has an invalid email '{email}'"
            )));
        }
        if !ids.insert(annotator_id.clone()) {
            return Err(CoreError::Conflict(format!(
                "Duplicate annotator id '{annotator_id}' in roster"
            )));
        }
        if !emails.insert(email.clone()) {
            return Err(CoreError::Conflict(format!(
                "Duplicate annotator email '{email}' in roster"
            )));
        }

        out.push(RosterEntry {
            annotator_id,
            display_name: entry.display_name.trim().to_string(),
            email,
            affiliation: entry
                .affiliation
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
        });
    }

    Ok(out)
}

/// Load a roster file. A missing file is an empty roster.
pub fn load_roster_file(path: &Path) -> Result<Vec<RosterEntry>, CoreError> {
    match std::fs::read_to_string(path) {
        Ok(json) => parse_roster(&json),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(CoreError::Internal(format!(
            "Failed to read roster {}: {e}",
            path.display()
        ))),
    }
}
