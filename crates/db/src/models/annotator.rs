//! Annotator entity model and DTOs.

use errata_core::roster::RosterEntry;
use errata_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `annotators` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Annotator {
    pub annotator_id: String,
    pub display_name: String,
    pub email: String,
    pub affiliation: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for registering an annotator from the roster.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateAnnotator {
    pub annotator_id: String,
    pub display_name: String,
    pub email: String,
    pub affiliation: Option<String>,
}

impl From<RosterEntry> for CreateAnnotator {
    fn from(entry: RosterEntry) -> Self {
        Self {
            annotator_id: entry.annotator_id,
            display_name: entry.display_name,
            email: entry.email,
            affiliation: entry.affiliation,
        }
    }
}
