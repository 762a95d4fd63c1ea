//! Annotator progress model.

use errata_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `annotator_progress` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AnnotatorProgress {
    pub annotator_id: String,
    pub collection_name: String,
    pub current_index: i64,
    pub completed_unit_ids: Json<Vec<String>>,
    pub last_accessed: Timestamp,
    pub created_at: Timestamp,
}

impl AnnotatorProgress {
    /// Fresh progress at index 0 with nothing completed.
    pub fn start(annotator_id: &str, collection_name: &str, now: Timestamp) -> Self {
        Self {
            annotator_id: annotator_id.to_string(),
            collection_name: collection_name.to_string(),
            current_index: 0,
            completed_unit_ids: Json(Vec::new()),
            last_accessed: now,
            created_at: now,
        }
    }
}
