//! Source unit entity model and import DTOs.

use errata_core::identity::{IdentifiedSpan, IdentityAssigner};
use errata_core::import::ImportRecord;
use errata_core::types::{Metadata, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `source_units` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SourceUnit {
    pub collection_name: String,
    pub unit_id: String,
    /// 0-based import order within the collection.
    pub position: i64,
    pub reference_text: String,
    pub raw_transcript: String,
    pub marked_text: String,
    pub metadata: Json<Metadata>,
    pub spans: Json<Vec<IdentifiedSpan>>,
    pub error_count: i64,
    pub created_at: Timestamp,
}

/// DTO for importing a unit. Spans are identified before the store sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSourceUnit {
    pub collection_name: String,
    pub unit_id: String,
    pub reference_text: String,
    pub raw_transcript: String,
    pub marked_text: String,
    pub metadata: Metadata,
    pub spans: Vec<IdentifiedSpan>,
}

impl NewSourceUnit {
    /// Extract and identify the spans of an import record.
    pub fn from_record(
        assigner: &IdentityAssigner,
        collection_name: &str,
        record: ImportRecord,
    ) -> Self {
        let spans = assigner.identify_spans(collection_name, &record.unit_id, &record.marked_text);
        Self {
            collection_name: collection_name.to_string(),
            unit_id: record.unit_id,
            reference_text: record.reference_text,
            raw_transcript: record.raw_transcript,
            marked_text: record.marked_text,
            metadata: record.metadata,
            spans,
        }
    }

    /// Materialize the stored row at `position`.
    pub fn into_unit(self, position: i64, created_at: Timestamp) -> SourceUnit {
        SourceUnit {
            error_count: self.spans.len() as i64,
            collection_name: self.collection_name,
            unit_id: self.unit_id,
            position,
            reference_text: self.reference_text,
            raw_transcript: self.raw_transcript,
            marked_text: self.marked_text,
            metadata: Json(self.metadata),
            spans: Json(self.spans),
            created_at,
        }
    }
}

/// Result of importing one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub collection_name: String,
    /// Units inserted by this call.
    pub loaded: usize,
    /// Records ignored because the unit already existed or lacked an id.
    pub skipped: usize,
    /// Units in the collection after the call.
    pub total: i64,
}
