//! Annotation entity model and DTOs.

use errata_core::aggregate::ErrorJudgment;
use errata_core::annotation::{ContextSnapshot, UpsertAction};
use errata_core::identity::ErrorIdentity;
use errata_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `annotations` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Annotation {
    pub annotator_id: String,
    pub collection_name: String,
    pub unit_id: String,
    pub error_identity: String,
    pub error_type: String,
    pub full_match: String,
    pub taxonomy_tags: Json<Vec<String>>,
    pub severity: i32,
    pub unit_index: Option<i64>,
    pub reference_text: Option<String>,
    pub raw_transcript: Option<String>,
    pub marked_text: Option<String>,
    /// 1 on create, incremented on every resubmission.
    pub revision: i64,
    pub submitted_at: Timestamp,
    pub created_at: Timestamp,
}

impl Annotation {
    /// Borrowed view for the aggregation functions.
    pub fn judgment(&self) -> ErrorJudgment<'_> {
        ErrorJudgment {
            unit_id: &self.unit_id,
            error_type: &self.error_type,
            full_match: &self.full_match,
            taxonomy_tags: &self.taxonomy_tags,
            severity: self.severity,
        }
    }

    /// Materialize a first revision from an insert DTO.
    pub fn create(new: NewAnnotation) -> Self {
        Self {
            annotator_id: new.annotator_id,
            collection_name: new.collection_name,
            unit_id: new.unit_id,
            error_identity: new.error_identity.into_inner(),
            error_type: new.error_type,
            full_match: new.full_match,
            taxonomy_tags: Json(new.taxonomy_tags),
            severity: new.severity,
            unit_index: new.context.unit_index,
            reference_text: new.context.reference_text,
            raw_transcript: new.context.raw_transcript,
            marked_text: new.context.marked_text,
            revision: 1,
            submitted_at: new.submitted_at,
            created_at: new.submitted_at,
        }
    }

    /// Apply a resubmission in place. Key fields stay untouched.
    pub fn revise(&mut self, new: NewAnnotation) {
        self.taxonomy_tags = Json(new.taxonomy_tags);
        self.severity = new.severity;
        self.unit_index = new.context.unit_index;
        self.reference_text = new.context.reference_text;
        self.raw_transcript = new.context.raw_transcript;
        self.marked_text = new.context.marked_text;
        self.submitted_at = new.submitted_at;
        self.revision += 1;
    }
}

/// DTO for upserting a validated judgment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnnotation {
    pub annotator_id: String,
    pub collection_name: String,
    pub unit_id: String,
    pub error_identity: ErrorIdentity,
    pub error_type: String,
    pub full_match: String,
    /// Already normalized.
    pub taxonomy_tags: Vec<String>,
    pub severity: i32,
    pub context: ContextSnapshot,
    pub submitted_at: Timestamp,
}

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub action: UpsertAction,
    pub annotation: Annotation,
}

impl UpsertOutcome {
    /// Classify a stored row by its revision counter.
    pub fn from_revision(annotation: Annotation) -> Self {
        let action = if annotation.revision > 1 {
            UpsertAction::Updated
        } else {
            UpsertAction::Created
        };
        Self { action, annotation }
    }
}

/// Request body of an annotation submission.
///
/// The occurrence is named either by `error_identity` or by the composite
/// `(error_type, full_match, occurrence_index)` of `unit_id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnotationSubmission {
    pub unit_id: String,
    pub error_identity: Option<String>,
    pub error_type: Option<String>,
    pub full_match: Option<String>,
    pub occurrence_index: Option<usize>,
    #[serde(default)]
    pub taxonomy_tags: Vec<String>,
    pub severity: i64,
    pub unit_index: Option<i64>,
    pub reference_text: Option<String>,
    pub raw_transcript: Option<String>,
    pub marked_text: Option<String>,
}

impl AnnotationSubmission {
    pub fn context(&self) -> ContextSnapshot {
        ContextSnapshot {
            unit_index: self.unit_index,
            reference_text: self.reference_text.clone(),
            raw_transcript: self.raw_transcript.clone(),
            marked_text: self.marked_text.clone(),
        }
    }
}

/// What a submission returns to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub action: UpsertAction,
    pub error_identity: String,
    pub revision: i64,
    pub total_for_annotator_and_collection: i64,
}
