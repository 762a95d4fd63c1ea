//! The annotation store seam.
//!
//! Handlers only see `Arc<dyn AnnotationStore>`. Both implementations
//! guarantee at most one annotation per `(annotator_id, error_identity)` and
//! never leave a partially applied write behind.

use async_trait::async_trait;
use errata_core::error::CoreError;
use errata_core::progress::ProgressReport;

use crate::models::annotation::{Annotation, NewAnnotation, UpsertOutcome};
use crate::models::annotator::{Annotator, CreateAnnotator};
use crate::models::progress::AnnotatorProgress;
use crate::models::source_unit::{ImportOutcome, NewSourceUnit, SourceUnit};

pub mod memory;
pub mod sql;

pub use memory::MemoryStore;
pub use sql::SqlStore;

/// Errors raised by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A domain-level error (lookup, validation, conflict).
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Snapshot file could not be read or written.
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations for units, annotators, annotations and progress.
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// Short backend name for logs and the health endpoint.
    fn backend(&self) -> &'static str;

    async fn health_check(&self) -> StoreResult<()>;

    // -- Source units -------------------------------------------------------

    /// Import identified units. Units whose id already exists in the
    /// collection are skipped; the call is all-or-nothing.
    async fn import_units(
        &self,
        collection_name: &str,
        units: Vec<NewSourceUnit>,
    ) -> StoreResult<ImportOutcome>;

    /// Collections with at least one imported unit, sorted.
    async fn list_collections(&self) -> StoreResult<Vec<String>>;

    async fn list_units(&self, collection_name: &str) -> StoreResult<Vec<SourceUnit>>;

    async fn unit_at(&self, collection_name: &str, index: i64)
        -> StoreResult<Option<SourceUnit>>;

    async fn find_unit(
        &self,
        collection_name: &str,
        unit_id: &str,
    ) -> StoreResult<Option<SourceUnit>>;

    async fn count_units(&self, collection_name: &str) -> StoreResult<i64>;

    async fn count_error_occurrences(&self, collection_name: &str) -> StoreResult<i64>;

    // -- Annotators ---------------------------------------------------------

    /// Register roster entries, skipping ids already known. Returns the
    /// number of new annotators.
    async fn load_roster(&self, annotators: Vec<CreateAnnotator>) -> StoreResult<usize>;

    async fn find_annotator(&self, annotator_id: &str) -> StoreResult<Option<Annotator>>;

    // -- Annotations --------------------------------------------------------

    /// Insert or revise the annotation keyed on `(annotator_id, error_identity)`.
    async fn upsert_annotation(&self, new: NewAnnotation) -> StoreResult<UpsertOutcome>;

    async fn annotations_for(
        &self,
        annotator_id: &str,
        collection_name: Option<&str>,
    ) -> StoreResult<Vec<Annotation>>;

    async fn annotations_for_unit(
        &self,
        collection_name: &str,
        unit_id: &str,
        annotator_id: Option<&str>,
    ) -> StoreResult<Vec<Annotation>>;

    async fn annotations_in_collection(
        &self,
        collection_name: &str,
        annotator_id: Option<&str>,
    ) -> StoreResult<Vec<Annotation>>;

    async fn count_for(&self, collection_name: &str) -> StoreResult<i64>;

    async fn count_for_annotator(
        &self,
        annotator_id: &str,
        collection_name: &str,
    ) -> StoreResult<i64>;

    // -- Progress -----------------------------------------------------------

    /// Read-only lookup; never creates a row.
    async fn find_progress(
        &self,
        annotator_id: &str,
        collection_name: &str,
    ) -> StoreResult<Option<AnnotatorProgress>>;

    async fn get_or_create_progress(
        &self,
        annotator_id: &str,
        collection_name: &str,
    ) -> StoreResult<AnnotatorProgress>;

    /// Apply an already validated report.
    async fn report_progress(
        &self,
        annotator_id: &str,
        collection_name: &str,
        report: &ProgressReport,
    ) -> StoreResult<AnnotatorProgress>;
}
