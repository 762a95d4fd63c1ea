//! SQLite-backed store built on the repositories.

use async_trait::async_trait;
use chrono::Utc;
use errata_core::progress::ProgressReport;

use crate::models::annotation::{Annotation, NewAnnotation, UpsertOutcome};
use crate::models::annotator::{Annotator, CreateAnnotator};
use crate::models::progress::AnnotatorProgress;
use crate::models::source_unit::{ImportOutcome, NewSourceUnit, SourceUnit};
use crate::repositories::{AnnotationRepo, AnnotatorRepo, ProgressRepo, SourceUnitRepo};
use crate::store::{AnnotationStore, StoreResult};
use crate::DbPool;

/// Relational store. Uniqueness is enforced by the schema, so concurrent
/// writers for the same key are linearized by the database.
#[derive(Clone)]
pub struct SqlStore {
    pool: DbPool,
}

impl SqlStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open the database at `database_url` and apply migrations.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = crate::create_pool(database_url).await?;
        crate::run_migrations(&pool).await?;
        tracing::info!(database_url, "SQLite store ready");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl AnnotationStore for SqlStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }

    async fn import_units(
        &self,
        collection_name: &str,
        units: Vec<NewSourceUnit>,
    ) -> StoreResult<ImportOutcome> {
        let (loaded, skipped) =
            SourceUnitRepo::insert_many(&self.pool, collection_name, &units, Utc::now()).await?;
        let total = SourceUnitRepo::count(&self.pool, collection_name).await?;
        Ok(ImportOutcome {
            collection_name: collection_name.to_string(),
            loaded,
            skipped,
            total,
        })
    }

    async fn list_collections(&self) -> StoreResult<Vec<String>> {
        Ok(SourceUnitRepo::list_collections(&self.pool).await?)
    }

    async fn list_units(&self, collection_name: &str) -> StoreResult<Vec<SourceUnit>> {
        Ok(SourceUnitRepo::list(&self.pool, collection_name).await?)
    }

    async fn unit_at(
        &self,
        collection_name: &str,
        index: i64,
    ) -> StoreResult<Option<SourceUnit>> {
        Ok(SourceUnitRepo::find_at(&self.pool, collection_name, index).await?)
    }

    async fn find_unit(
        &self,
        collection_name: &str,
        unit_id: &str,
    ) -> StoreResult<Option<SourceUnit>> {
        Ok(SourceUnitRepo::find(&self.pool, collection_name, unit_id).await?)
    }

    async fn count_units(&self, collection_name: &str) -> StoreResult<i64> {
        Ok(SourceUnitRepo::count(&self.pool, collection_name).await?)
    }

    async fn count_error_occurrences(&self, collection_name: &str) -> StoreResult<i64> {
        Ok(SourceUnitRepo::count_error_occurrences(&self.pool, collection_name).await?)
    }

    async fn load_roster(&self, annotators: Vec<CreateAnnotator>) -> StoreResult<usize> {
        let now = Utc::now();
        let mut added = 0;
        for annotator in &annotators {
            if AnnotatorRepo::insert_if_absent(&self.pool, annotator, now).await? {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn find_annotator(&self, annotator_id: &str) -> StoreResult<Option<Annotator>> {
        Ok(AnnotatorRepo::find(&self.pool, annotator_id).await?)
    }

    async fn upsert_annotation(&self, new: NewAnnotation) -> StoreResult<UpsertOutcome> {
        let annotation = AnnotationRepo::upsert(&self.pool, &new).await?;
        Ok(UpsertOutcome::from_revision(annotation))
    }

    async fn annotations_for(
        &self,
        annotator_id: &str,
        collection_name: Option<&str>,
    ) -> StoreResult<Vec<Annotation>> {
        Ok(AnnotationRepo::list_for_annotator(&self.pool, annotator_id, collection_name).await?)
    }

    async fn annotations_for_unit(
        &self,
        collection_name: &str,
        unit_id: &str,
        annotator_id: Option<&str>,
    ) -> StoreResult<Vec<Annotation>> {
        Ok(
            AnnotationRepo::list_for_unit(&self.pool, collection_name, unit_id, annotator_id)
                .await?,
        )
    }

    async fn annotations_in_collection(
        &self,
        collection_name: &str,
        annotator_id: Option<&str>,
    ) -> StoreResult<Vec<Annotation>> {
        Ok(AnnotationRepo::list_in_collection(&self.pool, collection_name, annotator_id).await?)
    }

    async fn count_for(&self, collection_name: &str) -> StoreResult<i64> {
        Ok(AnnotationRepo::count_in_collection(&self.pool, collection_name).await?)
    }

    async fn count_for_annotator(
        &self,
        annotator_id: &str,
        collection_name: &str,
    ) -> StoreResult<i64> {
        Ok(AnnotationRepo::count_for_annotator(&self.pool, annotator_id, collection_name).await?)
    }

    async fn find_progress(
        &self,
        annotator_id: &str,
        collection_name: &str,
    ) -> StoreResult<Option<AnnotatorProgress>> {
        Ok(ProgressRepo::find(&self.pool, annotator_id, collection_name).await?)
    }

    async fn get_or_create_progress(
        &self,
        annotator_id: &str,
        collection_name: &str,
    ) -> StoreResult<AnnotatorProgress> {
        Ok(ProgressRepo::get_or_create(&self.pool, annotator_id, collection_name, Utc::now()).await?)
    }

    async fn report_progress(
        &self,
        annotator_id: &str,
        collection_name: &str,
        report: &ProgressReport,
    ) -> StoreResult<AnnotatorProgress> {
        Ok(
            ProgressRepo::report(&self.pool, annotator_id, collection_name, report, Utc::now())
                .await?,
        )
    }
}
