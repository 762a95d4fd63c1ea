//! Repository for the `annotator_progress` table.

use errata_core::progress::ProgressReport;
use errata_core::types::Timestamp;
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::models::progress::AnnotatorProgress;

const COLUMNS: &str =
    "annotator_id, collection_name, current_index, completed_unit_ids, last_accessed, created_at";

/// Per-annotator navigation state.
pub struct ProgressRepo;

impl ProgressRepo {
    /// Find the progress row without creating it.
    pub async fn find(
        pool: &SqlitePool,
        annotator_id: &str,
        collection_name: &str,
    ) -> Result<Option<AnnotatorProgress>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotator_progress
             WHERE annotator_id = $1 AND collection_name = $2"
        );
        sqlx::query_as::<_, AnnotatorProgress>(&query)
            .bind(annotator_id)
            .bind(collection_name)
            .fetch_optional(pool)
            .await
    }

    /// Return the progress row, creating it at index 0 if absent.
    ///
    /// The no-op update makes `RETURNING` yield the existing row.
    pub async fn get_or_create(
        pool: &SqlitePool,
        annotator_id: &str,
        collection_name: &str,
        now: Timestamp,
    ) -> Result<AnnotatorProgress, sqlx::Error> {
        let query = format!(
            "INSERT INTO annotator_progress
                (annotator_id, collection_name, current_index, completed_unit_ids, last_accessed, created_at)
             VALUES ($1, $2, 0, '[]', $3, $3)
             ON CONFLICT (annotator_id, collection_name)
             DO UPDATE SET annotator_id = annotator_progress.annotator_id
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnnotatorProgress>(&query)
            .bind(annotator_id)
            .bind(collection_name)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Apply a partial report. Unset fields keep their stored value;
    /// `last_accessed` always moves to `now`.
    pub async fn report(
        pool: &SqlitePool,
        annotator_id: &str,
        collection_name: &str,
        report: &ProgressReport,
        now: Timestamp,
    ) -> Result<AnnotatorProgress, sqlx::Error> {
        let query = format!(
            "INSERT INTO annotator_progress
                (annotator_id, collection_name, current_index, completed_unit_ids, last_accessed, created_at)
             VALUES ($1, $2, COALESCE($3, 0), COALESCE($4, '[]'), $5, $5)
             ON CONFLICT (annotator_id, collection_name) DO UPDATE SET
                current_index = COALESCE($3, annotator_progress.current_index),
                completed_unit_ids = COALESCE($4, annotator_progress.completed_unit_ids),
                last_accessed = $5
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnnotatorProgress>(&query)
            .bind(annotator_id)
            .bind(collection_name)
            .bind(report.current_index)
            .bind(report.completed_unit_ids.as_ref().map(Json))
            .bind(now)
            .fetch_one(pool)
            .await
    }
}
