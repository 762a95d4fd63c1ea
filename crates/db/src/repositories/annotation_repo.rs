//! Repository for the `annotations` table.

use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::models::annotation::{Annotation, NewAnnotation};

const COLUMNS: &str = "annotator_id, collection_name, unit_id, error_identity, error_type, \
                       full_match, taxonomy_tags, severity, unit_index, reference_text, \
                       raw_transcript, marked_text, revision, submitted_at, created_at";

/// Judgment storage keyed on `(annotator_id, error_identity)`.
pub struct AnnotationRepo;

impl AnnotationRepo {
    /// Insert or revise an annotation in a single statement.
    ///
    /// Key columns are never touched on conflict. The returned `revision`
    /// is 1 for a fresh row.
    pub async fn upsert(pool: &SqlitePool, input: &NewAnnotation) -> Result<Annotation, sqlx::Error> {
        let query = format!(
            "INSERT INTO annotations
                (annotator_id, collection_name, unit_id, error_identity, error_type, full_match,
                 taxonomy_tags, severity, unit_index, reference_text, raw_transcript, marked_text,
                 revision, submitted_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 1, $13, $13)
             ON CONFLICT (annotator_id, error_identity) DO UPDATE SET
                taxonomy_tags = excluded.taxonomy_tags,
                severity = excluded.severity,
                unit_index = excluded.unit_index,
                reference_text = excluded.reference_text,
                raw_transcript = excluded.raw_transcript,
                marked_text = excluded.marked_text,
                submitted_at = excluded.submitted_at,
                revision = annotations.revision + 1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(&input.annotator_id)
            .bind(&input.collection_name)
            .bind(&input.unit_id)
            .bind(input.error_identity.as_str())
            .bind(&input.error_type)
            .bind(&input.full_match)
            .bind(Json(&input.taxonomy_tags))
            .bind(input.severity)
            .bind(input.context.unit_index)
            .bind(&input.context.reference_text)
            .bind(&input.context.raw_transcript)
            .bind(&input.context.marked_text)
            .bind(input.submitted_at)
            .fetch_one(pool)
            .await
    }

    /// An annotator's annotations, optionally restricted to one collection.
    pub async fn list_for_annotator(
        pool: &SqlitePool,
        annotator_id: &str,
        collection_name: Option<&str>,
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotations
             WHERE annotator_id = $1 AND ($2 IS NULL OR collection_name = $2)
             ORDER BY created_at, rowid"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(annotator_id)
            .bind(collection_name)
            .fetch_all(pool)
            .await
    }

    /// Annotations on one unit, optionally from one annotator.
    pub async fn list_for_unit(
        pool: &SqlitePool,
        collection_name: &str,
        unit_id: &str,
        annotator_id: Option<&str>,
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotations
             WHERE collection_name = $1 AND unit_id = $2 AND ($3 IS NULL OR annotator_id = $3)
             ORDER BY created_at, rowid"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(collection_name)
            .bind(unit_id)
            .bind(annotator_id)
            .fetch_all(pool)
            .await
    }

    /// Annotations in a collection, optionally from one annotator.
    pub async fn list_in_collection(
        pool: &SqlitePool,
        collection_name: &str,
        annotator_id: Option<&str>,
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotations
             WHERE collection_name = $1 AND ($2 IS NULL OR annotator_id = $2)
             ORDER BY created_at, rowid"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(collection_name)
            .bind(annotator_id)
            .fetch_all(pool)
            .await
    }

    pub async fn count_in_collection(
        pool: &SqlitePool,
        collection_name: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM annotations WHERE collection_name = $1")
            .bind(collection_name)
            .fetch_one(pool)
            .await
    }

    pub async fn count_for_annotator(
        pool: &SqlitePool,
        annotator_id: &str,
        collection_name: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM annotations WHERE annotator_id = $1 AND collection_name = $2",
        )
        .bind(annotator_id)
        .bind(collection_name)
        .fetch_one(pool)
        .await
    }
}
