//! Repository for the `annotators` table.

use errata_core::types::Timestamp;
use sqlx::SqlitePool;

use crate::models::annotator::{Annotator, CreateAnnotator};

const COLUMNS: &str = "annotator_id, display_name, email, affiliation, created_at";

/// Roster lookups and registration.
pub struct AnnotatorRepo;

impl AnnotatorRepo {
    /// Register an annotator unless the id is already known.
    ///
    /// Returns `true` if a row was inserted. An email already used by a
    /// different id fails with the `uq_annotators_email` violation.
    pub async fn insert_if_absent(
        pool: &SqlitePool,
        input: &CreateAnnotator,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO annotators (annotator_id, display_name, email, affiliation, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (annotator_id) DO NOTHING",
        )
        .bind(&input.annotator_id)
        .bind(&input.display_name)
        .bind(&input.email)
        .bind(&input.affiliation)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find an annotator by id.
    pub async fn find(
        pool: &SqlitePool,
        annotator_id: &str,
    ) -> Result<Option<Annotator>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM annotators WHERE annotator_id = $1");
        sqlx::query_as::<_, Annotator>(&query)
            .bind(annotator_id)
            .fetch_optional(pool)
            .await
    }
}
