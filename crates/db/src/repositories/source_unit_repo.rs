//! Repository for the `source_units` table.

use errata_core::types::Timestamp;
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::models::source_unit::{NewSourceUnit, SourceUnit};

const COLUMNS: &str = "collection_name, unit_id, position, reference_text, raw_transcript, \
                       marked_text, metadata, spans, error_count, created_at";

/// Import and navigation over source units.
pub struct SourceUnitRepo;

impl SourceUnitRepo {
    /// Insert units in one transaction, skipping ids already present.
    ///
    /// New units get consecutive positions after the current last one.
    /// Returns `(inserted, skipped)`.
    pub async fn insert_many(
        pool: &SqlitePool,
        collection_name: &str,
        units: &[NewSourceUnit],
        now: Timestamp,
    ) -> Result<(usize, usize), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let mut next_position: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM source_units WHERE collection_name = $1",
        )
        .bind(collection_name)
        .fetch_one(&mut *tx)
        .await?;

        let mut inserted = 0;
        for unit in units {
            let result = sqlx::query(
                "INSERT INTO source_units
                    (collection_name, unit_id, position, reference_text, raw_transcript,
                     marked_text, metadata, spans, error_count, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                 ON CONFLICT (collection_name, unit_id) DO NOTHING",
            )
            .bind(collection_name)
            .bind(&unit.unit_id)
            .bind(next_position)
            .bind(&unit.reference_text)
            .bind(&unit.raw_transcript)
            .bind(&unit.marked_text)
            .bind(Json(&unit.metadata))
            .bind(Json(&unit.spans))
            .bind(unit.spans.len() as i64)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                inserted += 1;
                next_position += 1;
            }
        }

        tx.commit().await?;
        Ok((inserted, units.len() - inserted))
    }

    /// All units of a collection in import order.
    pub async fn list(
        pool: &SqlitePool,
        collection_name: &str,
    ) -> Result<Vec<SourceUnit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM source_units WHERE collection_name = $1 ORDER BY position"
        );
        sqlx::query_as::<_, SourceUnit>(&query)
            .bind(collection_name)
            .fetch_all(pool)
            .await
    }

    /// Unit at a 0-based position.
    pub async fn find_at(
        pool: &SqlitePool,
        collection_name: &str,
        position: i64,
    ) -> Result<Option<SourceUnit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM source_units WHERE collection_name = $1 AND position = $2"
        );
        sqlx::query_as::<_, SourceUnit>(&query)
            .bind(collection_name)
            .bind(position)
            .fetch_optional(pool)
            .await
    }

    /// Unit by id.
    pub async fn find(
        pool: &SqlitePool,
        collection_name: &str,
        unit_id: &str,
    ) -> Result<Option<SourceUnit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM source_units WHERE collection_name = $1 AND unit_id = $2"
        );
        sqlx::query_as::<_, SourceUnit>(&query)
            .bind(collection_name)
            .bind(unit_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn count(pool: &SqlitePool, collection_name: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM source_units WHERE collection_name = $1")
            .bind(collection_name)
            .fetch_one(pool)
            .await
    }

    /// Total error occurrences over all units of a collection.
    pub async fn count_error_occurrences(
        pool: &SqlitePool,
        collection_name: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(error_count), 0) FROM source_units WHERE collection_name = $1",
        )
        .bind(collection_name)
        .fetch_one(pool)
        .await
    }

    /// Names of collections with at least one imported unit.
    pub async fn list_collections(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT collection_name FROM source_units ORDER BY collection_name",
        )
        .fetch_all(pool)
        .await
    }
}
