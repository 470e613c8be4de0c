//! Database operations for the `citation_batches` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `citation_batches` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BatchRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub status: String,
    pub total_count: i32,
    pub completed_count: i32,
    pub failed_count: i32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

const BATCH_COLUMNS: &str = "id, public_id, name, status, total_count, completed_count, \
     failed_count, created_at, completed_at";

/// Creates a new batch in `pending` status with zero counters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_batch(pool: &PgPool, name: &str) -> Result<BatchRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, BatchRow>(&format!(
        "INSERT INTO citation_batches (public_id, name, status) \
         VALUES ($1, $2, 'pending') \
         RETURNING {BATCH_COLUMNS}"
    ))
    .bind(public_id)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a batch by its internal id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_batch(pool: &PgPool, id: i64) -> Result<BatchRow, DbError> {
    let row = sqlx::query_as::<_, BatchRow>(&format!(
        "SELECT {BATCH_COLUMNS} FROM citation_batches WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Fetches a batch by its public UUID.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_batch_by_public_id(pool: &PgPool, public_id: Uuid) -> Result<BatchRow, DbError> {
    let row = sqlx::query_as::<_, BatchRow>(&format!(
        "SELECT {BATCH_COLUMNS} FROM citation_batches WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent batches, optionally filtered by status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_batches(
    pool: &PgPool,
    status: Option<&str>,
    limit: i64,
) -> Result<Vec<BatchRow>, DbError> {
    let rows = sqlx::query_as::<_, BatchRow>(&format!(
        "SELECT {BATCH_COLUMNS} FROM citation_batches \
         WHERE ($1::text IS NULL OR status = $1) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(status)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Adds `n` to the batch total as queue items are enqueued under it, and
/// moves a `pending` batch to `processing` on first touch.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn increment_batch_total(pool: &PgPool, id: i64, n: i32) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE citation_batches \
         SET total_count = total_count + $2, \
             status = CASE WHEN status = 'pending' THEN 'processing' ELSE status END \
         WHERE id = $1",
    )
    .bind(id)
    .bind(n)
    .execute(pool)
    .await?;

    Ok(())
}

/// Counts one terminally successful item against the batch.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn record_batch_item_success(pool: &PgPool, id: i64) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE citation_batches SET completed_count = completed_count + 1 WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Counts one terminally failed item (attempts exhausted) against the batch.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn record_batch_item_failure(pool: &PgPool, id: i64) -> Result<(), DbError> {
    sqlx::query("UPDATE citation_batches SET failed_count = failed_count + 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Finalizes a batch if no item of it can still make progress. The final
/// status is `completed` when at least one item succeeded, else `failed`.
/// Returns `true` if this call performed the finalization.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn finalize_batch(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE citation_batches b \
         SET status = CASE WHEN b.completed_count > 0 THEN 'completed' ELSE 'failed' END, \
             completed_at = NOW() \
         WHERE b.id = $1 \
           AND b.status IN ('pending', 'processing') \
           AND NOT EXISTS ( \
               SELECT 1 FROM citation_queue q \
               WHERE q.batch_id = b.id \
                 AND q.completed_at IS NULL \
                 AND q.attempts < q.max_attempts)",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Cancels a batch and abandons its open queue items.
///
/// # Errors
///
/// Returns [`DbError::InvalidBatchTransition`] if the batch is already
/// finished, or [`DbError::Sqlx`] if a statement fails.
pub async fn cancel_batch(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE citation_batches \
         SET status = 'cancelled', completed_at = NOW() \
         WHERE id = $1 AND status IN ('pending', 'processing')",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidBatchTransition {
            id,
            expected_status: "pending or processing",
        });
    }

    sqlx::query(
        "UPDATE citation_queue \
         SET completed_at = NOW(), succeeded = FALSE, last_error = 'batch cancelled' \
         WHERE batch_id = $1 AND completed_at IS NULL",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}
