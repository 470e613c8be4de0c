//! Database operations for the `citation_queue` table.
//!
//! Items are claimed with an atomic conditional update (`started_at IS
//! NULL`), so two overlapping drain cycles cannot both pick up the same
//! item — the loser sees zero affected rows and moves on.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `citation_queue` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueueItemRow {
    pub id: i64,
    pub submission_id: i64,
    pub action: String,
    pub priority: i32,
    pub attempts: i32,
    pub max_attempts: i32,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub succeeded: Option<bool>,
    pub last_error: Option<String>,
    pub batch_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

const QUEUE_COLUMNS: &str = "id, submission_id, action, priority, attempts, max_attempts, \
     scheduled_at, started_at, completed_at, succeeded, last_error, batch_id, created_at";

/// Inserts a scheduled unit of work referencing a submission.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_queue_item(
    pool: &PgPool,
    submission_id: i64,
    action: &str,
    priority: i32,
    max_attempts: i32,
    scheduled_at: Option<DateTime<Utc>>,
    batch_id: Option<i64>,
) -> Result<QueueItemRow, DbError> {
    let row = sqlx::query_as::<_, QueueItemRow>(&format!(
        "INSERT INTO citation_queue \
             (submission_id, action, priority, max_attempts, scheduled_at, batch_id) \
         VALUES ($1, $2, $3, $4, COALESCE($5, NOW()), $6) \
         RETURNING {QUEUE_COLUMNS}"
    ))
    .bind(submission_id)
    .bind(action)
    .bind(priority)
    .bind(max_attempts)
    .bind(scheduled_at)
    .bind(batch_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a queue item by id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_queue_item(pool: &PgPool, id: i64) -> Result<QueueItemRow, DbError> {
    let row = sqlx::query_as::<_, QueueItemRow>(&format!(
        "SELECT {QUEUE_COLUMNS} FROM citation_queue WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the next `limit` due items: not completed, not in-flight, due by
/// schedule, with attempts remaining. Ordered priority descending, then
/// earliest scheduled first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_due_queue_items(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<QueueItemRow>, DbError> {
    let rows = sqlx::query_as::<_, QueueItemRow>(&format!(
        "SELECT {QUEUE_COLUMNS} FROM citation_queue \
         WHERE completed_at IS NULL \
           AND started_at IS NULL \
           AND scheduled_at <= NOW() \
           AND attempts < max_attempts \
         ORDER BY priority DESC, scheduled_at ASC, id ASC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Atomically claims an item for processing: stamps `started_at` and bumps
/// `attempts` in one statement, so a crash mid-call still counts as an
/// attempt on restart. Returns `false` if another cycle already claimed or
/// completed the item.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn claim_queue_item(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE citation_queue \
         SET started_at = NOW(), attempts = attempts + 1 \
         WHERE id = $1 AND started_at IS NULL AND completed_at IS NULL",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Marks an item complete with its final outcome.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn complete_queue_item(pool: &PgPool, id: i64, succeeded: bool) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE citation_queue \
         SET completed_at = NOW(), succeeded = $2 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(succeeded)
    .execute(pool)
    .await?;

    Ok(())
}

/// Releases a failed item back to the queue: `started_at` goes back to
/// NULL so the item is eligible on the next drain cycle instead of sitting
/// stuck in-flight. The attempt it just consumed stays counted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn release_queue_item_for_retry(
    pool: &PgPool,
    id: i64,
    error: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE citation_queue \
         SET started_at = NULL, last_error = $2 \
         WHERE id = $1",
    )
    .bind(id)
    .bind(error)
    .execute(pool)
    .await?;

    Ok(())
}

/// Counts items in a batch that can still make progress: not completed and
/// with attempts remaining. Zero means the batch is ready to finalize.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_open_queue_items_for_batch(
    pool: &PgPool,
    batch_id: i64,
) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM citation_queue \
         WHERE batch_id = $1 AND completed_at IS NULL AND attempts < max_attempts",
    )
    .bind(batch_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
