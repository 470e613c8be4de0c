//! Database operations for the `citation_submissions` table.
//!
//! One row per `(domain_id, provider_slug)` pair; re-queuing upserts onto the
//! existing row, never duplicating the pair.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `citation_submissions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubmissionRow {
    pub id: i64,
    pub public_id: Uuid,
    pub domain_id: i64,
    pub provider_slug: String,
    pub external_id: Option<String>,
    pub external_url: Option<String>,
    pub status: String,
    pub last_hash: Option<String>,
    pub error_message: Option<String>,
    pub error_count: i32,
    pub last_submitted_at: Option<DateTime<Utc>>,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SUBMISSION_COLUMNS: &str = "id, public_id, domain_id, provider_slug, external_id, \
     external_url, status, last_hash, error_message, error_count, last_submitted_at, \
     last_verified_at, last_error_at, created_at, updated_at";

/// Returns the submission for a `(domain, provider)` pair, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_submission(
    pool: &PgPool,
    domain_id: i64,
    provider_slug: &str,
) -> Result<Option<SubmissionRow>, DbError> {
    let row = sqlx::query_as::<_, SubmissionRow>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM citation_submissions \
         WHERE domain_id = $1 AND provider_slug = $2"
    ))
    .bind(domain_id)
    .bind(provider_slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetches a submission by its internal id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_submission_by_id(pool: &PgPool, id: i64) -> Result<SubmissionRow, DbError> {
    let row = sqlx::query_as::<_, SubmissionRow>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM citation_submissions WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns all submissions for a domain, provider order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_submissions_for_domain(
    pool: &PgPool,
    domain_id: i64,
) -> Result<Vec<SubmissionRow>, DbError> {
    let rows = sqlx::query_as::<_, SubmissionRow>(&format!(
        "SELECT {SUBMISSION_COLUMNS} FROM citation_submissions \
         WHERE domain_id = $1 ORDER BY provider_slug"
    ))
    .bind(domain_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Moves a `(domain, provider)` pair to `queued` with the freshly computed
/// hash, creating the row if it does not exist. The unique constraint on
/// the pair makes this the idempotence anchor: re-queuing can only ever
/// touch the one existing row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_queued_submission(
    pool: &PgPool,
    domain_id: i64,
    provider_slug: &str,
    hash: &str,
) -> Result<SubmissionRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, SubmissionRow>(&format!(
        "INSERT INTO citation_submissions (public_id, domain_id, provider_slug, status, last_hash) \
         VALUES ($1, $2, $3, 'queued', $4) \
         ON CONFLICT (domain_id, provider_slug) DO UPDATE SET \
             status     = 'queued', \
             last_hash  = EXCLUDED.last_hash, \
             updated_at = NOW() \
         RETURNING {SUBMISSION_COLUMNS}"
    ))
    .bind(public_id)
    .bind(domain_id)
    .bind(provider_slug)
    .bind(hash)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a submission as in-flight for the current drain cycle.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_submitting(pool: &PgPool, id: i64) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE citation_submissions \
         SET status = 'submitting', updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Records a successful adapter call: sets the new status, persists any
/// newly returned external id/url (existing values are kept when the
/// adapter returned none), and clears the error message. `error_count` is
/// a lifetime tally and survives success, so operators can tell a fresh
/// failure from a chronically flapping pair.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn record_submission_success(
    pool: &PgPool,
    id: i64,
    status: &str,
    external_id: Option<&str>,
    external_url: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE citation_submissions \
         SET status            = $2, \
             external_id       = COALESCE($3, external_id), \
             external_url      = COALESCE($4, external_url), \
             error_message     = NULL, \
             last_submitted_at = NOW(), \
             last_verified_at  = CASE WHEN $2 = 'verified' THEN NOW() ELSE last_verified_at END, \
             updated_at        = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(status)
    .bind(external_id)
    .bind(external_url)
    .execute(pool)
    .await?;

    Ok(())
}

/// Records a failed adapter call: moves the submission to `error`, stores
/// the human-readable message, and bumps the error counter.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn record_submission_error(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE citation_submissions \
         SET status        = 'error', \
             error_message = $2, \
             error_count   = error_count + 1, \
             last_error_at = NOW(), \
             updated_at    = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(error_message)
    .execute(pool)
    .await?;

    Ok(())
}
