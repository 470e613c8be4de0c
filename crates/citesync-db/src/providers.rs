//! Database operations for the `providers` catalog table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `providers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProviderRow {
    pub slug: String,
    pub display_name: String,
    pub tier: i16,
    pub auth_method: String,
    pub rate_per_minute: Option<i32>,
    pub rate_per_day: Option<i32>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Seed input for one provider catalog entry.
#[derive(Debug, Clone)]
pub struct ProviderSeed {
    pub slug: String,
    pub display_name: String,
    pub tier: i16,
    pub auth_method: String,
    pub rate_per_minute: Option<i32>,
    pub rate_per_day: Option<i32>,
    pub enabled: bool,
}

const PROVIDER_COLUMNS: &str =
    "slug, display_name, tier, auth_method, rate_per_minute, rate_per_day, enabled, created_at";

/// Seeds the provider catalog. Existing rows keep their operator-set
/// `enabled` flag; descriptor metadata is refreshed in place.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any upsert fails.
pub async fn seed_providers(pool: &PgPool, seeds: &[ProviderSeed]) -> Result<usize, DbError> {
    let mut written = 0usize;
    for seed in seeds {
        sqlx::query(
            "INSERT INTO providers \
                 (slug, display_name, tier, auth_method, rate_per_minute, rate_per_day, enabled) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (slug) DO UPDATE SET \
                 display_name    = EXCLUDED.display_name, \
                 tier            = EXCLUDED.tier, \
                 auth_method     = EXCLUDED.auth_method, \
                 rate_per_minute = EXCLUDED.rate_per_minute, \
                 rate_per_day    = EXCLUDED.rate_per_day",
        )
        .bind(&seed.slug)
        .bind(&seed.display_name)
        .bind(seed.tier)
        .bind(&seed.auth_method)
        .bind(seed.rate_per_minute)
        .bind(seed.rate_per_day)
        .bind(seed.enabled)
        .execute(pool)
        .await?;
        written += 1;
    }
    Ok(written)
}

/// Returns the full provider catalog, tier then slug order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_providers(pool: &PgPool) -> Result<Vec<ProviderRow>, DbError> {
    let rows = sqlx::query_as::<_, ProviderRow>(&format!(
        "SELECT {PROVIDER_COLUMNS} FROM providers ORDER BY tier, slug"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single catalog entry by slug.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_provider(pool: &PgPool, slug: &str) -> Result<Option<ProviderRow>, DbError> {
    let row = sqlx::query_as::<_, ProviderRow>(&format!(
        "SELECT {PROVIDER_COLUMNS} FROM providers WHERE slug = $1"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the slugs of enabled providers at or below the given tier.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_enabled_provider_slugs(
    pool: &PgPool,
    max_tier: i16,
) -> Result<Vec<String>, DbError> {
    let slugs = sqlx::query_scalar::<_, String>(
        "SELECT slug FROM providers WHERE enabled = true AND tier <= $1 ORDER BY tier, slug",
    )
    .bind(max_tier)
    .fetch_all(pool)
    .await?;

    Ok(slugs)
}

/// Toggles a provider's enabled flag.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the slug is not in the catalog, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_provider_enabled(
    pool: &PgPool,
    slug: &str,
    enabled: bool,
) -> Result<(), DbError> {
    let result = sqlx::query("UPDATE providers SET enabled = $1 WHERE slug = $2")
        .bind(enabled)
        .bind(slug)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
