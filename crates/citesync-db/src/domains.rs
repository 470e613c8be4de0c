//! Database operations for the `domains` and `brand_profiles` tables.

use chrono::{DateTime, Utc};
use citesync_core::{ListingConfig, NormalizedLocation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `domains` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DomainRow {
    pub id: i64,
    pub public_id: Uuid,
    pub host: String,
    pub registrar: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `brand_profiles` table. `hours` and `social_links` are
/// stored as JSONB and decoded leniently on read.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandProfileRow {
    pub id: i64,
    pub domain_id: i64,
    pub business_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub categories: Vec<String>,
    pub hours: serde_json::Value,
    pub social_links: serde_json::Value,
    pub logo_url: Option<String>,
    pub image_urls: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl BrandProfileRow {
    /// Pure mapping into the provider-agnostic payload shape.
    ///
    /// Malformed JSONB in `hours`/`social_links` decodes to empty maps
    /// rather than failing the whole drain cycle.
    #[must_use]
    pub fn to_location(&self) -> NormalizedLocation {
        NormalizedLocation {
            business_name: self.business_name.clone(),
            street: self.street.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip: self.zip.clone(),
            country: self.country.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            website: self.website.clone(),
            description: self.description.clone(),
            categories: self.categories.clone(),
            hours: serde_json::from_value(self.hours.clone()).unwrap_or_default(),
            social_links: serde_json::from_value(self.social_links.clone()).unwrap_or_default(),
            logo_url: self.logo_url.clone(),
            image_urls: self.image_urls.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// domains operations
// ---------------------------------------------------------------------------

const DOMAIN_COLUMNS: &str = "id, public_id, host, registrar, is_active, created_at, updated_at";

/// Inserts or updates a domain by host. Conflicts update the registrar and
/// active flag in place.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_domain(
    pool: &PgPool,
    host: &str,
    registrar: &str,
    is_active: bool,
) -> Result<DomainRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, DomainRow>(
        "INSERT INTO domains (public_id, host, registrar, is_active) \
         VALUES ($1, LOWER($2), $3, $4) \
         ON CONFLICT (host) DO UPDATE SET \
             registrar  = EXCLUDED.registrar, \
             is_active  = EXCLUDED.is_active, \
             updated_at = NOW() \
         RETURNING id, public_id, host, registrar, is_active, created_at, updated_at",
    )
    .bind(public_id)
    .bind(host)
    .bind(registrar)
    .bind(is_active)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a single domain by host, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_domain_by_host(pool: &PgPool, host: &str) -> Result<Option<DomainRow>, DbError> {
    let row = sqlx::query_as::<_, DomainRow>(&format!(
        "SELECT {DOMAIN_COLUMNS} FROM domains WHERE host = LOWER($1)"
    ))
    .bind(host)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns all active domains, ordered by host.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_domains(pool: &PgPool) -> Result<Vec<DomainRow>, DbError> {
    let rows = sqlx::query_as::<_, DomainRow>(&format!(
        "SELECT {DOMAIN_COLUMNS} FROM domains WHERE is_active = true ORDER BY host"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// brand_profiles operations
// ---------------------------------------------------------------------------

/// Inserts or replaces the listing profile for a domain.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_brand_profile(
    pool: &PgPool,
    domain_id: i64,
    listing: &ListingConfig,
) -> Result<(), DbError> {
    let hours = serde_json::to_value(&listing.hours).unwrap_or(serde_json::Value::Null);
    let social = serde_json::to_value(&listing.social_links).unwrap_or(serde_json::Value::Null);

    sqlx::query(
        "INSERT INTO brand_profiles \
             (domain_id, business_name, street, city, state, zip, country, phone, email, \
              website, description, categories, hours, social_links, logo_url, image_urls) \
         VALUES ($1, $2, COALESCE($3, ''), COALESCE($4, ''), COALESCE($5, ''), \
                 COALESCE($6, ''), COALESCE($7, ''), $8, $9, $10, $11, $12, $13, $14, $15, $16) \
         ON CONFLICT (domain_id) DO UPDATE SET \
             business_name = EXCLUDED.business_name, \
             street        = EXCLUDED.street, \
             city          = EXCLUDED.city, \
             state         = EXCLUDED.state, \
             zip           = EXCLUDED.zip, \
             country       = EXCLUDED.country, \
             phone         = EXCLUDED.phone, \
             email         = EXCLUDED.email, \
             website       = EXCLUDED.website, \
             description   = EXCLUDED.description, \
             categories    = EXCLUDED.categories, \
             hours         = EXCLUDED.hours, \
             social_links  = EXCLUDED.social_links, \
             logo_url      = EXCLUDED.logo_url, \
             image_urls    = EXCLUDED.image_urls, \
             updated_at    = NOW()",
    )
    .bind(domain_id)
    .bind(&listing.business_name)
    .bind(listing.street.as_deref())
    .bind(listing.city.as_deref())
    .bind(listing.state.as_deref())
    .bind(listing.zip.as_deref())
    .bind(listing.country.as_deref())
    .bind(listing.phone.as_deref())
    .bind(listing.email.as_deref())
    .bind(listing.website.as_deref())
    .bind(listing.description.as_deref())
    .bind(&listing.categories)
    .bind(hours)
    .bind(social)
    .bind(listing.logo_url.as_deref())
    .bind(&listing.image_urls)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns the listing profile for a domain, or `None` if not seeded yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_brand_profile(
    pool: &PgPool,
    domain_id: i64,
) -> Result<Option<BrandProfileRow>, DbError> {
    let row = sqlx::query_as::<_, BrandProfileRow>(
        "SELECT id, domain_id, business_name, street, city, state, zip, country, phone, \
                email, website, description, categories, hours, social_links, logo_url, \
                image_urls, updated_at \
         FROM brand_profiles \
         WHERE domain_id = $1",
    )
    .bind(domain_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
