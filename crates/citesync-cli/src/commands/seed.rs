//! `seed` — load the domain inventory file and provider catalog into
//! Postgres.

use std::path::Path;

use citesync_core::AppConfig;
use citesync_db::ProviderSeed;
use sqlx::PgPool;

/// Seeds domains, brand profiles, and the provider catalog.
///
/// # Errors
///
/// Returns an error if the inventory file cannot be loaded or a database
/// write fails.
pub async fn run(
    pool: &PgPool,
    config: &AppConfig,
    domains_path: Option<&Path>,
) -> anyhow::Result<()> {
    let path = domains_path.unwrap_or(&config.domains_path);
    let inventory = citesync_core::load_domains(path)?;

    let mut seeded = 0usize;
    for domain_config in &inventory.domains {
        let domain = citesync_db::upsert_domain(
            pool,
            &domain_config.host,
            &domain_config.registrar,
            domain_config.active,
        )
        .await?;
        citesync_db::upsert_brand_profile(pool, domain.id, &domain_config.listing).await?;
        seeded += 1;
    }

    let provider_seeds: Vec<ProviderSeed> = citesync_providers::CATALOG
        .iter()
        .map(|d| ProviderSeed {
            slug: d.slug.to_string(),
            display_name: d.display_name.to_string(),
            tier: i16::from(d.tier),
            auth_method: d.auth.as_str().to_string(),
            rate_per_minute: d.rate_per_minute.and_then(|v| i32::try_from(v).ok()),
            rate_per_day: d.rate_per_day.and_then(|v| i32::try_from(v).ok()),
            enabled: d.enabled_by_default,
        })
        .collect();
    let providers = citesync_db::seed_providers(pool, &provider_seeds).await?;

    println!(
        "Seeded {seeded} domains from {} and {providers} catalog providers",
        path.display()
    );
    Ok(())
}
