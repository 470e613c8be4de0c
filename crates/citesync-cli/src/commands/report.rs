//! Read-only reports: provider status, domain coverage, batch listing.

use citesync_providers::ProviderRegistry;
use sqlx::PgPool;

/// Prints the provider catalog with adapter/configuration status, after
/// applying an optional enable/disable toggle.
///
/// # Errors
///
/// Returns an error if a toggle targets an unknown slug or a query fails.
pub async fn providers(
    pool: &PgPool,
    registry: &ProviderRegistry,
    enable: Option<String>,
    disable: Option<String>,
) -> anyhow::Result<()> {
    if let Some(slug) = enable {
        citesync_db::set_provider_enabled(pool, &slug, true).await?;
        println!("Enabled {slug}");
    }
    if let Some(slug) = disable {
        citesync_db::set_provider_enabled(pool, &slug, false).await?;
        println!("Disabled {slug}");
    }

    let rows = citesync_db::list_providers(pool).await?;
    println!(
        "{:<16} {:<28} {:>4} {:>8} {:>10} {:>11}",
        "SLUG", "NAME", "TIER", "ENABLED", "ADAPTER", "CONFIGURED"
    );
    for status in registry.status_report() {
        let enabled = rows
            .iter()
            .find(|r| r.slug == status.slug)
            .map_or(false, |r| r.enabled);
        println!(
            "{:<16} {:<28} {:>4} {:>8} {:>10} {:>11}",
            status.slug,
            status.display_name,
            status.tier,
            if enabled { "yes" } else { "no" },
            if status.has_adapter { "yes" } else { "no" },
            if status.configured { "yes" } else { "no" },
        );
    }
    Ok(())
}

/// Prints the coverage summary for a host as pretty JSON.
///
/// # Errors
///
/// Returns an error if the host is unknown or a query fails.
pub async fn coverage(pool: &PgPool, host: &str) -> anyhow::Result<()> {
    let summary = citesync_engine::coverage_summary(pool, host).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Cancels a batch by public id, abandoning its open queue items.
///
/// # Errors
///
/// Returns an error if the batch is unknown or already finished.
pub async fn cancel_batch(pool: &PgPool, public_id: uuid::Uuid) -> anyhow::Result<()> {
    let batch = citesync_db::get_batch_by_public_id(pool, public_id).await?;
    citesync_db::cancel_batch(pool, batch.id).await?;
    println!("Cancelled batch '{}' ({public_id})", batch.name);
    Ok(())
}

/// Lists recent batches, optionally filtered by status.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn batches(pool: &PgPool, status: Option<&str>, limit: i64) -> anyhow::Result<()> {
    let rows = citesync_db::list_batches(pool, status, limit).await?;
    if rows.is_empty() {
        println!("No batches found");
        return Ok(());
    }

    println!(
        "{:<38} {:<24} {:<11} {:>5} {:>5} {:>6}",
        "ID", "NAME", "STATUS", "TOTAL", "OK", "FAILED"
    );
    for batch in rows {
        println!(
            "{:<38} {:<24} {:<11} {:>5} {:>5} {:>6}",
            batch.public_id,
            batch.name,
            batch.status,
            batch.total_count,
            batch.completed_count,
            batch.failed_count,
        );
    }
    Ok(())
}
