//! `drain` — run one drain cycle over due queue items.

use citesync_providers::ProviderRegistry;
use sqlx::PgPool;

/// Drains up to `limit` due items and prints the tally.
///
/// # Errors
///
/// Returns an error only if the due-item fetch fails; per-item failures
/// are counted in the report.
pub async fn run(pool: &PgPool, registry: &ProviderRegistry, limit: i64) -> anyhow::Result<()> {
    let report = citesync_engine::drain(pool, registry, limit).await?;
    println!(
        "Drained {} items: {} succeeded, {} failed, {} claimed elsewhere",
        report.processed, report.succeeded, report.failed, report.skipped
    );
    Ok(())
}
