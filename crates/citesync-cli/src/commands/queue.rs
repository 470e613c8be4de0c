//! `queue`, `verify`, and `remove` — enqueue citation work.

use citesync_core::AppConfig;
use citesync_engine::{queue_deletion, queue_domain, queue_verification, QueueOptions};
use citesync_providers::ProviderRegistry;
use sqlx::PgPool;

pub struct QueueArgs {
    pub host: Option<String>,
    pub all: bool,
    pub provider: Option<String>,
    pub priority: Option<i32>,
    pub batch: Option<String>,
}

/// Queues submissions for one host or the whole active inventory.
///
/// # Errors
///
/// Returns an error when neither a host nor `--all` is given, or when a
/// single-host queue fails. In `--all` mode per-domain failures are logged
/// and skipped.
pub async fn run(
    pool: &PgPool,
    registry: &ProviderRegistry,
    config: &AppConfig,
    args: QueueArgs,
) -> anyhow::Result<()> {
    let mut opts = QueueOptions::from_app_config(config);
    if let Some(priority) = args.priority {
        opts.priority = priority;
    }
    opts.only_provider = args.provider;

    if let Some(name) = &args.batch {
        let batch = citesync_db::create_batch(pool, name).await?;
        println!("Created batch '{name}' ({})", batch.public_id);
        opts.batch_id = Some(batch.id);
    }

    let hosts: Vec<String> = match (&args.host, args.all) {
        (Some(host), false) => vec![host.clone()],
        (None, true) => citesync_db::list_active_domains(pool)
            .await?
            .into_iter()
            .map(|d| d.host)
            .collect(),
        (Some(_), true) => anyhow::bail!("pass either a host or --all, not both"),
        (None, false) => anyhow::bail!("pass a domain host or --all"),
    };

    let bulk = hosts.len() > 1;
    for host in hosts {
        match queue_domain(pool, registry, &host, &opts).await {
            Ok(report) => {
                for (slug, action) in &report.queued {
                    println!("{host}: queued {action} for {slug}");
                }
                for (slug, reason) in &report.skipped {
                    println!("{host}: skipped {slug} ({reason})");
                }
            }
            Err(e) if bulk => {
                tracing::error!(host = %host, error = %e, "failed to queue domain");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Queues verification probes for a host's existing listings.
///
/// # Errors
///
/// Returns an error if the host is unknown or a store call fails.
pub async fn run_verify(
    pool: &PgPool,
    registry: &ProviderRegistry,
    config: &AppConfig,
    host: &str,
    provider: Option<String>,
) -> anyhow::Result<()> {
    let mut opts = QueueOptions::from_app_config(config);
    opts.only_provider = provider;

    let report = queue_verification(pool, registry, host, &opts).await?;
    for (slug, action) in &report.queued {
        println!("{host}: queued {action} for {slug}");
    }
    for (slug, reason) in &report.skipped {
        println!("{host}: skipped {slug} ({reason})");
    }
    Ok(())
}

/// Queues deletion of a single (domain, provider) listing.
///
/// # Errors
///
/// Returns an error if no submission with an external id exists for the
/// pair.
pub async fn run_remove(
    pool: &PgPool,
    config: &AppConfig,
    host: &str,
    provider: &str,
) -> anyhow::Result<()> {
    let opts = QueueOptions::from_app_config(config);
    queue_deletion(pool, host, provider, &opts).await?;
    println!("{host}: queued delete for {provider}");
    Ok(())
}
