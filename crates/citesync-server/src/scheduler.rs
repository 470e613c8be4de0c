//! Background job scheduler.
//!
//! Registers the periodic queue-drain job at server startup. The drain
//! cycle is expected to finish before the next trigger; the queue's
//! conditional claim protects overlapping cycles from double-processing.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use citesync_core::AppConfig;
use citesync_providers::ProviderRegistry;

/// Builds and starts the background job scheduler with the drain job
/// registered on the configured cron expression.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all scheduled
/// jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler cannot be started.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
    registry: Arc<ProviderRegistry>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let cron = config.drain_cron.clone();
    let limit = config.drain_batch_size;
    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = pool.clone();
        let registry = Arc::clone(&registry);
        Box::pin(async move {
            match citesync_engine::drain(&pool, &registry, limit).await {
                Ok(report) => {
                    if report.processed > 0 {
                        tracing::info!(
                            processed = report.processed,
                            succeeded = report.succeeded,
                            failed = report.failed,
                            "scheduled drain cycle finished"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduled drain cycle failed");
                }
            }
        })
    })?;
    scheduler.add(job).await?;

    scheduler.start().await?;
    tracing::info!(cron = %config.drain_cron, "queue drain scheduler started");
    Ok(scheduler)
}
