//! The workflow orchestrator: sole writer of submission, queue, and batch
//! state. Adapters only ever return results; every transition below is
//! applied here.

use citesync_core::{location_fingerprint, NormalizedLocation, QueueAction, SubmissionStatus};
use citesync_db::{QueueItemRow, SubmissionRow};
use citesync_providers::ProviderRegistry;
use sqlx::PgPool;

use crate::error::EngineError;
use crate::transitions::{
    action_for, enqueue_decision, status_after_success, ActionOutcome, EnqueueDecision,
};

/// Knobs for enqueueing work.
#[derive(Debug, Clone)]
pub struct QueueOptions {
    pub priority: i32,
    pub max_attempts: i32,
    pub batch_id: Option<i64>,
    /// Restrict to a single provider slug instead of the enabled tier ≤ 2
    /// roster. This is also the only way to target tier-3 portal adapters.
    pub only_provider: Option<String>,
}

impl QueueOptions {
    #[must_use]
    pub fn from_app_config(config: &citesync_core::AppConfig) -> Self {
        Self {
            priority: config.queue_default_priority,
            max_attempts: config.queue_max_attempts,
            batch_id: None,
            only_provider: None,
        }
    }
}

/// What `queue_domain` did for one host.
#[derive(Debug, Default)]
pub struct QueueReport {
    pub queued: Vec<(String, QueueAction)>,
    pub skipped: Vec<(String, String)>,
}

/// Tally of one drain cycle.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Items another cycle claimed between fetch and claim.
    pub skipped: usize,
}

/// Queues submit/update work for every eligible provider of a domain.
///
/// Eligibility is decided per pair by [`enqueue_decision`] over the stored
/// hash and status; skipped pairs are reported, not silently dropped.
///
/// # Errors
///
/// Returns [`EngineError::DomainNotFound`] / [`EngineError::ProfileNotFound`]
/// when the host is unknown or not yet seeded, or a [`EngineError::Db`]
/// wrapper when a store call fails.
pub async fn queue_domain(
    pool: &PgPool,
    registry: &ProviderRegistry,
    host: &str,
    opts: &QueueOptions,
) -> Result<QueueReport, EngineError> {
    let (domain, location) = load_domain_location(pool, host).await?;
    let hash = location_fingerprint(&location);

    let slugs: Vec<String> = match &opts.only_provider {
        Some(slug) => {
            if citesync_providers::descriptor_for(slug).is_none() {
                return Err(EngineError::UnknownProvider { slug: slug.clone() });
            }
            vec![slug.clone()]
        }
        None => citesync_db::list_enabled_provider_slugs(pool, 2).await?,
    };

    let mut report = QueueReport::default();

    for slug in slugs {
        let Some(adapter) = registry.get(&slug) else {
            report
                .skipped
                .push((slug, "no adapter (manual-only directory)".to_string()));
            continue;
        };
        if !adapter.is_configured() {
            report
                .skipped
                .push((slug, "adapter is not configured".to_string()));
            continue;
        }

        let existing = citesync_db::get_submission(pool, domain.id, &slug).await?;
        let decision = enqueue_decision(
            existing.as_ref().map(|s| {
                (
                    SubmissionStatus::parse(&s.status).unwrap_or(SubmissionStatus::Pending),
                    s.last_hash.as_deref(),
                )
            }),
            &hash,
        );

        match decision {
            EnqueueDecision::Skip(reason) => {
                tracing::debug!(host, provider = %slug, reason, "skipping enqueue");
                report.skipped.push((slug, reason.to_string()));
            }
            EnqueueDecision::Enqueue => {
                let action = action_for(existing.as_ref().and_then(|s| s.external_id.as_deref()));
                let submission =
                    citesync_db::upsert_queued_submission(pool, domain.id, &slug, &hash).await?;
                citesync_db::insert_queue_item(
                    pool,
                    submission.id,
                    action.as_str(),
                    opts.priority,
                    opts.max_attempts,
                    None,
                    opts.batch_id,
                )
                .await?;
                if let Some(batch_id) = opts.batch_id {
                    citesync_db::increment_batch_total(pool, batch_id, 1).await?;
                }
                tracing::info!(host, provider = %slug, action = %action, "queued citation work");
                report.queued.push((slug, action));
            }
        }
    }

    Ok(report)
}

/// Queues verification probes for every submission of a domain that already
/// has a provider-assigned id.
///
/// # Errors
///
/// Returns [`EngineError::DomainNotFound`] for unknown hosts or a wrapped
/// [`EngineError::Db`] on store failures.
pub async fn queue_verification(
    pool: &PgPool,
    registry: &ProviderRegistry,
    host: &str,
    opts: &QueueOptions,
) -> Result<QueueReport, EngineError> {
    let domain = citesync_db::get_domain_by_host(pool, host)
        .await?
        .ok_or_else(|| EngineError::DomainNotFound {
            host: host.to_string(),
        })?;

    let mut report = QueueReport::default();
    for submission in citesync_db::list_submissions_for_domain(pool, domain.id).await? {
        if let Some(filter) = &opts.only_provider {
            if filter != &submission.provider_slug {
                continue;
            }
        }
        if submission.external_id.is_none() {
            report.skipped.push((
                submission.provider_slug,
                "no external id to verify".to_string(),
            ));
            continue;
        }
        if registry.get(&submission.provider_slug).is_none() {
            report
                .skipped
                .push((submission.provider_slug, "no adapter".to_string()));
            continue;
        }

        citesync_db::insert_queue_item(
            pool,
            submission.id,
            QueueAction::Verify.as_str(),
            opts.priority,
            opts.max_attempts,
            None,
            opts.batch_id,
        )
        .await?;
        if let Some(batch_id) = opts.batch_id {
            citesync_db::increment_batch_total(pool, batch_id, 1).await?;
        }
        report
            .queued
            .push((submission.provider_slug, QueueAction::Verify));
    }

    Ok(report)
}

/// Queues a deletion for one `(domain, provider)` pair.
///
/// # Errors
///
/// Returns [`EngineError::SubmissionNotFound`] when the pair has no
/// submission with an external id, otherwise the usual store errors.
pub async fn queue_deletion(
    pool: &PgPool,
    host: &str,
    provider_slug: &str,
    opts: &QueueOptions,
) -> Result<(), EngineError> {
    let domain = citesync_db::get_domain_by_host(pool, host)
        .await?
        .ok_or_else(|| EngineError::DomainNotFound {
            host: host.to_string(),
        })?;

    let submission = citesync_db::get_submission(pool, domain.id, provider_slug)
        .await?
        .filter(|s| s.external_id.is_some())
        .ok_or_else(|| EngineError::SubmissionNotFound {
            host: host.to_string(),
            slug: provider_slug.to_string(),
        })?;

    citesync_db::insert_queue_item(
        pool,
        submission.id,
        QueueAction::Delete.as_str(),
        opts.priority,
        opts.max_attempts,
        None,
        opts.batch_id,
    )
    .await?;
    if let Some(batch_id) = opts.batch_id {
        citesync_db::increment_batch_total(pool, batch_id, 1).await?;
    }

    Ok(())
}

/// Drains up to `limit` due queue items, invoking the matching adapter for
/// each and persisting the result. Items are processed sequentially;
/// provider rate limits make fan-out a liability, not a win.
///
/// Per-item failures are recorded and counted, never propagated — one bad
/// pair must not stall the rest of the cycle.
///
/// # Errors
///
/// Returns [`EngineError::Db`] only when the due-item fetch itself fails.
pub async fn drain(
    pool: &PgPool,
    registry: &ProviderRegistry,
    limit: i64,
) -> Result<DrainReport, EngineError> {
    let items = citesync_db::fetch_due_queue_items(pool, limit).await?;
    let mut report = DrainReport::default();

    for item in items {
        match process_item(pool, registry, &item).await {
            Ok(ItemResult::Succeeded) => {
                report.processed += 1;
                report.succeeded += 1;
            }
            Ok(ItemResult::Failed) => {
                report.processed += 1;
                report.failed += 1;
            }
            Ok(ItemResult::LostClaim) => report.skipped += 1,
            Err(e) => {
                tracing::error!(
                    queue_item = item.id,
                    error = %e,
                    "unexpected error processing queue item"
                );
                report.processed += 1;
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        processed = report.processed,
        succeeded = report.succeeded,
        failed = report.failed,
        skipped = report.skipped,
        "drain cycle finished"
    );

    Ok(report)
}

enum ItemResult {
    Succeeded,
    Failed,
    LostClaim,
}

async fn process_item(
    pool: &PgPool,
    registry: &ProviderRegistry,
    item: &QueueItemRow,
) -> Result<ItemResult, EngineError> {
    // The conditional claim is the concurrency guard: if a parallel cycle
    // got here first, rows_affected is zero and we walk away.
    if !citesync_db::claim_queue_item(pool, item.id).await? {
        tracing::debug!(queue_item = item.id, "queue item already claimed elsewhere");
        return Ok(ItemResult::LostClaim);
    }
    let attempts_now = item.attempts + 1;

    let submission = citesync_db::get_submission_by_id(pool, item.submission_id).await?;
    citesync_db::mark_submitting(pool, submission.id).await?;

    let outcome = run_action(pool, registry, item, &submission).await;

    if outcome.success {
        let action = QueueAction::parse(&item.action).unwrap_or(QueueAction::Submit);
        let status = status_after_success(action, outcome.verify_status);
        citesync_db::record_submission_success(
            pool,
            submission.id,
            status.as_str(),
            outcome.external_id.as_deref(),
            outcome.external_url.as_deref(),
        )
        .await?;
        citesync_db::complete_queue_item(pool, item.id, true).await?;

        if let Some(batch_id) = item.batch_id {
            citesync_db::record_batch_item_success(pool, batch_id).await?;
            citesync_db::finalize_batch(pool, batch_id).await?;
        }
        Ok(ItemResult::Succeeded)
    } else {
        let message = outcome
            .error
            .unwrap_or_else(|| "provider call failed".to_string());
        tracing::warn!(
            queue_item = item.id,
            provider = %submission.provider_slug,
            attempts = attempts_now,
            max_attempts = item.max_attempts,
            error = %message,
            "queue item failed"
        );
        citesync_db::record_submission_error(pool, submission.id, &message).await?;
        citesync_db::release_queue_item_for_retry(pool, item.id, &message).await?;

        if attempts_now >= item.max_attempts {
            if let Some(batch_id) = item.batch_id {
                citesync_db::record_batch_item_failure(pool, batch_id).await?;
                citesync_db::finalize_batch(pool, batch_id).await?;
            }
        }
        Ok(ItemResult::Failed)
    }
}

/// Dispatches one queue item to its adapter and normalizes whatever comes
/// back. Adapter `Err`s (unexpected conditions like malformed JSON) are
/// folded into a failure outcome here, which is what turns them into the
/// submission `error` state upstream.
async fn run_action(
    pool: &PgPool,
    registry: &ProviderRegistry,
    item: &QueueItemRow,
    submission: &SubmissionRow,
) -> ActionOutcome {
    let Some(adapter) = registry.get(&submission.provider_slug) else {
        return ActionOutcome {
            success: false,
            error: Some(format!(
                "no adapter registered for provider '{}'",
                submission.provider_slug
            )),
            ..ActionOutcome::default()
        };
    };

    let Some(action) = QueueAction::parse(&item.action) else {
        return ActionOutcome {
            success: false,
            error: Some(format!("unknown queue action '{}'", item.action)),
            ..ActionOutcome::default()
        };
    };

    let result: Result<ActionOutcome, EngineError> = async {
        match action {
            QueueAction::Submit => {
                let location = load_location(pool, submission.domain_id).await?;
                Ok(adapter.submit(&location).await?.into())
            }
            QueueAction::Update => {
                let Some(external_id) = submission.external_id.as_deref() else {
                    return Ok(missing_external_id());
                };
                let location = load_location(pool, submission.domain_id).await?;
                Ok(adapter.update(external_id, &location).await?.into())
            }
            QueueAction::Verify => {
                let Some(external_id) = submission.external_id.as_deref() else {
                    return Ok(missing_external_id());
                };
                Ok(adapter.verify(external_id).await?.into())
            }
            QueueAction::Delete => {
                let Some(external_id) = submission.external_id.as_deref() else {
                    return Ok(missing_external_id());
                };
                Ok(adapter.delete(external_id).await?.into())
            }
        }
    }
    .await;

    result.unwrap_or_else(|e| ActionOutcome {
        success: false,
        error: Some(e.to_string()),
        ..ActionOutcome::default()
    })
}

fn missing_external_id() -> ActionOutcome {
    ActionOutcome {
        success: false,
        error: Some("submission has no external id for this action".to_string()),
        ..ActionOutcome::default()
    }
}

async fn load_location(pool: &PgPool, domain_id: i64) -> Result<NormalizedLocation, EngineError> {
    let profile = citesync_db::get_brand_profile(pool, domain_id)
        .await?
        .ok_or_else(|| EngineError::ProfileNotFound {
            host: format!("domain #{domain_id}"),
        })?;
    Ok(profile.to_location())
}

async fn load_domain_location(
    pool: &PgPool,
    host: &str,
) -> Result<(citesync_db::DomainRow, NormalizedLocation), EngineError> {
    let domain = citesync_db::get_domain_by_host(pool, host)
        .await?
        .ok_or_else(|| EngineError::DomainNotFound {
            host: host.to_string(),
        })?;
    let profile = citesync_db::get_brand_profile(pool, domain.id)
        .await?
        .ok_or_else(|| EngineError::ProfileNotFound {
            host: host.to_string(),
        })?;
    let location = profile.to_location();
    Ok((domain, location))
}
