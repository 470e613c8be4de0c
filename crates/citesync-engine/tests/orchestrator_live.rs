//! End-to-end orchestrator test against a real Postgres, with scripted
//! in-memory adapters standing in for the directories.
//!
//! The test self-gates on `DATABASE_URL`: when it is unset it prints a
//! notice and returns. Because a drain cycle picks up whatever is due in
//! the whole queue, the scenarios run sequentially inside one test function
//! rather than as parallel tests racing each other's drains.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use citesync_core::{ListingConfig, NormalizedLocation, QueueAction};
use citesync_engine::{drain, queue_domain, queue_verification, QueueOptions};
use citesync_providers::{
    descriptor_for, AdapterError, CitationAdapter, DeleteOutcome, ProviderRegistry, SubmitOutcome,
    UpdateOutcome, VerifyOutcome,
};

// ---------------------------------------------------------------------------
// Scripted adapter
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Script {
    Succeed,
    Fail,
}

struct ScriptedAdapter {
    slug: &'static str,
    script: Script,
    submit_calls: AtomicU32,
    update_calls: AtomicU32,
}

impl ScriptedAdapter {
    fn new(slug: &'static str, script: Script) -> Arc<Self> {
        Arc::new(Self {
            slug,
            script,
            submit_calls: AtomicU32::new(0),
            update_calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl CitationAdapter for ScriptedAdapter {
    fn descriptor(&self) -> &'static citesync_providers::ProviderDescriptor {
        descriptor_for(self.slug).expect("catalog slug")
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn submit(&self, _location: &NormalizedLocation) -> Result<SubmitOutcome, AdapterError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Succeed => Ok(SubmitOutcome::created(
                format!("{}-ext-1", self.slug),
                Some(format!("https://{}.example/biz/1", self.slug)),
            )),
            Script::Fail => Ok(SubmitOutcome::failed("scripted provider outage")),
        }
    }

    async fn update(
        &self,
        _external_id: &str,
        _location: &NormalizedLocation,
    ) -> Result<UpdateOutcome, AdapterError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Succeed => Ok(UpdateOutcome::ok()),
            Script::Fail => Ok(UpdateOutcome::failed("scripted provider outage")),
        }
    }

    async fn verify(&self, _external_id: &str) -> Result<VerifyOutcome, AdapterError> {
        match self.script {
            Script::Succeed => Ok(VerifyOutcome::verified(None, None)),
            Script::Fail => Ok(VerifyOutcome::error("scripted provider outage")),
        }
    }

    async fn delete(&self, _external_id: &str) -> Result<DeleteOutcome, AdapterError> {
        Ok(DeleteOutcome::ok())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Hosts are unique per run so the test stays repeatable against a
/// persistent database.
fn unique_host(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    format!("{prefix}-{nanos}.example.com")
}

fn listing() -> ListingConfig {
    ListingConfig {
        business_name: "Joe's Pizza".to_string(),
        street: Some("12 Main St".to_string()),
        city: Some("Springfield".to_string()),
        state: Some("IL".to_string()),
        zip: Some("62701".to_string()),
        country: Some("US".to_string()),
        phone: Some("2175551234".to_string()),
        ..ListingConfig::default()
    }
}

async fn seed_domain(pool: &sqlx::PgPool, host: &str) -> i64 {
    let domain = citesync_db::upsert_domain(pool, host, "godaddy", true)
        .await
        .expect("upsert domain");
    citesync_db::upsert_brand_profile(pool, domain.id, &listing())
        .await
        .expect("upsert profile");
    domain.id
}

fn opts_for(provider: &str, max_attempts: i32) -> QueueOptions {
    QueueOptions {
        priority: 0,
        max_attempts,
        batch_id: None,
        only_provider: Some(provider.to_string()),
    }
}

async fn open_items(pool: &sqlx::PgPool, domain_id: i64, slug: &str) -> Vec<(String, i32)> {
    sqlx::query_as::<_, (String, i32)>(
        "SELECT q.action, q.attempts FROM citation_queue q \
         JOIN citation_submissions s ON s.id = q.submission_id \
         WHERE s.domain_id = $1 AND s.provider_slug = $2 AND q.completed_at IS NULL",
    )
    .bind(domain_id)
    .bind(slug)
    .fetch_all(pool)
    .await
    .expect("query queue items")
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn orchestrator_end_to_end() {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set — skipping live orchestrator test");
        return;
    };
    let pool = citesync_db::connect_pool(&url, citesync_db::PoolConfig::default())
        .await
        .expect("connect to test database");
    citesync_db::run_migrations(&pool)
        .await
        .expect("run migrations");

    let seeds: Vec<citesync_db::ProviderSeed> = citesync_providers::CATALOG
        .iter()
        .map(|d| citesync_db::ProviderSeed {
            slug: d.slug.to_string(),
            display_name: d.display_name.to_string(),
            tier: i16::from(d.tier),
            auth_method: d.auth.as_str().to_string(),
            rate_per_minute: d.rate_per_minute.and_then(|v| i32::try_from(v).ok()),
            rate_per_day: d.rate_per_day.and_then(|v| i32::try_from(v).ok()),
            enabled: d.enabled_by_default,
        })
        .collect();
    citesync_db::seed_providers(&pool, &seeds)
        .await
        .expect("seed providers");

    fresh_domain_submit(&pool).await;
    idempotent_requeue(&pool).await;
    changed_description_update(&pool).await;
    retry_bound(&pool).await;
    mixed_batch(&pool).await;
}

async fn fresh_domain_submit(pool: &sqlx::PgPool) {
    let host = unique_host("e2e-fresh");
    let domain_id = seed_domain(pool, &host).await;

    let adapter = ScriptedAdapter::new("foursquare", Script::Succeed);
    let registry = ProviderRegistry::new(vec![adapter.clone()]);
    let opts = opts_for("foursquare", 3);

    let report = queue_domain(pool, &registry, &host, &opts)
        .await
        .expect("queue");
    assert_eq!(
        report.queued,
        vec![("foursquare".to_string(), QueueAction::Submit)],
        "a fresh pair gets exactly one submit item"
    );

    let drained = drain(pool, &registry, 50).await.expect("drain");
    assert!(drained.succeeded >= 1);
    assert_eq!(adapter.submit_calls.load(Ordering::SeqCst), 1);

    let submission = citesync_db::get_submission(pool, domain_id, "foursquare")
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(submission.status, "submitted");
    assert_eq!(submission.external_id.as_deref(), Some("foursquare-ext-1"));
    assert!(open_items(pool, domain_id, "foursquare").await.is_empty());
}

async fn idempotent_requeue(pool: &sqlx::PgPool) {
    let host = unique_host("e2e-idempotent");
    let domain_id = seed_domain(pool, &host).await;

    let adapter = ScriptedAdapter::new("foursquare", Script::Succeed);
    let registry = ProviderRegistry::new(vec![adapter]);
    let opts = opts_for("foursquare", 3);

    queue_domain(pool, &registry, &host, &opts)
        .await
        .expect("queue");
    drain(pool, &registry, 50).await.expect("drain submit");

    // Verification pass promotes the pair to verified.
    queue_verification(pool, &registry, &host, &opts)
        .await
        .expect("queue verify");
    drain(pool, &registry, 50).await.expect("drain verify");

    let submission = citesync_db::get_submission(pool, domain_id, "foursquare")
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(submission.status, "verified");

    // Same listing again: the hash matches, nothing new may be queued.
    let report = queue_domain(pool, &registry, &host, &opts)
        .await
        .expect("re-queue");
    assert!(report.queued.is_empty(), "unchanged listing must be skipped");
    assert_eq!(report.skipped.len(), 1);
    assert!(open_items(pool, domain_id, "foursquare").await.is_empty());
}

async fn changed_description_update(pool: &sqlx::PgPool) {
    let host = unique_host("e2e-update");
    let domain_id = seed_domain(pool, &host).await;

    let adapter = ScriptedAdapter::new("foursquare", Script::Succeed);
    let registry = ProviderRegistry::new(vec![adapter.clone()]);
    let opts = opts_for("foursquare", 3);

    queue_domain(pool, &registry, &host, &opts)
        .await
        .expect("queue");
    drain(pool, &registry, 50).await.expect("drain");

    // Only the description changes; the external id already exists, so the
    // new work item must carry the update action even though the previous
    // submission succeeded.
    let mut changed = listing();
    changed.description = Some("Now with a wood-fired oven".to_string());
    citesync_db::upsert_brand_profile(pool, domain_id, &changed)
        .await
        .expect("update profile");

    let report = queue_domain(pool, &registry, &host, &opts)
        .await
        .expect("re-queue");
    assert_eq!(
        report.queued,
        vec![("foursquare".to_string(), QueueAction::Update)]
    );

    drain(pool, &registry, 50).await.expect("drain update");
    assert_eq!(adapter.update_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        adapter.submit_calls.load(Ordering::SeqCst),
        1,
        "no second create for an existing listing"
    );
}

async fn retry_bound(pool: &sqlx::PgPool) {
    let host = unique_host("e2e-retry");
    let domain_id = seed_domain(pool, &host).await;

    let adapter = ScriptedAdapter::new("foursquare", Script::Fail);
    let registry = ProviderRegistry::new(vec![adapter.clone()]);
    let opts = opts_for("foursquare", 2);

    queue_domain(pool, &registry, &host, &opts)
        .await
        .expect("queue");

    for _ in 0..4 {
        drain(pool, &registry, 50).await.expect("drain");
    }

    assert_eq!(
        adapter.submit_calls.load(Ordering::SeqCst),
        2,
        "attempts are bounded by max_attempts"
    );

    let submission = citesync_db::get_submission(pool, domain_id, "foursquare")
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(submission.status, "error");
    assert_eq!(submission.error_count, 2);
    assert!(submission
        .error_message
        .as_deref()
        .unwrap_or("")
        .contains("outage"));
}

async fn mixed_batch(pool: &sqlx::PgPool) {
    let ok_host = unique_host("e2e-batch-ok");
    let ok_host_two = unique_host("e2e-batch-ok2");
    let bad_host = unique_host("e2e-batch-bad");
    seed_domain(pool, &ok_host).await;
    seed_domain(pool, &ok_host_two).await;
    seed_domain(pool, &bad_host).await;

    // yext succeeds, bing-places always fails; both are scripted here, the
    // real adapters never run in this test.
    let good = ScriptedAdapter::new("yext", Script::Succeed);
    let bad = ScriptedAdapter::new("bing-places", Script::Fail);
    let registry = ProviderRegistry::new(vec![good, bad]);

    let batch = citesync_db::create_batch(pool, "e2e mixed batch")
        .await
        .expect("create batch");

    let mut ok_opts = opts_for("yext", 1);
    ok_opts.batch_id = Some(batch.id);
    queue_domain(pool, &registry, &ok_host, &ok_opts)
        .await
        .expect("queue ok");
    queue_domain(pool, &registry, &ok_host_two, &ok_opts)
        .await
        .expect("queue ok2");

    let mut bad_opts = opts_for("bing-places", 1);
    bad_opts.batch_id = Some(batch.id);
    queue_domain(pool, &registry, &bad_host, &bad_opts)
        .await
        .expect("queue bad");

    drain(pool, &registry, 50).await.expect("drain");

    let finished = citesync_db::get_batch(pool, batch.id).await.expect("get batch");
    assert_eq!(finished.status, "completed", "any success => completed");
    assert_eq!(finished.total_count, 3);
    assert_eq!(finished.completed_count, 2);
    assert_eq!(finished.failed_count, 1);
    assert!(finished.completed_at.is_some());
}
