//! Live integration tests for citesync-db against a real Postgres.
//!
//! Tests self-gate on `DATABASE_URL`: when it is unset they print a notice
//! and return, so the suite stays green on machines without a database.
//! Each test works on its own domain host so tests can share one database.

use citesync_core::ListingConfig;
use citesync_db::{
    cancel_batch, claim_queue_item, complete_queue_item, count_open_queue_items_for_batch,
    create_batch, fetch_due_queue_items, finalize_batch, get_batch, get_brand_profile,
    get_submission, insert_queue_item, record_batch_item_failure, record_batch_item_success,
    record_submission_error, record_submission_success, release_queue_item_for_retry,
    seed_providers, upsert_brand_profile, upsert_domain, upsert_queued_submission, DbError,
    ProviderSeed,
};

/// Hosts are unique per run so tests stay repeatable against a
/// persistent database.
fn unique_host(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock after epoch")
        .as_nanos();
    format!("{prefix}-{nanos}.example.com")
}

async fn test_pool() -> Option<sqlx::PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set — skipping live db test");
        return None;
    };
    let pool = citesync_db::connect_pool(&url, citesync_db::PoolConfig::default())
        .await
        .expect("connect to test database");
    citesync_db::run_migrations(&pool)
        .await
        .expect("run migrations");
    Some(pool)
}

async fn seed_test_provider(pool: &sqlx::PgPool, slug: &str) {
    seed_providers(
        pool,
        &[ProviderSeed {
            slug: slug.to_string(),
            display_name: format!("Test {slug}"),
            tier: 1,
            auth_method: "api_key".to_string(),
            rate_per_minute: Some(60),
            rate_per_day: None,
            enabled: true,
        }],
    )
    .await
    .expect("seed provider");
}

#[tokio::test]
async fn submission_upsert_is_unique_per_domain_provider_pair() {
    let Some(pool) = test_pool().await else { return };

    let domain = upsert_domain(&pool, &unique_host("live-upsert"), "hostinger", true)
        .await
        .expect("upsert domain");
    seed_test_provider(&pool, "live-upsert-provider").await;

    let first = upsert_queued_submission(&pool, domain.id, "live-upsert-provider", "hash-a")
        .await
        .expect("first upsert");
    let second = upsert_queued_submission(&pool, domain.id, "live-upsert-provider", "hash-b")
        .await
        .expect("second upsert");

    assert_eq!(first.id, second.id, "re-queuing must not create a new row");
    assert_eq!(second.last_hash.as_deref(), Some("hash-b"));
    assert_eq!(second.status, "queued");

    let fetched = get_submission(&pool, domain.id, "live-upsert-provider")
        .await
        .expect("get submission")
        .expect("submission exists");
    assert_eq!(fetched.id, first.id);
}

#[tokio::test]
async fn queue_claim_is_atomic_and_counts_attempts() {
    let Some(pool) = test_pool().await else { return };

    let domain = upsert_domain(&pool, &unique_host("live-claim"), "godaddy", true)
        .await
        .expect("upsert domain");
    seed_test_provider(&pool, "live-claim-provider").await;
    let submission = upsert_queued_submission(&pool, domain.id, "live-claim-provider", "h")
        .await
        .expect("upsert submission");

    let item = insert_queue_item(&pool, submission.id, "submit", 0, 3, None, None)
        .await
        .expect("insert item");

    assert!(claim_queue_item(&pool, item.id).await.expect("first claim"));
    assert!(
        !claim_queue_item(&pool, item.id).await.expect("second claim"),
        "a claimed item must not be claimable again"
    );

    // Release for retry: eligible again, attempt stays counted.
    release_queue_item_for_retry(&pool, item.id, "connection reset")
        .await
        .expect("release");
    let refreshed = citesync_db::get_queue_item(&pool, item.id)
        .await
        .expect("get item");
    assert_eq!(refreshed.attempts, 1);
    assert!(refreshed.started_at.is_none());
    assert_eq!(refreshed.last_error.as_deref(), Some("connection reset"));
}

#[tokio::test]
async fn due_items_drain_by_priority_then_schedule() {
    let Some(pool) = test_pool().await else { return };

    let domain = upsert_domain(&pool, &unique_host("live-order"), "namecheap", true)
        .await
        .expect("upsert domain");
    seed_test_provider(&pool, "live-order-provider").await;
    let submission = upsert_queued_submission(&pool, domain.id, "live-order-provider", "h")
        .await
        .expect("upsert submission");

    let early = chrono::Utc::now() - chrono::Duration::minutes(10);
    let late = chrono::Utc::now() - chrono::Duration::minutes(1);

    let low = insert_queue_item(&pool, submission.id, "verify", 0, 3, Some(late), None)
        .await
        .expect("low");
    let high_late = insert_queue_item(&pool, submission.id, "submit", 5, 3, Some(late), None)
        .await
        .expect("high late");
    let high_early = insert_queue_item(&pool, submission.id, "update", 5, 3, Some(early), None)
        .await
        .expect("high early");

    let due = fetch_due_queue_items(&pool, 500).await.expect("fetch due");
    let ids: Vec<i64> = due
        .iter()
        .map(|i| i.id)
        .filter(|id| [low.id, high_late.id, high_early.id].contains(id))
        .collect();

    assert_eq!(
        ids,
        vec![high_early.id, high_late.id, low.id],
        "priority desc, then scheduled_at asc"
    );

    // Exhausted items disappear from the due set.
    for _ in 0..3 {
        assert!(claim_queue_item(&pool, high_early.id).await.expect("claim"));
        release_queue_item_for_retry(&pool, high_early.id, "boom")
            .await
            .expect("release");
    }
    let due = fetch_due_queue_items(&pool, 500).await.expect("fetch due");
    assert!(
        due.iter().all(|i| i.id != high_early.id),
        "attempts == max_attempts must exclude the item"
    );
}

#[tokio::test]
async fn batch_finalizes_completed_when_any_item_succeeded() {
    let Some(pool) = test_pool().await else { return };

    let domain = upsert_domain(&pool, &unique_host("live-batch"), "hostinger", true)
        .await
        .expect("upsert domain");
    seed_test_provider(&pool, "live-batch-provider").await;
    let submission = upsert_queued_submission(&pool, domain.id, "live-batch-provider", "h")
        .await
        .expect("upsert submission");

    let batch = create_batch(&pool, "live finalize test").await.expect("create batch");
    citesync_db::increment_batch_total(&pool, batch.id, 2)
        .await
        .expect("bump total");

    let a = insert_queue_item(&pool, submission.id, "submit", 0, 1, None, Some(batch.id))
        .await
        .expect("item a");
    let b = insert_queue_item(&pool, submission.id, "verify", 0, 1, None, Some(batch.id))
        .await
        .expect("item b");

    // Two open items: not finalizable yet.
    assert!(!finalize_batch(&pool, batch.id).await.expect("premature finalize"));

    assert!(claim_queue_item(&pool, a.id).await.expect("claim a"));
    complete_queue_item(&pool, a.id, true).await.expect("complete a");
    record_batch_item_success(&pool, batch.id).await.expect("count a");

    assert!(claim_queue_item(&pool, b.id).await.expect("claim b"));
    release_queue_item_for_retry(&pool, b.id, "provider 500")
        .await
        .expect("release b");
    // b had max_attempts = 1, so it is now exhausted and terminal.
    record_batch_item_failure(&pool, batch.id).await.expect("count b");

    assert_eq!(
        count_open_queue_items_for_batch(&pool, batch.id)
            .await
            .expect("count open"),
        0
    );
    assert!(finalize_batch(&pool, batch.id).await.expect("finalize"));

    let finished = get_batch(&pool, batch.id).await.expect("get batch");
    assert_eq!(finished.status, "completed", "one success => completed");
    assert_eq!(finished.completed_count, 1);
    assert_eq!(finished.failed_count, 1);
    assert!(finished.completed_at.is_some());
}

#[tokio::test]
async fn cancelling_a_batch_abandons_its_open_items() {
    let Some(pool) = test_pool().await else { return };

    let domain = upsert_domain(&pool, &unique_host("live-cancel"), "namecheap", true)
        .await
        .expect("upsert domain");
    seed_test_provider(&pool, "live-cancel-provider").await;
    let submission = upsert_queued_submission(&pool, domain.id, "live-cancel-provider", "h")
        .await
        .expect("upsert submission");

    let batch = create_batch(&pool, "live cancel test").await.expect("create batch");
    citesync_db::increment_batch_total(&pool, batch.id, 1)
        .await
        .expect("bump total");
    let item = insert_queue_item(&pool, submission.id, "submit", 0, 3, None, Some(batch.id))
        .await
        .expect("insert item");

    cancel_batch(&pool, batch.id).await.expect("cancel");

    let cancelled = get_batch(&pool, batch.id).await.expect("get batch");
    assert_eq!(cancelled.status, "cancelled");
    assert!(cancelled.completed_at.is_some());

    let abandoned = citesync_db::get_queue_item(&pool, item.id)
        .await
        .expect("get item");
    assert!(abandoned.completed_at.is_some(), "open items are abandoned");
    assert_eq!(abandoned.succeeded, Some(false));
    assert_eq!(abandoned.last_error.as_deref(), Some("batch cancelled"));

    // A finished batch cannot be cancelled again.
    let again = cancel_batch(&pool, batch.id).await;
    assert!(matches!(
        again,
        Err(DbError::InvalidBatchTransition { .. })
    ));
}

#[tokio::test]
async fn submission_result_updates_round_trip() {
    let Some(pool) = test_pool().await else { return };

    let domain = upsert_domain(&pool, &unique_host("live-result"), "godaddy", true)
        .await
        .expect("upsert domain");
    seed_test_provider(&pool, "live-result-provider").await;
    let submission = upsert_queued_submission(&pool, domain.id, "live-result-provider", "h")
        .await
        .expect("upsert submission");

    record_submission_error(&pool, submission.id, "429 too many requests")
        .await
        .expect("record error");
    let errored = get_submission(&pool, domain.id, "live-result-provider")
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(errored.status, "error");
    assert_eq!(errored.error_count, 1);
    assert!(errored.last_error_at.is_some());

    record_submission_success(
        &pool,
        submission.id,
        "submitted",
        Some("ext-123"),
        Some("https://provider.example/biz/ext-123"),
    )
    .await
    .expect("record success");

    let ok = get_submission(&pool, domain.id, "live-result-provider")
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(ok.status, "submitted");
    assert_eq!(ok.external_id.as_deref(), Some("ext-123"));
    assert!(ok.error_message.is_none(), "success clears the error text");
    assert_eq!(ok.error_count, 1, "error history is preserved");

    // A later success without ids keeps the stored ones.
    record_submission_success(&pool, submission.id, "verified", None, None)
        .await
        .expect("record verify");
    let verified = get_submission(&pool, domain.id, "live-result-provider")
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(verified.status, "verified");
    assert_eq!(verified.external_id.as_deref(), Some("ext-123"));
    assert!(verified.last_verified_at.is_some());
}

#[tokio::test]
async fn brand_profile_round_trips_to_location() {
    let Some(pool) = test_pool().await else { return };

    let domain = upsert_domain(&pool, &unique_host("live-profile"), "hostinger", true)
        .await
        .expect("upsert domain");

    let listing = test_listing();

    upsert_brand_profile(&pool, domain.id, &listing)
        .await
        .expect("upsert profile");

    let profile = get_brand_profile(&pool, domain.id)
        .await
        .expect("get profile")
        .expect("profile exists");
    let location = profile.to_location();

    assert_eq!(location.business_name, "Joe's Pizza");
    assert_eq!(location.categories, vec!["Pizza", "Italian"]);
    assert_eq!(location.hours.len(), 1);
    assert!(location.missing_required_fields().is_empty());
}

fn test_listing() -> ListingConfig {
    ListingConfig {
        business_name: "Joe's Pizza".to_string(),
        street: Some("12 Main St".to_string()),
        city: Some("Springfield".to_string()),
        state: Some("IL".to_string()),
        zip: Some("62701".to_string()),
        country: Some("US".to_string()),
        phone: Some("2175551234".to_string()),
        categories: vec!["Pizza".to_string(), "Italian".to_string()],
        hours: {
            let mut h = std::collections::BTreeMap::new();
            h.insert(
                citesync_core::Weekday::Monday,
                citesync_core::DayHours {
                    open: "11:00".to_string(),
                    close: "22:00".to_string(),
                },
            );
            h
        },
        ..ListingConfig::default()
    }
}
