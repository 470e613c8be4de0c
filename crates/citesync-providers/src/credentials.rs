//! Credential resolution: env/config first, then an optional external
//! store consulted through a short-TTL cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

/// External secret backend (vault, SSM, and the like). Consulted only for
/// keys the environment does not provide.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch a secret by key, `None` when the store has no value for it.
    async fn fetch(&self, key: &str) -> Option<String>;
}

struct CachedValue {
    value: Option<String>,
    fetched_at: Instant,
}

/// Env-first credential resolver with a TTL cache in front of the external
/// store, so repeated configuration checks do not hammer the backend.
pub struct CredentialResolver {
    env_prefix: String,
    store: Option<Arc<dyn CredentialStore>>,
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedValue>>,
}

impl CredentialResolver {
    /// Resolver that only consults `<prefix>_<KEY>` environment variables.
    #[must_use]
    pub fn env_only(env_prefix: &str) -> Self {
        Self {
            env_prefix: env_prefix.to_string(),
            store: None,
            ttl: Duration::ZERO,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolver backed by an external store for keys absent from the
    /// environment. `ttl` bounds how long fetched values are reused.
    #[must_use]
    pub fn with_store(env_prefix: &str, store: Arc<dyn CredentialStore>, ttl: Duration) -> Self {
        Self {
            env_prefix: env_prefix.to_string(),
            store: Some(store),
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a credential by bare key (e.g. `GOOGLE_CLIENT_ID`).
    ///
    /// Environment wins; the store is only asked when the env var is unset,
    /// and its answers (including negative ones) are cached for the TTL.
    pub async fn resolve(&self, key: &str) -> Option<String> {
        let env_key = format!("{}_{}", self.env_prefix, key);
        if let Ok(value) = std::env::var(&env_key) {
            if !value.is_empty() {
                return Some(value);
            }
        }

        let store = self.store.as_ref()?;

        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(key) {
            if cached.fetched_at.elapsed() < self.ttl {
                return cached.value.clone();
            }
        }

        let value = store.fetch(key).await;
        cache.insert(
            key.to_string(),
            CachedValue {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingStore {
        calls: AtomicU32,
        value: Option<String>,
    }

    #[async_trait]
    impl CredentialStore for CountingStore {
        async fn fetch(&self, _key: &str) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.value.clone()
        }
    }

    #[tokio::test]
    async fn env_only_resolver_returns_none_without_store() {
        let resolver = CredentialResolver::env_only("CITESYNC_TEST_NO_SUCH_PREFIX");
        assert_eq!(resolver.resolve("MISSING_KEY").await, None);
    }

    #[tokio::test]
    async fn store_values_are_cached_within_ttl() {
        let store = Arc::new(CountingStore {
            calls: AtomicU32::new(0),
            value: Some("secret".to_string()),
        });
        let resolver = CredentialResolver::with_store(
            "CITESYNC_TEST_NO_SUCH_PREFIX",
            Arc::clone(&store) as Arc<dyn CredentialStore>,
            Duration::from_secs(300),
        );

        assert_eq!(resolver.resolve("API_KEY").await.as_deref(), Some("secret"));
        assert_eq!(resolver.resolve("API_KEY").await.as_deref(), Some("secret"));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1, "second hit is cached");
    }

    #[tokio::test]
    async fn zero_ttl_refetches_every_time() {
        let store = Arc::new(CountingStore {
            calls: AtomicU32::new(0),
            value: Some("secret".to_string()),
        });
        let resolver = CredentialResolver::with_store(
            "CITESYNC_TEST_NO_SUCH_PREFIX",
            Arc::clone(&store) as Arc<dyn CredentialStore>,
            Duration::ZERO,
        );

        resolver.resolve("API_KEY").await;
        resolver.resolve("API_KEY").await;
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn negative_answers_are_cached_too() {
        let store = Arc::new(CountingStore {
            calls: AtomicU32::new(0),
            value: None,
        });
        let resolver = CredentialResolver::with_store(
            "CITESYNC_TEST_NO_SUCH_PREFIX",
            Arc::clone(&store) as Arc<dyn CredentialStore>,
            Duration::from_secs(300),
        );

        assert_eq!(resolver.resolve("API_KEY").await, None);
        assert_eq!(resolver.resolve("API_KEY").await, None);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }
}
