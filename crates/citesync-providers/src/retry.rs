//! Retry with exponential back-off and jitter for adapter transport calls.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (network failures, 429, 5xx). Everything else — 4xx,
//! missing endpoints, deserialization failures — is returned immediately;
//! retrying would produce the same answer.

use std::future::Future;
use std::time::Duration;

use crate::error::AdapterError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection reset.
/// - HTTP 429: the provider asked us to back off.
/// - HTTP 5xx: transient server/infrastructure errors.
///
/// **Not retriable:**
/// - [`AdapterError::NotFound`] — retrying returns the same 404.
/// - [`AdapterError::UnexpectedStatus`] below 500 — application-level rejection.
/// - [`AdapterError::Deserialize`] — malformed response; retrying won't fix it.
/// - [`AdapterError::Auth`] — bad credentials need operator action.
pub(crate) fn is_retriable(err: &AdapterError) -> bool {
    match err {
        AdapterError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        AdapterError::RateLimited { .. } => true,
        AdapterError::UnexpectedStatus { status, .. } => *status >= 500,
        AdapterError::NotFound { .. }
        | AdapterError::Deserialize { .. }
        | AdapterError::Api { .. }
        | AdapterError::Auth { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors.
///
/// Back-off is `backoff_base_ms * 2^(attempt-1)` capped at 60 s, with
/// ±25 % jitter so a fleet of failing calls does not re-converge on the
/// provider in lockstep.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient provider error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn deserialize_err() -> AdapterError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        AdapterError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    #[test]
    fn rate_limited_is_retriable() {
        assert!(is_retriable(&AdapterError::RateLimited {
            provider: "foursquare",
            retry_after_secs: 30,
        }));
    }

    #[test]
    fn server_error_status_is_retriable() {
        assert!(is_retriable(&AdapterError::UnexpectedStatus {
            status: 503,
            url: "https://api.example.com/places".to_owned(),
            body: "upstream unavailable".to_owned(),
        }));
    }

    #[test]
    fn client_error_status_is_not_retriable() {
        assert!(!is_retriable(&AdapterError::UnexpectedStatus {
            status: 403,
            url: "https://api.example.com/places".to_owned(),
            body: "forbidden".to_owned(),
        }));
    }

    #[test]
    fn not_found_is_not_retriable() {
        assert!(!is_retriable(&AdapterError::NotFound {
            url: "https://api.example.com/places/x".to_owned(),
        }));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        assert!(!is_retriable(&deserialize_err()));
    }

    #[test]
    fn auth_error_is_not_retriable() {
        assert!(!is_retriable(&AdapterError::Auth {
            provider: "google-business",
            reason: "invalid_grant".to_owned(),
        }));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, AdapterError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_on_rate_limited_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(AdapterError::RateLimited {
                        provider: "yext",
                        retry_after_secs: 0,
                    })
                } else {
                    Ok::<u32, AdapterError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, AdapterError>(AdapterError::RateLimited {
                    provider: "yext",
                    retry_after_secs: 0,
                })
            }
        })
        .await;
        // max_retries=2 → 3 total attempts
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(AdapterError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_non_retriable_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, AdapterError>(AdapterError::NotFound {
                    url: "https://api.example.com/places/x".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(AdapterError::NotFound { .. })));
    }
}
