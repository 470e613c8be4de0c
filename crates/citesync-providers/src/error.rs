use thiserror::Error;

/// Errors surfaced by provider adapters.
///
/// Expected failure modes (rejections, rate limiting, transient transport
/// trouble) are converted into unsuccessful outcome values at the adapter
/// boundary; an `AdapterError` escaping a trait method means something
/// genuinely unexpected, like a response body that does not parse.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {provider} (retry after {retry_after_secs}s)")]
    RateLimited {
        provider: &'static str,
        retry_after_secs: u64,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("{provider} API error: {message}")]
    Api {
        provider: &'static str,
        message: String,
    },

    #[error("authentication with {provider} failed: {reason}")]
    Auth {
        provider: &'static str,
        reason: String,
    },
}
