//! Shared HTTP plumbing for adapters: client construction and uniform
//! response-to-error mapping.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::adapter::HttpSettings;
use crate::error::AdapterError;

pub(crate) fn build_client(settings: &HttpSettings) -> Result<Client, AdapterError> {
    Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(settings.user_agent.clone())
        .build()
        .map_err(AdapterError::from)
}

/// Maps a response to its JSON body with provider-uniform status handling:
/// 404 becomes [`AdapterError::NotFound`], 429 becomes
/// [`AdapterError::RateLimited`] honoring `Retry-After`, any other non-2xx
/// becomes [`AdapterError::UnexpectedStatus`] carrying a truncated body.
pub(crate) async fn json_body(
    provider: &'static str,
    response: Response,
) -> Result<serde_json::Value, AdapterError> {
    let url = response.url().to_string();
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(AdapterError::NotFound { url });
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(AdapterError::RateLimited {
            provider,
            retry_after_secs: retry_after_secs(&response),
        });
    }

    let body = response.text().await?;
    if !status.is_success() {
        return Err(AdapterError::UnexpectedStatus {
            status: status.as_u16(),
            url,
            body: truncate(&body, 300),
        });
    }

    serde_json::from_str(&body).map_err(|e| AdapterError::Deserialize {
        context: url,
        source: e,
    })
}

/// Like [`json_body`] but for endpoints that answer with HTML or plain text
/// (the portal-form fallback).
pub(crate) async fn text_body(
    provider: &'static str,
    response: Response,
) -> Result<String, AdapterError> {
    let url = response.url().to_string();
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(AdapterError::NotFound { url });
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(AdapterError::RateLimited {
            provider,
            retry_after_secs: retry_after_secs(&response),
        });
    }

    let body = response.text().await?;
    if !status.is_success() {
        return Err(AdapterError::UnexpectedStatus {
            status: status.as_u16(),
            url,
            body: truncate(&body, 300),
        });
    }

    Ok(body)
}

/// For endpoints that return no meaningful body (DELETE): asserts 2xx with
/// the same status mapping as [`json_body`].
pub(crate) async fn no_content(
    provider: &'static str,
    response: Response,
) -> Result<(), AdapterError> {
    let url = response.url().to_string();
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(AdapterError::NotFound { url });
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(AdapterError::RateLimited {
            provider,
            retry_after_secs: retry_after_secs(&response),
        });
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AdapterError::UnexpectedStatus {
            status: status.as_u16(),
            url,
            body: truncate(&body, 300),
        });
    }

    Ok(())
}

fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(60)
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_keeps_short_strings_intact() {
        assert_eq!(truncate("short", 300), "short");
    }

    #[test]
    fn truncate_clips_long_strings() {
        let long = "x".repeat(400);
        let clipped = truncate(&long, 300);
        assert_eq!(clipped.chars().count(), 301);
        assert!(clipped.ends_with('…'));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "é".repeat(200);
        let clipped = truncate(&s, 301);
        assert!(clipped.ends_with('…'));
    }
}
