//! The uniform capability contract every directory adapter implements.

use async_trait::async_trait;
use citesync_core::NormalizedLocation;

use crate::catalog::ProviderDescriptor;
use crate::error::AdapterError;
use crate::outcome::{DeleteOutcome, SubmitOutcome, UpdateOutcome, VerifyOutcome};

/// Transport settings shared by every adapter's HTTP client.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "citesync/0.1 (citation-submission)".to_string(),
            max_retries: 2,
            backoff_base_ms: 1_000,
        }
    }
}

impl HttpSettings {
    #[must_use]
    pub fn from_app_config(config: &citesync_core::AppConfig) -> Self {
        Self {
            timeout_secs: config.provider_request_timeout_secs,
            user_agent: config.provider_user_agent.clone(),
            max_retries: config.provider_max_retries,
            backoff_base_ms: config.provider_retry_backoff_base_ms,
        }
    }
}

/// One directory behind the uniform submit/update/verify/delete contract.
///
/// Implementations are stateless with respect to submissions and queue
/// rows; the only in-memory state permitted is cached auth material
/// (OAuth2 tokens, resolved API keys). Expected failures come back as
/// outcome values; an `Err` means an unexpected condition such as a
/// response body that does not parse, and is converted to the submission
/// `error` state by the caller.
#[async_trait]
pub trait CitationAdapter: Send + Sync {
    /// Static catalog descriptor for this directory.
    fn descriptor(&self) -> &'static ProviderDescriptor;

    /// Whether all required credentials are present. Pure in-memory check,
    /// never a network call.
    fn is_configured(&self) -> bool;

    /// Create the listing, after central required-field validation and
    /// provider-side duplicate detection where the API supports it.
    async fn submit(&self, location: &NormalizedLocation) -> Result<SubmitOutcome, AdapterError>;

    /// Update the listing identified by `external_id`.
    async fn update(
        &self,
        external_id: &str,
        location: &NormalizedLocation,
    ) -> Result<UpdateOutcome, AdapterError>;

    /// Probe the current state of the listing identified by `external_id`.
    async fn verify(&self, external_id: &str) -> Result<VerifyOutcome, AdapterError>;

    /// Remove the listing. The default covers providers with no deletion
    /// endpoint: an unsuccessful outcome with an explanatory message,
    /// never an error.
    async fn delete(&self, _external_id: &str) -> Result<DeleteOutcome, AdapterError> {
        Ok(DeleteOutcome::unsupported(self.descriptor().display_name))
    }
}

/// Shared pre-flight guard for submit paths: returns the validation-failure
/// outcome when required fields are missing, so no adapter performs a
/// network call for an unsubmittable listing.
#[must_use]
pub fn validation_failure(location: &NormalizedLocation) -> Option<SubmitOutcome> {
    let missing = location.missing_required_fields();
    if missing.is_empty() {
        None
    } else {
        Some(SubmitOutcome::invalid(&missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_location() -> NormalizedLocation {
        NormalizedLocation {
            business_name: "Joe's Pizza".to_string(),
            street: "12 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip: "62701".to_string(),
            country: "US".to_string(),
            ..NormalizedLocation::default()
        }
    }

    #[test]
    fn validation_failure_passes_complete_locations() {
        assert!(validation_failure(&complete_location()).is_none());
    }

    #[test]
    fn validation_failure_reports_missing_fields() {
        let mut location = complete_location();
        location.state = String::new();
        let outcome = validation_failure(&location).expect("must fail validation");
        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap_or("").contains("state"));
    }
}
