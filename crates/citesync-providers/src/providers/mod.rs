//! Concrete directory adapters.

mod bing;
mod foursquare;
mod google;
mod localpages;
mod yext;

pub use bing::BingPlacesAdapter;
pub use foursquare::FoursquareAdapter;
pub use google::{GoogleBusinessAdapter, GoogleCredentials};
pub use localpages::LocalPagesAdapter;
pub use yext::YextAdapter;

use crate::error::AdapterError;
use crate::outcome::{DeleteOutcome, SubmitOutcome, UpdateOutcome, VerifyOutcome};

/// Only malformed responses count as unexpected; everything else is an
/// expected failure mode that becomes an unsuccessful outcome value.
fn is_unexpected(err: &AdapterError) -> bool {
    matches!(err, AdapterError::Deserialize { .. })
}

/// Converts expected errors on the submit path into failure outcomes.
pub(crate) fn submit_result(
    result: Result<SubmitOutcome, AdapterError>,
) -> Result<SubmitOutcome, AdapterError> {
    match result {
        Err(err) if !is_unexpected(&err) => Ok(SubmitOutcome::failed(err.to_string())),
        other => other,
    }
}

/// Converts expected errors on the update path into failure outcomes.
pub(crate) fn update_result(
    result: Result<UpdateOutcome, AdapterError>,
) -> Result<UpdateOutcome, AdapterError> {
    match result {
        Err(err) if !is_unexpected(&err) => Ok(UpdateOutcome::failed(err.to_string())),
        other => other,
    }
}

/// Converts expected errors on the verify path into verify outcomes.
/// A provider 404 maps to the `not_found` success shape; other expected
/// errors map to the `error` status.
pub(crate) fn verify_result(
    result: Result<VerifyOutcome, AdapterError>,
) -> Result<VerifyOutcome, AdapterError> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(AdapterError::NotFound { .. }) => Ok(VerifyOutcome::not_found()),
        Err(err) if is_unexpected(&err) => Err(err),
        Err(err) => Ok(VerifyOutcome::error(err.to_string())),
    }
}

/// Converts expected errors on the delete path into failure outcomes.
/// Deleting an already-absent listing counts as success.
pub(crate) fn delete_result(
    result: Result<DeleteOutcome, AdapterError>,
) -> Result<DeleteOutcome, AdapterError> {
    match result {
        Ok(outcome) => Ok(outcome),
        Err(AdapterError::NotFound { .. }) => Ok(DeleteOutcome {
            success: true,
            message: Some("listing was already absent".to_string()),
            error: None,
        }),
        Err(err) if is_unexpected(&err) => Err(err),
        Err(err) => Ok(DeleteOutcome::failed(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citesync_core::VerifyStatus;

    #[test]
    fn expected_submit_error_becomes_failure_outcome() {
        let result = submit_result(Err(AdapterError::UnexpectedStatus {
            status: 500,
            url: "https://api.example.com".to_string(),
            body: "boom".to_string(),
        }));
        let outcome = result.expect("expected errors must not propagate");
        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap_or("").contains("500"));
    }

    #[test]
    fn deserialize_error_propagates_from_submit() {
        let src = serde_json::from_str::<()>("nope").unwrap_err();
        let result = submit_result(Err(AdapterError::Deserialize {
            context: "create".to_string(),
            source: src,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn verify_maps_not_found_to_success() {
        let result = verify_result(Err(AdapterError::NotFound {
            url: "https://api.example.com/places/x".to_string(),
        }));
        let outcome = result.expect("404 is a normal outcome");
        assert!(outcome.success);
        assert_eq!(outcome.status, VerifyStatus::NotFound);
    }

    #[test]
    fn verify_maps_transport_error_to_error_status() {
        let result = verify_result(Err(AdapterError::RateLimited {
            provider: "yext",
            retry_after_secs: 30,
        }));
        let outcome = result.expect("rate limit is an expected failure");
        assert!(!outcome.success);
        assert_eq!(outcome.status, VerifyStatus::Error);
    }

    #[test]
    fn delete_of_absent_listing_counts_as_success() {
        let result = delete_result(Err(AdapterError::NotFound {
            url: "https://api.example.com/places/x".to_string(),
        }));
        let outcome = result.expect("absent listing is fine");
        assert!(outcome.success);
    }
}
