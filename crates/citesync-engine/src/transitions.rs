//! Pure decision logic for the submission state machine.
//!
//! Everything here is a function of plain values so the dedup and
//! transition rules can be tested without a database or a provider.

use citesync_core::{QueueAction, SubmissionStatus, VerifyStatus};
use citesync_providers::{DeleteOutcome, SubmitOutcome, UpdateOutcome, VerifyOutcome};

/// Whether a `(domain, provider)` pair should be (re-)queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueDecision {
    Enqueue,
    Skip(&'static str),
}

/// Decides whether fresh listing data warrants new work for a pair.
///
/// Queued when no submission exists yet, when the stored hash differs from
/// the freshly computed one, or when the pair sits in `error` (always
/// retryable). A matching hash on a non-error pair is skipped — the
/// idempotence guarantee that keeps unchanged listings from generating
/// duplicate work.
#[must_use]
pub fn enqueue_decision(
    existing: Option<(SubmissionStatus, Option<&str>)>,
    new_hash: &str,
) -> EnqueueDecision {
    let Some((status, stored_hash)) = existing else {
        return EnqueueDecision::Enqueue;
    };

    if stored_hash != Some(new_hash) {
        return EnqueueDecision::Enqueue;
    }

    if status == SubmissionStatus::Error {
        return EnqueueDecision::Enqueue;
    }

    EnqueueDecision::Skip("listing unchanged since last submission")
}

/// The action a new queue item carries: `submit` for pairs with no
/// provider-assigned id yet, `update` otherwise.
#[must_use]
pub fn action_for(external_id: Option<&str>) -> QueueAction {
    match external_id {
        Some(id) if !id.is_empty() => QueueAction::Update,
        _ => QueueAction::Submit,
    }
}

/// Status a submission lands in after a successful adapter call: `verified`
/// only when a verify action actually reported the listing verified,
/// `submitted` for every other success.
#[must_use]
pub fn status_after_success(
    action: QueueAction,
    verify_status: Option<VerifyStatus>,
) -> SubmissionStatus {
    if action == QueueAction::Verify && verify_status == Some(VerifyStatus::Verified) {
        SubmissionStatus::Verified
    } else {
        SubmissionStatus::Submitted
    }
}

/// Adapter outcomes normalized to what the drain cycle needs to persist.
#[derive(Debug, Clone, Default)]
pub struct ActionOutcome {
    pub success: bool,
    pub external_id: Option<String>,
    pub external_url: Option<String>,
    pub verify_status: Option<VerifyStatus>,
    pub error: Option<String>,
}

impl From<SubmitOutcome> for ActionOutcome {
    fn from(outcome: SubmitOutcome) -> Self {
        Self {
            success: outcome.success,
            external_id: outcome.external_id,
            external_url: outcome.external_url,
            verify_status: None,
            error: outcome.error,
        }
    }
}

impl From<UpdateOutcome> for ActionOutcome {
    fn from(outcome: UpdateOutcome) -> Self {
        Self {
            success: outcome.success,
            error: outcome.error,
            ..Self::default()
        }
    }
}

impl From<VerifyOutcome> for ActionOutcome {
    fn from(outcome: VerifyOutcome) -> Self {
        Self {
            success: outcome.success,
            external_id: None,
            external_url: outcome.external_url,
            verify_status: Some(outcome.status),
            error: if outcome.success {
                None
            } else {
                outcome.message
            },
        }
    }
}

impl From<DeleteOutcome> for ActionOutcome {
    fn from(outcome: DeleteOutcome) -> Self {
        Self {
            success: outcome.success,
            error: outcome.error.or(if outcome.success {
                None
            } else {
                outcome.message
            }),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "abcd1234abcd1234";
    const OTHER: &str = "ffff0000ffff0000";

    #[test]
    fn missing_submission_is_queued() {
        assert_eq!(enqueue_decision(None, HASH), EnqueueDecision::Enqueue);
    }

    #[test]
    fn verified_with_matching_hash_is_skipped() {
        let decision = enqueue_decision(Some((SubmissionStatus::Verified, Some(HASH))), HASH);
        assert!(matches!(decision, EnqueueDecision::Skip(_)));
    }

    #[test]
    fn verified_with_changed_hash_is_queued() {
        let decision = enqueue_decision(Some((SubmissionStatus::Verified, Some(HASH))), OTHER);
        assert_eq!(decision, EnqueueDecision::Enqueue);
    }

    #[test]
    fn error_status_is_always_retryable() {
        let decision = enqueue_decision(Some((SubmissionStatus::Error, Some(HASH))), HASH);
        assert_eq!(decision, EnqueueDecision::Enqueue);
    }

    #[test]
    fn submitted_with_matching_hash_is_skipped() {
        let decision = enqueue_decision(Some((SubmissionStatus::Submitted, Some(HASH))), HASH);
        assert!(matches!(decision, EnqueueDecision::Skip(_)));
    }

    #[test]
    fn missing_stored_hash_is_queued() {
        let decision = enqueue_decision(Some((SubmissionStatus::Pending, None)), HASH);
        assert_eq!(decision, EnqueueDecision::Enqueue);
    }

    #[test]
    fn action_is_submit_without_external_id() {
        assert_eq!(action_for(None), QueueAction::Submit);
        assert_eq!(action_for(Some("")), QueueAction::Submit);
    }

    #[test]
    fn action_is_update_with_external_id() {
        assert_eq!(action_for(Some("ext-1")), QueueAction::Update);
    }

    // Every (action, adapter-result) pairing of the success table.

    #[test]
    fn submit_success_lands_in_submitted() {
        assert_eq!(
            status_after_success(QueueAction::Submit, None),
            SubmissionStatus::Submitted
        );
    }

    #[test]
    fn update_success_lands_in_submitted() {
        assert_eq!(
            status_after_success(QueueAction::Update, None),
            SubmissionStatus::Submitted
        );
    }

    #[test]
    fn verify_reporting_verified_lands_in_verified() {
        assert_eq!(
            status_after_success(QueueAction::Verify, Some(VerifyStatus::Verified)),
            SubmissionStatus::Verified
        );
    }

    #[test]
    fn verify_reporting_not_found_lands_in_submitted() {
        assert_eq!(
            status_after_success(QueueAction::Verify, Some(VerifyStatus::NotFound)),
            SubmissionStatus::Submitted
        );
    }

    #[test]
    fn verify_reporting_pending_lands_in_submitted() {
        assert_eq!(
            status_after_success(QueueAction::Verify, Some(VerifyStatus::Pending)),
            SubmissionStatus::Submitted
        );
    }

    #[test]
    fn delete_success_lands_in_submitted() {
        assert_eq!(
            status_after_success(QueueAction::Delete, None),
            SubmissionStatus::Submitted
        );
    }

    #[test]
    fn verify_outcome_error_text_comes_from_message() {
        let outcome: ActionOutcome = citesync_providers::VerifyOutcome::error("dns failure").into();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("dns failure"));
    }

    #[test]
    fn unsupported_delete_error_text_comes_from_message() {
        let outcome: ActionOutcome = DeleteOutcome::unsupported("Foursquare Places").into();
        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap_or("").contains("no deletion endpoint"));
    }

    #[test]
    fn matched_submit_outcome_keeps_external_id() {
        let outcome: ActionOutcome =
            SubmitOutcome::matched("ext-9".to_string(), Some("https://x".to_string())).into();
        assert!(outcome.success);
        assert_eq!(outcome.external_id.as_deref(), Some("ext-9"));
    }
}
