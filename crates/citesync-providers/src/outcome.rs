//! Typed results returned across the adapter boundary.
//!
//! Expected failures are values (`success == false` with the provider's own
//! error text), never panics or errors.

use chrono::{DateTime, Utc};
use citesync_core::VerifyStatus;

/// Result of a listing creation attempt.
#[derive(Debug, Clone, Default)]
pub struct SubmitOutcome {
    pub success: bool,
    pub external_id: Option<String>,
    pub external_url: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl SubmitOutcome {
    /// A listing was created on the provider side.
    #[must_use]
    pub fn created(external_id: String, external_url: Option<String>) -> Self {
        Self {
            success: true,
            external_id: Some(external_id),
            external_url,
            ..Self::default()
        }
    }

    /// Provider-side duplicate detection found an existing listing; no new
    /// one was created. `metadata.matched` is set so callers can tell the
    /// two success shapes apart.
    #[must_use]
    pub fn matched(external_id: String, external_url: Option<String>) -> Self {
        Self {
            success: true,
            external_id: Some(external_id),
            external_url,
            message: Some("matched existing listing".to_string()),
            metadata: Some(serde_json::json!({ "matched": true })),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Required-field validation failed; no network call was made.
    #[must_use]
    pub fn invalid(missing: &[&str]) -> Self {
        Self::failed(format!("missing required fields: {}", missing.join(", ")))
    }

    /// Whether this success came from duplicate matching rather than a create.
    #[must_use]
    pub fn was_matched(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("matched"))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

/// Result of a listing update attempt.
#[derive(Debug, Clone, Default)]
pub struct UpdateOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl UpdateOutcome {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Result of a listing verification probe.
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub success: bool,
    pub status: VerifyStatus,
    pub external_url: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl VerifyOutcome {
    #[must_use]
    pub fn verified(external_url: Option<String>, last_updated: Option<DateTime<Utc>>) -> Self {
        Self {
            success: true,
            status: VerifyStatus::Verified,
            external_url,
            last_updated,
            message: None,
        }
    }

    #[must_use]
    pub fn pending(message: Option<String>) -> Self {
        Self {
            success: true,
            status: VerifyStatus::Pending,
            external_url: None,
            last_updated: None,
            message,
        }
    }

    /// The provider reported the listing absent — a normal terminal outcome,
    /// so `success` stays `true`.
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            success: true,
            status: VerifyStatus::NotFound,
            external_url: None,
            last_updated: None,
            message: None,
        }
    }

    /// Transport or auth trouble prevented the probe.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: VerifyStatus::Error,
            external_url: None,
            last_updated: None,
            message: Some(message.into()),
        }
    }
}

/// Result of a listing deletion attempt.
#[derive(Debug, Clone, Default)]
pub struct DeleteOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl DeleteOutcome {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn unsupported(provider_name: &str) -> Self {
        Self {
            success: false,
            message: Some(format!(
                "{provider_name} has no deletion endpoint; remove the listing through their dashboard"
            )),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}
