//! Provider-agnostic listing payload and the submission state machine types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Day of the week for business hours. `Ord` follows Monday-first order so
/// hour maps iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

/// Opening hours for one weekday, `"HH:MM"` 24-hour local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: String,
    pub close: String,
}

/// Normalized business listing, the single payload shape every provider
/// adapter maps from. Days absent from `hours` mean closed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLocation {
    pub business_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub hours: BTreeMap<Weekday, DayHours>,
    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
    pub logo_url: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl NormalizedLocation {
    /// Names of required fields that are empty or whitespace-only.
    ///
    /// Validation happens here, once, before any adapter performs a network
    /// call. An empty return value means the listing is submittable.
    #[must_use]
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let required: [(&'static str, &str); 6] = [
            ("business_name", &self.business_name),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zip", &self.zip),
            ("country", &self.country),
        ];
        required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

/// Lifecycle of one `(domain, provider)` submission. Stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Pending,
    Queued,
    Submitting,
    Submitted,
    Verified,
    Error,
    NeedsUpdate,
}

impl SubmissionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Queued => "queued",
            SubmissionStatus::Submitting => "submitting",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Verified => "verified",
            SubmissionStatus::Error => "error",
            SubmissionStatus::NeedsUpdate => "needs_update",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SubmissionStatus::Pending),
            "queued" => Some(SubmissionStatus::Queued),
            "submitting" => Some(SubmissionStatus::Submitting),
            "submitted" => Some(SubmissionStatus::Submitted),
            "verified" => Some(SubmissionStatus::Verified),
            "error" => Some(SubmissionStatus::Error),
            "needs_update" => Some(SubmissionStatus::NeedsUpdate),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of work a queue item asks the drain cycle to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAction {
    Submit,
    Update,
    Verify,
    Delete,
}

impl QueueAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QueueAction::Submit => "submit",
            QueueAction::Update => "update",
            QueueAction::Verify => "verify",
            QueueAction::Delete => "delete",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submit" => Some(QueueAction::Submit),
            "update" => Some(QueueAction::Update),
            "verify" => Some(QueueAction::Verify),
            "delete" => Some(QueueAction::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for QueueAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a provider-side listing verification.
///
/// `NotFound` is a normal terminal outcome (the listing is simply absent),
/// not a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStatus {
    Verified,
    Pending,
    NotFound,
    Error,
}

impl VerifyStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VerifyStatus::Verified => "verified",
            VerifyStatus::Pending => "pending",
            VerifyStatus::NotFound => "not_found",
            VerifyStatus::Error => "error",
        }
    }
}
