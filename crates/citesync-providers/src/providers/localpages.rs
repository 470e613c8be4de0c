//! LocalPages portal-form fallback adapter (tier 3, no API).
//!
//! This is the lowest-priority path: it drives the directory's public
//! submission form over plain HTTP and pulls the confirmation id out of the
//! response HTML by trying several extraction patterns in order. Selector
//! drift breaks only this adapter; nothing else depends on it.

use async_trait::async_trait;
use citesync_core::{normalize_phone, NormalizedLocation};
use regex::Regex;

use crate::adapter::{validation_failure, CitationAdapter, HttpSettings};
use crate::catalog::{descriptor_for, ProviderDescriptor};
use crate::error::AdapterError;
use crate::http;
use crate::outcome::{SubmitOutcome, UpdateOutcome, VerifyOutcome};
use crate::providers::{submit_result, update_result, verify_result};
use crate::retry::retry_with_backoff;

const SLUG: &str = "localpages";
const DEFAULT_BASE_URL: &str = "https://www.localpages.com";

pub struct LocalPagesAdapter {
    client: reqwest::Client,
    portal_email: Option<String>,
    base_url: String,
    settings: HttpSettings,
}

/// Extract a listing id from the portal's confirmation HTML.
///
/// Recognises, in order:
/// - `data-listing-id="lp-12345"`
/// - a canonical `/biz/lp-12345` link
/// - `Confirmation #: lp-12345` copy in the success banner
fn extract_listing_id(html: &str) -> Option<String> {
    let patterns = [
        r#"data-listing-id\s*=\s*["']([A-Za-z0-9_-]+)["']"#,
        r"/biz/([A-Za-z0-9_-]+)",
        r"[Cc]onfirmation\s*#?:?\s*([A-Za-z0-9_-]+)",
    ];

    for pattern in &patterns {
        let re = Regex::new(pattern).expect("valid regex");
        if let Some(cap) = re.captures(html) {
            if let Some(m) = cap.get(1) {
                return Some(m.as_str().to_string());
            }
        }
    }

    None
}

impl LocalPagesAdapter {
    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the HTTP client cannot be built.
    pub fn new(portal_email: Option<String>, settings: &HttpSettings) -> Result<Self, AdapterError> {
        Self::with_base_url(portal_email, settings, DEFAULT_BASE_URL)
    }

    /// Custom base URL variant for pointing tests at a mock server.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        portal_email: Option<String>,
        settings: &HttpSettings,
        base_url: &str,
    ) -> Result<Self, AdapterError> {
        Ok(Self {
            client: http::build_client(settings)?,
            portal_email,
            base_url: base_url.trim_end_matches('/').to_string(),
            settings: settings.clone(),
        })
    }

    fn listing_url(&self, id: &str) -> String {
        format!("{}/biz/{id}", self.base_url)
    }

    fn form_fields(&self, email: &str, location: &NormalizedLocation) -> Vec<(String, String)> {
        let mut fields = vec![
            ("business_name".to_string(), location.business_name.clone()),
            ("address".to_string(), location.street.clone()),
            ("city".to_string(), location.city.clone()),
            ("state".to_string(), location.state.clone()),
            ("zip".to_string(), location.zip.clone()),
            ("country".to_string(), location.country.clone()),
            ("contact_email".to_string(), email.to_string()),
        ];
        if let Some(phone) = location.phone.as_deref() {
            fields.push(("phone".to_string(), normalize_phone(phone)));
        }
        if let Some(website) = &location.website {
            fields.push(("website".to_string(), website.clone()));
        }
        if let Some(description) = &location.description {
            fields.push(("description".to_string(), description.clone()));
        }
        if !location.categories.is_empty() {
            fields.push(("categories".to_string(), location.categories.join(", ")));
        }
        fields
    }

    async fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<String, AdapterError> {
        retry_with_backoff(self.settings.max_retries, self.settings.backoff_base_ms, || async {
            let response = self.client.post(url).form(fields).send().await?;
            http::text_body(SLUG, response).await
        })
        .await
    }
}

#[async_trait]
impl CitationAdapter for LocalPagesAdapter {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        descriptor_for(SLUG).expect("localpages is in the catalog")
    }

    fn is_configured(&self) -> bool {
        self.portal_email.as_deref().is_some_and(|e| !e.is_empty())
    }

    async fn submit(&self, location: &NormalizedLocation) -> Result<SubmitOutcome, AdapterError> {
        if let Some(invalid) = validation_failure(location) {
            return Ok(invalid);
        }
        let Some(email) = self.portal_email.clone() else {
            return Ok(SubmitOutcome::failed(
                "localpages is not configured (missing portal contact email)",
            ));
        };

        let url = format!("{}/submit-listing", self.base_url);
        let fields = self.form_fields(&email, location);
        let result = async {
            let html = self.post_form(&url, &fields).await?;
            match extract_listing_id(&html) {
                Some(id) => {
                    let listing_url = self.listing_url(&id);
                    Ok(SubmitOutcome::created(id, Some(listing_url)))
                }
                None => {
                    tracing::warn!("localpages response contained no recognisable confirmation id");
                    Ok(SubmitOutcome::failed(
                        "portal accepted the form but no confirmation id could be extracted",
                    ))
                }
            }
        }
        .await;
        submit_result(result)
    }

    async fn update(
        &self,
        external_id: &str,
        location: &NormalizedLocation,
    ) -> Result<UpdateOutcome, AdapterError> {
        let Some(email) = self.portal_email.clone() else {
            return Ok(UpdateOutcome::failed(
                "localpages is not configured (missing portal contact email)",
            ));
        };

        let url = format!("{}/update-listing/{external_id}", self.base_url);
        let fields = self.form_fields(&email, location);
        let result = self
            .post_form(&url, &fields)
            .await
            .map(|_| UpdateOutcome::ok());
        update_result(result)
    }

    async fn verify(&self, external_id: &str) -> Result<VerifyOutcome, AdapterError> {
        let url = self.listing_url(external_id);
        let result = async {
            let html = retry_with_backoff(
                self.settings.max_retries,
                self.settings.backoff_base_ms,
                || async {
                    let response = self.client.get(&url).send().await?;
                    http::text_body(SLUG, response).await
                },
            )
            .await?;

            if html.to_lowercase().contains("pending review") {
                Ok(VerifyOutcome::pending(Some(
                    "listing is awaiting portal review".to_string(),
                )))
            } else {
                Ok(VerifyOutcome::verified(Some(url.clone()), None))
            }
        }
        .await;
        verify_result(result)
    }

    // delete: trait default — the portal offers no removal flow.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_from_data_attribute() {
        let html = r#"<div class="success" data-listing-id="lp-98765">Thanks!</div>"#;
        assert_eq!(extract_listing_id(html).as_deref(), Some("lp-98765"));
    }

    #[test]
    fn extracts_id_from_canonical_link() {
        let html = r#"<a href="https://www.localpages.com/biz/lp-11111">View your listing</a>"#;
        assert_eq!(extract_listing_id(html).as_deref(), Some("lp-11111"));
    }

    #[test]
    fn extracts_id_from_confirmation_copy() {
        let html = "<p>Confirmation #: ABC-123</p>";
        assert_eq!(extract_listing_id(html).as_deref(), Some("ABC-123"));
    }

    #[test]
    fn returns_none_when_nothing_matches() {
        let html = "<html><body><p>Thanks for your submission!</p></body></html>";
        assert_eq!(extract_listing_id(html), None);
    }
}
