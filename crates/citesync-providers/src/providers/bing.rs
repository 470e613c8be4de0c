//! Bing Places adapter (tier 1, API key).
//!
//! The listings API has no search endpoint, so submit cannot do duplicate
//! detection and always creates. CAUTION: Bing's PATCH semantics delete any
//! field sent blank, so update payloads serialize only non-empty fields —
//! fields absent from the listing are left untouched server-side.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use citesync_core::{normalize_phone, NormalizedLocation};
use serde::{Deserialize, Serialize};

use crate::adapter::{validation_failure, CitationAdapter, HttpSettings};
use crate::catalog::{descriptor_for, ProviderDescriptor};
use crate::error::AdapterError;
use crate::http;
use crate::outcome::{DeleteOutcome, SubmitOutcome, UpdateOutcome, VerifyOutcome};
use crate::providers::{delete_result, submit_result, update_result, verify_result};
use crate::retry::retry_with_backoff;

const SLUG: &str = "bing-places";
const DEFAULT_BASE_URL: &str = "https://places.bing.com/api/v1";
const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

pub struct BingPlacesAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    settings: HttpSettings,
}

/// Create payload: the full listing, blanks included (create treats blank
/// as absent).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateListing<'a> {
    business_name: &'a str,
    address_line: &'a str,
    city: &'a str,
    state_or_province: &'a str,
    postal_code: &'a str,
    country: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    website: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    categories: &'a [String],
}

/// Patch payload: every field optional and skipped when absent, because a
/// blank field in a Bing PATCH wipes the stored value.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PatchListing {
    #[serde(skip_serializing_if = "Option::is_none")]
    business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_or_province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<String>>,
}

impl PatchListing {
    /// Only non-empty fields make it into the payload.
    fn from_location(location: &NormalizedLocation) -> Self {
        let non_empty = |s: &str| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        Self {
            business_name: non_empty(&location.business_name),
            address_line: non_empty(&location.street),
            city: non_empty(&location.city),
            state_or_province: non_empty(&location.state),
            postal_code: non_empty(&location.zip),
            country: non_empty(&location.country),
            phone: location
                .phone
                .as_deref()
                .and_then(non_empty)
                .map(|p| normalize_phone(&p)),
            email: location.email.as_deref().and_then(non_empty),
            website: location.website.as_deref().and_then(non_empty),
            description: location.description.as_deref().and_then(non_empty),
            categories: (!location.categories.is_empty()).then(|| location.categories.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingResponse {
    listing_id: String,
    #[serde(default)]
    listing_url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

impl BingPlacesAdapter {
    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: Option<String>, settings: &HttpSettings) -> Result<Self, AdapterError> {
        Self::with_base_url(api_key, settings, DEFAULT_BASE_URL)
    }

    /// Custom base URL variant for pointing tests at a mock server.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: Option<String>,
        settings: &HttpSettings,
        base_url: &str,
    ) -> Result<Self, AdapterError> {
        Ok(Self {
            client: http::build_client(settings)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            settings: settings.clone(),
        })
    }

    async fn request_json(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder + Send + Sync,
    ) -> Result<serde_json::Value, AdapterError> {
        retry_with_backoff(self.settings.max_retries, self.settings.backoff_base_ms, || async {
            let response = build().send().await?;
            http::json_body(SLUG, response).await
        })
        .await
    }

    fn parse_listing(body: serde_json::Value, context: &str) -> Result<ListingResponse, AdapterError> {
        serde_json::from_value(body).map_err(|e| AdapterError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl CitationAdapter for BingPlacesAdapter {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        descriptor_for(SLUG).expect("bing-places is in the catalog")
    }

    fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn submit(&self, location: &NormalizedLocation) -> Result<SubmitOutcome, AdapterError> {
        if let Some(invalid) = validation_failure(location) {
            return Ok(invalid);
        }
        let Some(key) = self.api_key.clone() else {
            return Ok(SubmitOutcome::failed("bing-places is not configured (missing API key)"));
        };

        let url = format!("{}/listings", self.base_url);
        let payload = CreateListing {
            business_name: &location.business_name,
            address_line: &location.street,
            city: &location.city,
            state_or_province: &location.state,
            postal_code: &location.zip,
            country: &location.country,
            phone: location.phone.as_deref().map(normalize_phone),
            email: location.email.as_deref(),
            website: location.website.as_deref(),
            description: location.description.as_deref(),
            categories: &location.categories,
        };

        let result = async {
            let body = self
                .request_json(|| {
                    self.client
                        .post(&url)
                        .header(API_KEY_HEADER, key.as_str())
                        .json(&payload)
                })
                .await?;
            let listing = Self::parse_listing(body, "bing create listing")?;
            Ok(SubmitOutcome::created(listing.listing_id, listing.listing_url))
        }
        .await;
        submit_result(result)
    }

    async fn update(
        &self,
        external_id: &str,
        location: &NormalizedLocation,
    ) -> Result<UpdateOutcome, AdapterError> {
        let Some(key) = self.api_key.clone() else {
            return Ok(UpdateOutcome::failed("bing-places is not configured (missing API key)"));
        };

        let url = format!("{}/listings/{external_id}", self.base_url);
        let payload = PatchListing::from_location(location);
        let result = self
            .request_json(|| {
                self.client
                    .patch(&url)
                    .header(API_KEY_HEADER, key.as_str())
                    .json(&payload)
            })
            .await
            .map(|_| UpdateOutcome::ok());
        update_result(result)
    }

    async fn verify(&self, external_id: &str) -> Result<VerifyOutcome, AdapterError> {
        let Some(key) = self.api_key.clone() else {
            return Ok(VerifyOutcome::error("bing-places is not configured (missing API key)"));
        };

        let url = format!("{}/listings/{external_id}", self.base_url);
        let result = async {
            let body = self
                .request_json(|| self.client.get(&url).header(API_KEY_HEADER, key.as_str()))
                .await?;
            let listing = Self::parse_listing(body, "bing get listing")?;

            match listing.status.as_deref() {
                Some("Active") => Ok(VerifyOutcome::verified(
                    listing.listing_url,
                    listing.last_updated,
                )),
                Some(other) => Ok(VerifyOutcome::pending(Some(format!(
                    "bing listing status: {other}"
                )))),
                None => Ok(VerifyOutcome::pending(None)),
            }
        }
        .await;
        verify_result(result)
    }

    async fn delete(&self, external_id: &str) -> Result<DeleteOutcome, AdapterError> {
        let Some(key) = self.api_key.clone() else {
            return Ok(DeleteOutcome::failed("bing-places is not configured (missing API key)"));
        };

        let url = format!("{}/listings/{external_id}", self.base_url);
        let result = retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || async {
                let response = self
                    .client
                    .delete(&url)
                    .header(API_KEY_HEADER, key.as_str())
                    .send()
                    .await?;
                http::no_content(SLUG, response).await
            },
        )
        .await
        .map(|()| DeleteOutcome::ok());
        delete_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_payload_drops_blank_fields() {
        let location = NormalizedLocation {
            business_name: "Joe's Pizza".to_string(),
            street: "12 Main St".to_string(),
            city: String::new(),
            state: "  ".to_string(),
            zip: "62701".to_string(),
            country: "US".to_string(),
            description: Some(String::new()),
            ..NormalizedLocation::default()
        };

        let patch = PatchListing::from_location(&location);
        let json = serde_json::to_value(&patch).unwrap();
        let obj = json.as_object().unwrap();

        assert!(obj.contains_key("businessName"));
        assert!(obj.contains_key("postalCode"));
        assert!(!obj.contains_key("city"), "blank city must not be sent");
        assert!(!obj.contains_key("stateOrProvince"), "whitespace state must not be sent");
        assert!(!obj.contains_key("description"), "empty description must not be sent");
        assert!(!obj.contains_key("phone"));
    }

    #[test]
    fn patch_payload_normalizes_phone() {
        let location = NormalizedLocation {
            phone: Some("(217) 555-1234".to_string()),
            ..NormalizedLocation::default()
        };
        let patch = PatchListing::from_location(&location);
        assert_eq!(patch.phone.as_deref(), Some("+12175551234"));
    }
}
