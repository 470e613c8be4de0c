//! Foursquare Places adapter (tier 1, API key).
//!
//! Duplicate detection searches `/places/search` by name near the listing's
//! city before creating. Foursquare has no deletion endpoint, so `delete`
//! falls through to the trait default.

use async_trait::async_trait;
use citesync_core::{normalize_phone, NormalizedLocation};
use serde::{Deserialize, Serialize};

use crate::adapter::{validation_failure, CitationAdapter, HttpSettings};
use crate::catalog::{descriptor_for, ProviderDescriptor};
use crate::error::AdapterError;
use crate::http;
use crate::outcome::{SubmitOutcome, UpdateOutcome, VerifyOutcome};
use crate::providers::{submit_result, update_result, verify_result};
use crate::retry::retry_with_backoff;

const SLUG: &str = "foursquare";
const DEFAULT_BASE_URL: &str = "https://api.foursquare.com/v3";

pub struct FoursquareAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    settings: HttpSettings,
}

#[derive(Debug, Serialize)]
struct PlacePayload<'a> {
    name: &'a str,
    address: &'a str,
    locality: &'a str,
    region: &'a str,
    postcode: &'a str,
    country: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    website: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    categories: &'a [String],
}

impl<'a> PlacePayload<'a> {
    fn from_location(location: &'a NormalizedLocation) -> Self {
        Self {
            name: &location.business_name,
            address: &location.street,
            locality: &location.city,
            region: &location.state,
            postcode: &location.zip,
            country: &location.country,
            tel: location.phone.as_deref().map(normalize_phone),
            website: location.website.as_deref(),
            description: location.description.as_deref(),
            categories: &location.categories,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Place {
    fsq_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    date_refreshed: Option<String>,
    #[serde(default)]
    closed_bucket: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<Place>,
}

impl FoursquareAdapter {
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

    fn place_url(&self, fsq_id: &str) -> String {
        format!("https://foursquare.com/v/{fsq_id}")
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

    async fn find_match(
        &self,
        key: &str,
        location: &NormalizedLocation,
    ) -> Result<Option<Place>, AdapterError> {
        let url = format!("{}/places/search", self.base_url);
        let near = format!("{}, {}", location.city, location.state);
        let body = self
            .request_json(|| {
                self.client
                    .get(&url)
                    .header(reqwest::header::AUTHORIZATION, key)
                    .query(&[
                        ("query", location.business_name.as_str()),
                        ("near", near.as_str()),
                        ("limit", "10"),
                    ])
            })
            .await?;

        let parsed: SearchResponse =
            serde_json::from_value(body).map_err(|e| AdapterError::Deserialize {
                context: "foursquare places/search".to_string(),
                source: e,
            })?;

        let wanted = location.business_name.to_lowercase();
        Ok(parsed
            .results
            .into_iter()
            .find(|p| p.name.to_lowercase() == wanted))
    }

    async fn try_submit(
        &self,
        key: &str,
        location: &NormalizedLocation,
    ) -> Result<SubmitOutcome, AdapterError> {
        if let Some(existing) = self.find_match(key, location).await? {
            tracing::debug!(fsq_id = %existing.fsq_id, "foursquare duplicate matched, skipping create");
            let url = existing
                .link
                .clone()
                .unwrap_or_else(|| self.place_url(&existing.fsq_id));
            return Ok(SubmitOutcome::matched(existing.fsq_id, Some(url)));
        }

        let url = format!("{}/places", self.base_url);
        let payload = PlacePayload::from_location(location);
        let body = self
            .request_json(|| {
                self.client
                    .post(&url)
                    .header(reqwest::header::AUTHORIZATION, key)
                    .json(&payload)
            })
            .await?;

        let place: Place = serde_json::from_value(body).map_err(|e| AdapterError::Deserialize {
            context: "foursquare create place".to_string(),
            source: e,
        })?;

        let external_url = self.place_url(&place.fsq_id);
        Ok(SubmitOutcome::created(place.fsq_id, Some(external_url)))
    }
}

#[async_trait]
impl CitationAdapter for FoursquareAdapter {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        descriptor_for(SLUG).expect("foursquare is in the catalog")
    }

    fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn submit(&self, location: &NormalizedLocation) -> Result<SubmitOutcome, AdapterError> {
        if let Some(invalid) = validation_failure(location) {
            return Ok(invalid);
        }
        let Some(key) = self.api_key.clone() else {
            return Ok(SubmitOutcome::failed("foursquare is not configured (missing API key)"));
        };
        submit_result(self.try_submit(&key, location).await)
    }

    async fn update(
        &self,
        external_id: &str,
        location: &NormalizedLocation,
    ) -> Result<UpdateOutcome, AdapterError> {
        let Some(key) = self.api_key.clone() else {
            return Ok(UpdateOutcome::failed("foursquare is not configured (missing API key)"));
        };

        let url = format!("{}/places/{external_id}", self.base_url);
        let payload = PlacePayload::from_location(location);
        let result = self
            .request_json(|| {
                self.client
                    .put(&url)
                    .header(reqwest::header::AUTHORIZATION, key.as_str())
                    .json(&payload)
            })
            .await
            .map(|_| UpdateOutcome::ok());
        update_result(result)
    }

    async fn verify(&self, external_id: &str) -> Result<VerifyOutcome, AdapterError> {
        let Some(key) = self.api_key.clone() else {
            return Ok(VerifyOutcome::error("foursquare is not configured (missing API key)"));
        };

        let url = format!("{}/places/{external_id}", self.base_url);
        let result = async {
            let body = self
                .request_json(|| {
                    self.client
                        .get(&url)
                        .header(reqwest::header::AUTHORIZATION, key.as_str())
                })
                .await?;

            let place: Place =
                serde_json::from_value(body).map_err(|e| AdapterError::Deserialize {
                    context: "foursquare get place".to_string(),
                    source: e,
                })?;

            let last_updated = place
                .date_refreshed
                .as_deref()
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&chrono::Utc));

            if place.closed_bucket.as_deref() == Some("VeryLikelyClosed") {
                return Ok(VerifyOutcome::pending(Some(
                    "foursquare marks this place as likely closed".to_string(),
                )));
            }

            Ok(VerifyOutcome::verified(
                Some(self.place_url(&place.fsq_id)),
                last_updated,
            ))
        }
        .await;
        verify_result(result)
    }

    // delete: trait default — Foursquare exposes no deletion endpoint.
}
