//! Google Business Profile adapter (tier 1, OAuth2).
//!
//! Access tokens are minted from a long-lived refresh token and cached
//! in-memory; the cache refreshes five minutes before expiry so an almost-
//! stale token is never sent. Duplicate detection searches Google's
//! location index by name + city before creating.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use citesync_core::{normalize_phone, NormalizedLocation};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::adapter::{validation_failure, CitationAdapter, HttpSettings};
use crate::catalog::{descriptor_for, ProviderDescriptor};
use crate::error::AdapterError;
use crate::http;
use crate::outcome::{DeleteOutcome, SubmitOutcome, UpdateOutcome, VerifyOutcome};
use crate::providers::{delete_result, submit_result, update_result, verify_result};
use crate::retry::retry_with_backoff;

const SLUG: &str = "google-business";
const DEFAULT_API_BASE: &str = "https://mybusinessbusinessinformation.googleapis.com/v1";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Refresh this long before the reported expiry.
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct GoogleBusinessAdapter {
    client: reqwest::Client,
    credentials: Option<GoogleCredentials>,
    api_base: String,
    token_url: String,
    settings: HttpSettings,
    token: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3_600
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LocationPayload {
    title: String,
    storefront_address: StorefrontAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone_numbers: Option<PhoneNumbers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    website_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<Profile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StorefrontAddress {
    address_lines: Vec<String>,
    locality: String,
    administrative_area: String,
    postal_code: String,
    region_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PhoneNumbers {
    primary_phone: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Profile {
    description: String,
}

impl LocationPayload {
    fn from_location(location: &NormalizedLocation) -> Self {
        Self {
            title: location.business_name.clone(),
            storefront_address: StorefrontAddress {
                address_lines: vec![location.street.clone()],
                locality: location.city.clone(),
                administrative_area: location.state.clone(),
                postal_code: location.zip.clone(),
                region_code: location.country.clone(),
            },
            phone_numbers: location.phone.as_deref().map(|p| PhoneNumbers {
                primary_phone: normalize_phone(p),
            }),
            website_uri: location.website.clone(),
            profile: location
                .description
                .clone()
                .map(|description| Profile { description }),
        }
    }

    /// Field mask naming exactly the fields the payload carries, so PATCH
    /// leaves everything else untouched server-side.
    fn update_mask(&self) -> String {
        let mut fields = vec!["title", "storefrontAddress"];
        if self.phone_numbers.is_some() {
            fields.push("phoneNumbers");
        }
        if self.website_uri.is_some() {
            fields.push("websiteUri");
        }
        if self.profile.is_some() {
            fields.push("profile");
        }
        fields.join(",")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationResource {
    /// Resource name, e.g. `locations/12345` — used as the external id.
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    metadata: LocationMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationMetadata {
    #[serde(default)]
    maps_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchGoogleLocationsResponse {
    #[serde(default)]
    google_locations: Vec<GoogleLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleLocation {
    #[serde(default)]
    location: Option<LocationResource>,
}

impl GoogleBusinessAdapter {
    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the HTTP client cannot be built.
    pub fn new(
        credentials: Option<GoogleCredentials>,
        settings: &HttpSettings,
    ) -> Result<Self, AdapterError> {
        Self::with_base_urls(credentials, settings, DEFAULT_API_BASE, DEFAULT_TOKEN_URL)
    }

    /// Custom endpoint variant for pointing tests at a mock server.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the HTTP client cannot be built.
    pub fn with_base_urls(
        credentials: Option<GoogleCredentials>,
        settings: &HttpSettings,
        api_base: &str,
        token_url: &str,
    ) -> Result<Self, AdapterError> {
        Ok(Self {
            client: http::build_client(settings)?,
            credentials,
            api_base: api_base.trim_end_matches('/').to_string(),
            token_url: token_url.to_string(),
            settings: settings.clone(),
            token: Mutex::new(None),
        })
    }

    /// Returns a valid access token, refreshing through the OAuth2 token
    /// endpoint when the cached one is within the expiry buffer.
    async fn access_token(&self) -> Result<String, AdapterError> {
        let Some(credentials) = &self.credentials else {
            return Err(AdapterError::Auth {
                provider: SLUG,
                reason: "missing OAuth2 credentials".to_string(),
            });
        };

        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() + TOKEN_EXPIRY_BUFFER {
                return Ok(cached.access_token.clone());
            }
        }

        tracing::debug!("refreshing google-business access token");
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AdapterError::Auth {
                provider: SLUG,
                reason: format!("token endpoint returned {status}: {}", http::truncate(&body, 200)),
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AdapterError::Deserialize {
                context: "google token endpoint".to_string(),
                source: e,
            })?;

        *guard = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        Ok(token.access_token)
    }

    async fn request_json(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder + Send + Sync,
    ) -> Result<serde_json::Value, AdapterError> {
        retry_with_backoff(self.settings.max_retries, self.settings.backoff_base_ms, || async {
            let token = self.access_token().await?;
            let response = build().bearer_auth(token).send().await?;
            http::json_body(SLUG, response).await
        })
        .await
    }

    fn parse_location(
        body: serde_json::Value,
        context: &str,
    ) -> Result<LocationResource, AdapterError> {
        serde_json::from_value(body).map_err(|e| AdapterError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }

    async fn find_match(
        &self,
        location: &NormalizedLocation,
    ) -> Result<Option<LocationResource>, AdapterError> {
        let url = format!("{}/googleLocations:search", self.api_base);
        let query = format!("{} {}", location.business_name, location.city);
        let body = self
            .request_json(|| {
                self.client
                    .post(&url)
                    .json(&serde_json::json!({ "query": query, "pageSize": 10 }))
            })
            .await?;

        let parsed: SearchGoogleLocationsResponse =
            serde_json::from_value(body).map_err(|e| AdapterError::Deserialize {
                context: "google locations search".to_string(),
                source: e,
            })?;

        let wanted = location.business_name.to_lowercase();
        Ok(parsed
            .google_locations
            .into_iter()
            .filter_map(|g| g.location)
            .find(|l| l.title.to_lowercase() == wanted))
    }

    async fn try_submit(
        &self,
        location: &NormalizedLocation,
    ) -> Result<SubmitOutcome, AdapterError> {
        if let Some(existing) = self.find_match(location).await? {
            tracing::debug!(resource = %existing.name, "google duplicate matched, skipping create");
            return Ok(SubmitOutcome::matched(
                existing.name,
                existing.metadata.maps_uri,
            ));
        }

        let url = format!("{}/locations", self.api_base);
        let payload = LocationPayload::from_location(location);
        let body = self
            .request_json(|| self.client.post(&url).json(&payload))
            .await?;

        let created = Self::parse_location(body, "google create location")?;
        Ok(SubmitOutcome::created(
            created.name,
            created.metadata.maps_uri,
        ))
    }
}

#[async_trait]
impl CitationAdapter for GoogleBusinessAdapter {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        descriptor_for(SLUG).expect("google-business is in the catalog")
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn submit(&self, location: &NormalizedLocation) -> Result<SubmitOutcome, AdapterError> {
        if let Some(invalid) = validation_failure(location) {
            return Ok(invalid);
        }
        if self.credentials.is_none() {
            return Ok(SubmitOutcome::failed(
                "google-business is not configured (missing OAuth2 credentials)",
            ));
        }
        submit_result(self.try_submit(location).await)
    }

    async fn update(
        &self,
        external_id: &str,
        location: &NormalizedLocation,
    ) -> Result<UpdateOutcome, AdapterError> {
        if self.credentials.is_none() {
            return Ok(UpdateOutcome::failed(
                "google-business is not configured (missing OAuth2 credentials)",
            ));
        }

        let url = format!("{}/{external_id}", self.api_base);
        let payload = LocationPayload::from_location(location);
        let mask = payload.update_mask();
        let result = self
            .request_json(|| {
                self.client
                    .patch(&url)
                    .query(&[("updateMask", mask.as_str())])
                    .json(&payload)
            })
            .await
            .map(|_| UpdateOutcome::ok());
        update_result(result)
    }

    async fn verify(&self, external_id: &str) -> Result<VerifyOutcome, AdapterError> {
        if self.credentials.is_none() {
            return Ok(VerifyOutcome::error(
                "google-business is not configured (missing OAuth2 credentials)",
            ));
        }

        let url = format!("{}/{external_id}", self.api_base);
        let result = async {
            let body = self.request_json(|| self.client.get(&url)).await?;
            let resource = Self::parse_location(body, "google get location")?;
            Ok(VerifyOutcome::verified(resource.metadata.maps_uri, None))
        }
        .await;
        verify_result(result)
    }

    async fn delete(&self, external_id: &str) -> Result<DeleteOutcome, AdapterError> {
        if self.credentials.is_none() {
            return Ok(DeleteOutcome::failed(
                "google-business is not configured (missing OAuth2 credentials)",
            ));
        }

        let url = format!("{}/{external_id}", self.api_base);
        let result = retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || async {
                let token = self.access_token().await?;
                let response = self.client.delete(&url).bearer_auth(token).send().await?;
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
    fn update_mask_tracks_present_fields() {
        let location = NormalizedLocation {
            business_name: "Joe's Pizza".to_string(),
            street: "12 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip: "62701".to_string(),
            country: "US".to_string(),
            phone: Some("2175551234".to_string()),
            ..NormalizedLocation::default()
        };
        let payload = LocationPayload::from_location(&location);
        assert_eq!(payload.update_mask(), "title,storefrontAddress,phoneNumbers");
    }

    #[test]
    fn payload_normalizes_phone() {
        let location = NormalizedLocation {
            phone: Some("2175551234".to_string()),
            ..NormalizedLocation::default()
        };
        let payload = LocationPayload::from_location(&location);
        assert_eq!(
            payload.phone_numbers.map(|p| p.primary_phone).as_deref(),
            Some("+12175551234")
        );
    }
}
