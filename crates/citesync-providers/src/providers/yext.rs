//! Yext Listings adapter (tier 2 aggregator).
//!
//! A single Yext entity fans out to the downstream directory network, which
//! is what makes tier-4 catalog entries "covered". Auth rides on
//! `api_key` + `v` query pairs; responses use the Yext envelope with
//! `meta.errors`.

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

const SLUG: &str = "yext";
const DEFAULT_BASE_URL: &str = "https://api.yext.com/v2/accounts/me";
const API_VERSION: &str = "20240115";

pub struct YextAdapter {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    settings: HttpSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntityPayload<'a> {
    name: &'a str,
    address: EntityAddress<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    main_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    website_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    categories: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntityAddress<'a> {
    line1: &'a str,
    city: &'a str,
    region: &'a str,
    postal_code: &'a str,
    country_code: &'a str,
}

impl<'a> EntityPayload<'a> {
    fn from_location(location: &'a NormalizedLocation) -> Self {
        Self {
            name: &location.business_name,
            address: EntityAddress {
                line1: &location.street,
                city: &location.city,
                region: &location.state,
                postal_code: &location.zip,
                country_code: &location.country,
            },
            main_phone: location.phone.as_deref().map(normalize_phone),
            email: location.email.as_deref(),
            website_url: location.website.as_deref(),
            description: location.description.as_deref(),
            categories: &location.categories,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    response: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    errors: Vec<MetaError>,
}

#[derive(Debug, Deserialize)]
struct MetaError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entity {
    #[serde(default)]
    meta: EntityMeta,
    #[serde(default)]
    name: String,
    #[serde(default)]
    listings_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityMeta {
    #[serde(default)]
    id: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct EntityList {
    #[serde(default)]
    entities: Vec<Entity>,
}

impl YextAdapter {
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

    /// Unwraps the Yext envelope, surfacing `meta.errors` as an API error.
    fn unwrap_envelope(body: serde_json::Value, context: &str) -> Result<serde_json::Value, AdapterError> {
        let envelope: Envelope =
            serde_json::from_value(body).map_err(|e| AdapterError::Deserialize {
                context: context.to_string(),
                source: e,
            })?;

        if let Some(first) = envelope.meta.errors.first() {
            return Err(AdapterError::Api {
                provider: "yext",
                message: first.message.clone(),
            });
        }

        Ok(envelope.response)
    }

    fn parse_entity(response: serde_json::Value, context: &str) -> Result<Entity, AdapterError> {
        serde_json::from_value(response).map_err(|e| AdapterError::Deserialize {
            context: context.to_string(),
            source: e,
        })
    }

    async fn request(
        &self,
        key: &str,
        build: impl Fn() -> reqwest::RequestBuilder + Send + Sync,
        context: &str,
    ) -> Result<serde_json::Value, AdapterError> {
        let body = retry_with_backoff(
            self.settings.max_retries,
            self.settings.backoff_base_ms,
            || async {
                let response = build()
                    .query(&[("api_key", key), ("v", API_VERSION)])
                    .send()
                    .await?;
                http::json_body(SLUG, response).await
            },
        )
        .await?;
        Self::unwrap_envelope(body, context)
    }

    async fn find_match(
        &self,
        key: &str,
        location: &NormalizedLocation,
    ) -> Result<Option<Entity>, AdapterError> {
        let url = format!("{}/entities", self.base_url);
        let response = self
            .request(
                key,
                || {
                    self.client.get(&url).query(&[
                        ("entityTypes", "location"),
                        ("name", location.business_name.as_str()),
                        ("city", location.city.as_str()),
                        ("limit", "10"),
                    ])
                },
                "yext list entities",
            )
            .await?;

        let list: EntityList =
            serde_json::from_value(response).map_err(|e| AdapterError::Deserialize {
                context: "yext list entities".to_string(),
                source: e,
            })?;

        let wanted = location.business_name.to_lowercase();
        Ok(list
            .entities
            .into_iter()
            .find(|e| e.name.to_lowercase() == wanted))
    }

    async fn try_submit(
        &self,
        key: &str,
        location: &NormalizedLocation,
    ) -> Result<SubmitOutcome, AdapterError> {
        if let Some(existing) = self.find_match(key, location).await? {
            tracing::debug!(entity_id = %existing.meta.id, "yext duplicate matched, skipping create");
            return Ok(SubmitOutcome::matched(
                existing.meta.id,
                existing.listings_url,
            ));
        }

        let url = format!("{}/entities", self.base_url);
        let payload = EntityPayload::from_location(location);
        let response = self
            .request(
                key,
                || {
                    self.client
                        .post(&url)
                        .query(&[("entityType", "location")])
                        .json(&payload)
                },
                "yext create entity",
            )
            .await?;

        let entity = Self::parse_entity(response, "yext create entity")?;
        Ok(SubmitOutcome::created(entity.meta.id, entity.listings_url))
    }
}

#[async_trait]
impl CitationAdapter for YextAdapter {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        descriptor_for(SLUG).expect("yext is in the catalog")
    }

    fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn submit(&self, location: &NormalizedLocation) -> Result<SubmitOutcome, AdapterError> {
        if let Some(invalid) = validation_failure(location) {
            return Ok(invalid);
        }
        let Some(key) = self.api_key.clone() else {
            return Ok(SubmitOutcome::failed("yext is not configured (missing API key)"));
        };
        submit_result(self.try_submit(&key, location).await)
    }

    async fn update(
        &self,
        external_id: &str,
        location: &NormalizedLocation,
    ) -> Result<UpdateOutcome, AdapterError> {
        let Some(key) = self.api_key.clone() else {
            return Ok(UpdateOutcome::failed("yext is not configured (missing API key)"));
        };

        let url = format!("{}/entities/{external_id}", self.base_url);
        let payload = EntityPayload::from_location(location);
        let result = self
            .request(
                &key,
                || self.client.put(&url).json(&payload),
                "yext update entity",
            )
            .await
            .map(|_| UpdateOutcome::ok());
        update_result(result)
    }

    async fn verify(&self, external_id: &str) -> Result<VerifyOutcome, AdapterError> {
        let Some(key) = self.api_key.clone() else {
            return Ok(VerifyOutcome::error("yext is not configured (missing API key)"));
        };

        let url = format!("{}/entities/{external_id}", self.base_url);
        let result = async {
            let response = self
                .request(&key, || self.client.get(&url), "yext get entity")
                .await?;
            let entity = Self::parse_entity(response, "yext get entity")?;
            Ok(VerifyOutcome::verified(
                entity.listings_url,
                entity.meta.timestamp,
            ))
        }
        .await;
        verify_result(result)
    }

    async fn delete(&self, external_id: &str) -> Result<DeleteOutcome, AdapterError> {
        let Some(key) = self.api_key.clone() else {
            return Ok(DeleteOutcome::failed("yext is not configured (missing API key)"));
        };

        let url = format!("{}/entities/{external_id}", self.base_url);
        let result = self
            .request(&key, || self.client.delete(&url), "yext delete entity")
            .await
            .map(|_| DeleteOutcome::ok());
        delete_result(result)
    }
}
