//! Explicit adapter registry, constructed once at process start and passed
//! by reference to whatever orchestrates submissions. No global state; tests
//! build registries out of mock adapters.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use citesync_core::AppConfig;

use crate::adapter::{CitationAdapter, HttpSettings};
use crate::catalog::CATALOG;
use crate::credentials::{CredentialResolver, CredentialStore};
use crate::error::AdapterError;
use crate::providers::{
    BingPlacesAdapter, FoursquareAdapter, GoogleBusinessAdapter, GoogleCredentials,
    LocalPagesAdapter, YextAdapter,
};

/// One line of the diagnostics report: catalog identity plus whether an
/// adapter exists and has credentials.
#[derive(Debug, Clone)]
pub struct ProviderStatus {
    pub slug: &'static str,
    pub display_name: &'static str,
    pub tier: u8,
    pub has_adapter: bool,
    pub configured: bool,
}

pub struct ProviderRegistry {
    adapters: Vec<Arc<dyn CitationAdapter>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new(adapters: Vec<Arc<dyn CitationAdapter>>) -> Self {
        Self { adapters }
    }

    /// Builds the full adapter roster with credentials taken from config.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if an adapter's HTTP client cannot be
    /// built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AdapterError> {
        let settings = HttpSettings::from_app_config(config);

        let google_credentials = match (
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.google_refresh_token.clone(),
        ) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Some(GoogleCredentials {
                client_id,
                client_secret,
                refresh_token,
            }),
            _ => None,
        };

        let adapters: Vec<Arc<dyn CitationAdapter>> = vec![
            Arc::new(GoogleBusinessAdapter::new(google_credentials, &settings)?),
            Arc::new(BingPlacesAdapter::new(config.bing_api_key.clone(), &settings)?),
            Arc::new(FoursquareAdapter::new(
                config.foursquare_api_key.clone(),
                &settings,
            )?),
            Arc::new(YextAdapter::new(config.yext_api_key.clone(), &settings)?),
            Arc::new(LocalPagesAdapter::new(
                config.localpages_portal_email.clone(),
                &settings,
            )?),
        ];

        Ok(Self::new(adapters))
    }

    /// Like [`ProviderRegistry::from_config`], but credentials missing from
    /// the environment are resolved through the external store (behind the
    /// configured TTL cache) before adapters are constructed.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if an adapter's HTTP client cannot be
    /// built.
    pub async fn from_config_with_store(
        config: &AppConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, AdapterError> {
        let resolver = CredentialResolver::with_store(
            "CITESYNC",
            store,
            Duration::from_secs(config.credential_cache_ttl_secs),
        );

        let fill = |existing: Option<String>, key: &'static str| {
            let resolver = &resolver;
            async move {
                match existing {
                    Some(value) => Some(value),
                    None => resolver.resolve(key).await,
                }
            }
        };

        let mut resolved = config.clone();
        resolved.google_client_id = fill(resolved.google_client_id, "GOOGLE_CLIENT_ID").await;
        resolved.google_client_secret =
            fill(resolved.google_client_secret, "GOOGLE_CLIENT_SECRET").await;
        resolved.google_refresh_token =
            fill(resolved.google_refresh_token, "GOOGLE_REFRESH_TOKEN").await;
        resolved.bing_api_key = fill(resolved.bing_api_key, "BING_API_KEY").await;
        resolved.foursquare_api_key = fill(resolved.foursquare_api_key, "FOURSQUARE_API_KEY").await;
        resolved.yext_api_key = fill(resolved.yext_api_key, "YEXT_API_KEY").await;
        resolved.localpages_portal_email =
            fill(resolved.localpages_portal_email, "LOCALPAGES_PORTAL_EMAIL").await;

        Self::from_config(&resolved)
    }

    #[must_use]
    pub fn all(&self) -> &[Arc<dyn CitationAdapter>] {
        &self.adapters
    }

    /// Looks up an adapter by catalog slug.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<Arc<dyn CitationAdapter>> {
        self.adapters
            .iter()
            .find(|a| a.descriptor().slug == slug)
            .cloned()
    }

    /// Adapters whose credentials are present.
    #[must_use]
    pub fn configured(&self) -> Vec<Arc<dyn CitationAdapter>> {
        self.adapters
            .iter()
            .filter(|a| a.is_configured())
            .cloned()
            .collect()
    }

    /// Adapters grouped by catalog tier.
    #[must_use]
    pub fn by_tier(&self) -> BTreeMap<u8, Vec<Arc<dyn CitationAdapter>>> {
        let mut tiers: BTreeMap<u8, Vec<Arc<dyn CitationAdapter>>> = BTreeMap::new();
        for adapter in &self.adapters {
            tiers
                .entry(adapter.descriptor().tier)
                .or_default()
                .push(Arc::clone(adapter));
        }
        tiers
    }

    /// Diagnostics over the whole catalog, including entries with no
    /// adapter (manual and aggregator-covered directories).
    #[must_use]
    pub fn status_report(&self) -> Vec<ProviderStatus> {
        CATALOG
            .iter()
            .map(|descriptor| {
                let adapter = self.get(descriptor.slug);
                ProviderStatus {
                    slug: descriptor.slug,
                    display_name: descriptor.display_name,
                    tier: descriptor.tier,
                    has_adapter: adapter.is_some(),
                    configured: adapter.is_some_and(|a| a.is_configured()),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use citesync_core::NormalizedLocation;

    use crate::catalog::descriptor_for;
    use crate::outcome::{SubmitOutcome, UpdateOutcome, VerifyOutcome};

    struct FakeAdapter {
        slug: &'static str,
        configured: bool,
    }

    #[async_trait]
    impl CitationAdapter for FakeAdapter {
        fn descriptor(&self) -> &'static crate::catalog::ProviderDescriptor {
            descriptor_for(self.slug).expect("known slug")
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn submit(
            &self,
            _location: &NormalizedLocation,
        ) -> Result<SubmitOutcome, AdapterError> {
            Ok(SubmitOutcome::created("fake".to_string(), None))
        }

        async fn update(
            &self,
            _external_id: &str,
            _location: &NormalizedLocation,
        ) -> Result<UpdateOutcome, AdapterError> {
            Ok(UpdateOutcome::ok())
        }

        async fn verify(&self, _external_id: &str) -> Result<VerifyOutcome, AdapterError> {
            Ok(VerifyOutcome::verified(None, None))
        }
    }

    fn fake_registry() -> ProviderRegistry {
        ProviderRegistry::new(vec![
            Arc::new(FakeAdapter {
                slug: "foursquare",
                configured: true,
            }),
            Arc::new(FakeAdapter {
                slug: "yext",
                configured: false,
            }),
        ])
    }

    #[test]
    fn lookup_by_slug_finds_adapters() {
        let registry = fake_registry();
        assert!(registry.get("foursquare").is_some());
        assert!(registry.get("bing-places").is_none());
    }

    #[test]
    fn configured_filters_out_unconfigured_adapters() {
        let registry = fake_registry();
        let configured = registry.configured();
        assert_eq!(configured.len(), 1);
        assert_eq!(configured[0].descriptor().slug, "foursquare");
    }

    #[test]
    fn by_tier_groups_adapters() {
        let registry = fake_registry();
        let tiers = registry.by_tier();
        assert_eq!(tiers.get(&1).map(Vec::len), Some(1));
        assert_eq!(tiers.get(&2).map(Vec::len), Some(1));
    }

    #[test]
    fn status_report_covers_the_full_catalog() {
        let registry = fake_registry();
        let report = registry.status_report();
        assert_eq!(report.len(), CATALOG.len());

        let foursquare = report.iter().find(|s| s.slug == "foursquare").unwrap();
        assert!(foursquare.has_adapter);
        assert!(foursquare.configured);

        let yext = report.iter().find(|s| s.slug == "yext").unwrap();
        assert!(yext.has_adapter);
        assert!(!yext.configured);

        let yelp = report.iter().find(|s| s.slug == "yelp").unwrap();
        assert!(!yelp.has_adapter, "manual directories have no adapter");
    }
}
