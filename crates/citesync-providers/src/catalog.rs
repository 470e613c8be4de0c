//! Static descriptors for every known citation directory.
//!
//! Tier 1 providers expose a direct API, tier 2 are aggregators that feed
//! downstream directories, tier 3 have no API (manual or portal-form only),
//! and tier 4 are covered automatically by a tier-2 aggregation.

/// How an adapter authenticates against the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    OAuth2,
    ApiKey,
    PortalForm,
    Manual,
}

impl AuthMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMethod::OAuth2 => "oauth2",
            AuthMethod::ApiKey => "api_key",
            AuthMethod::PortalForm => "portal_form",
            AuthMethod::Manual => "manual",
        }
    }
}

/// Static descriptor for one directory. Seeded into the catalog table once;
/// only the `enabled` flag is operator-mutable afterwards.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub slug: &'static str,
    pub display_name: &'static str,
    pub tier: u8,
    pub auth: AuthMethod,
    /// Advisory rate limits from the provider's published docs. Nothing
    /// enforces these; they inform operators sizing drain batches.
    pub rate_per_minute: Option<u32>,
    pub rate_per_day: Option<u32>,
    pub enabled_by_default: bool,
    /// For tier-4 entries: the tier-2 aggregator whose fan-out covers them.
    pub covered_by: Option<&'static str>,
}

pub const CATALOG: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        slug: "google-business",
        display_name: "Google Business Profile",
        tier: 1,
        auth: AuthMethod::OAuth2,
        rate_per_minute: Some(300),
        rate_per_day: None,
        enabled_by_default: true,
        covered_by: None,
    },
    ProviderDescriptor {
        slug: "bing-places",
        display_name: "Bing Places for Business",
        tier: 1,
        auth: AuthMethod::ApiKey,
        rate_per_minute: Some(60),
        rate_per_day: Some(10_000),
        enabled_by_default: true,
        covered_by: None,
    },
    ProviderDescriptor {
        slug: "foursquare",
        display_name: "Foursquare Places",
        tier: 1,
        auth: AuthMethod::ApiKey,
        rate_per_minute: Some(50),
        rate_per_day: Some(5_000),
        enabled_by_default: true,
        covered_by: None,
    },
    ProviderDescriptor {
        slug: "yext",
        display_name: "Yext Listings",
        tier: 2,
        auth: AuthMethod::ApiKey,
        rate_per_minute: Some(100),
        rate_per_day: None,
        enabled_by_default: true,
        covered_by: None,
    },
    ProviderDescriptor {
        slug: "localpages",
        display_name: "LocalPages Directory",
        tier: 3,
        auth: AuthMethod::PortalForm,
        rate_per_minute: Some(5),
        rate_per_day: Some(100),
        enabled_by_default: false,
        covered_by: None,
    },
    ProviderDescriptor {
        slug: "yelp",
        display_name: "Yelp for Business",
        tier: 3,
        auth: AuthMethod::Manual,
        rate_per_minute: None,
        rate_per_day: None,
        enabled_by_default: false,
        covered_by: None,
    },
    ProviderDescriptor {
        slug: "hotfrog",
        display_name: "Hotfrog",
        tier: 4,
        auth: AuthMethod::Manual,
        rate_per_minute: None,
        rate_per_day: None,
        enabled_by_default: true,
        covered_by: Some("yext"),
    },
    ProviderDescriptor {
        slug: "brownbook",
        display_name: "Brownbook",
        tier: 4,
        auth: AuthMethod::Manual,
        rate_per_minute: None,
        rate_per_day: None,
        enabled_by_default: true,
        covered_by: Some("yext"),
    },
];

/// Looks up a catalog descriptor by slug.
#[must_use]
pub fn descriptor_for(slug: &str) -> Option<&'static ProviderDescriptor> {
    CATALOG.iter().find(|d| d.slug == slug)
}
