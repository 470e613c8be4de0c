use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::location::{DayHours, NormalizedLocation, Weekday};
use crate::ConfigError;

/// Listing fields carried in the domain inventory file. Mirrors
/// [`NormalizedLocation`] but everything except the business name is
/// optional at rest; required-field enforcement happens centrally at
/// submission time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingConfig {
    pub business_name: String,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub hours: std::collections::BTreeMap<Weekday, DayHours>,
    #[serde(default)]
    pub social_links: std::collections::BTreeMap<String, String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl ListingConfig {
    /// Pure mapping into the provider-agnostic payload shape.
    #[must_use]
    pub fn to_location(&self) -> NormalizedLocation {
        NormalizedLocation {
            business_name: self.business_name.clone(),
            street: self.street.clone().unwrap_or_default(),
            city: self.city.clone().unwrap_or_default(),
            state: self.state.clone().unwrap_or_default(),
            zip: self.zip.clone().unwrap_or_default(),
            country: self.country.clone().unwrap_or_default(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            website: self.website.clone(),
            description: self.description.clone(),
            categories: self.categories.clone(),
            hours: self.hours.clone(),
            social_links: self.social_links.clone(),
            logo_url: self.logo_url.clone(),
            image_urls: self.image_urls.clone(),
        }
    }
}

/// One domain in the inventory: the host, which registrar it was sourced
/// from, and the listing data to publish for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    pub host: String,
    pub registrar: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub listing: ListingConfig,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct DomainsFile {
    pub domains: Vec<DomainConfig>,
}

/// Load and validate the domain inventory from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_domains(path: &Path) -> Result<DomainsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::DomainsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let domains_file: DomainsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::DomainsFileParse)?;

    validate_domains(&domains_file)?;

    Ok(domains_file)
}

fn validate_domains(domains_file: &DomainsFile) -> Result<(), ConfigError> {
    let mut seen_hosts = HashSet::new();

    for domain in &domains_file.domains {
        let host = domain.host.trim().to_lowercase();
        if host.is_empty() {
            return Err(ConfigError::Validation(
                "domain host must be non-empty".to_string(),
            ));
        }

        if !host.contains('.') {
            return Err(ConfigError::Validation(format!(
                "domain host '{host}' does not look like a hostname"
            )));
        }

        if !seen_hosts.insert(host.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate domain host: '{host}'"
            )));
        }

        if domain.registrar.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "domain '{host}' has an empty registrar label"
            )));
        }

        if domain.listing.business_name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "domain '{host}' has an empty listing business_name"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(host: &str) -> DomainConfig {
        DomainConfig {
            host: host.to_string(),
            registrar: "hostinger".to_string(),
            active: true,
            listing: ListingConfig {
                business_name: "Joe's Pizza".to_string(),
                ..ListingConfig::default()
            },
        }
    }

    #[test]
    fn accepts_distinct_hosts() {
        let file = DomainsFile {
            domains: vec![domain("joespizza.com"), domain("joespizza.net")],
        };
        assert!(validate_domains(&file).is_ok());
    }

    #[test]
    fn rejects_duplicate_hosts_case_insensitively() {
        let file = DomainsFile {
            domains: vec![domain("JoesPizza.com"), domain("joespizza.com")],
        };
        let err = validate_domains(&file).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn rejects_host_without_dot() {
        let file = DomainsFile {
            domains: vec![domain("localhost")],
        };
        assert!(validate_domains(&file).is_err());
    }

    #[test]
    fn rejects_empty_business_name() {
        let mut d = domain("joespizza.com");
        d.listing.business_name = "  ".to_string();
        let file = DomainsFile { domains: vec![d] };
        assert!(validate_domains(&file).is_err());
    }

    #[test]
    fn parses_a_full_inventory_document() {
        let yaml = r#"
domains:
  - host: joespizza.com
    registrar: godaddy
    listing:
      business_name: "Joe's Pizza"
      street: 12 Main St
      city: Springfield
      state: IL
      zip: "62701"
      country: US
      phone: "2175551234"
      categories: [Pizza, Italian]
      hours:
        monday: { open: "11:00", close: "22:00" }
        friday: { open: "11:00", close: "23:00" }
      social_links:
        facebook: https://facebook.com/joespizza
"#;
        let file: DomainsFile = serde_yaml::from_str(yaml).unwrap();
        assert!(validate_domains(&file).is_ok());
        let listing = &file.domains[0].listing;
        assert_eq!(listing.categories.len(), 2);
        assert_eq!(listing.hours.len(), 2);
        let loc = listing.to_location();
        assert_eq!(loc.city, "Springfield");
        assert!(loc.missing_required_fields().is_empty());
    }

    #[test]
    fn to_location_fills_absent_fields_with_empty_strings() {
        let listing = ListingConfig {
            business_name: "Joe's Pizza".to_string(),
            ..ListingConfig::default()
        };
        let loc = listing.to_location();
        assert_eq!(loc.street, "");
        assert_eq!(
            loc.missing_required_fields(),
            vec!["street", "city", "state", "zip", "country"]
        );
    }
}
