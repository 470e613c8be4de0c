//! Change-detection fingerprint over the normalized listing form.

use sha2::{Digest, Sha256};

use crate::location::NormalizedLocation;
use crate::phone::normalize_phone;

/// Deterministic fingerprint of a [`NormalizedLocation`].
///
/// Fields are folded into the hash in a fixed order, maps in their sorted
/// iteration order, so two semantically identical listings always produce
/// the same value regardless of how they were assembled. The output is the
/// first 16 hex chars of a SHA-256 — a change-detection key, not a
/// security primitive.
#[must_use]
pub fn location_fingerprint(location: &NormalizedLocation) -> String {
    let mut hasher = Sha256::new();

    let mut field = |name: &str, value: &str| {
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.trim().to_lowercase().as_bytes());
        hasher.update(b"|");
    };

    field("name", &location.business_name);
    field("street", &location.street);
    field("city", &location.city);
    field("state", &location.state);
    field("zip", &location.zip);
    field("country", &location.country);
    field(
        "phone",
        &location
            .phone
            .as_deref()
            .map(normalize_phone)
            .unwrap_or_default(),
    );
    field("email", location.email.as_deref().unwrap_or(""));
    field("website", location.website.as_deref().unwrap_or(""));
    field("description", location.description.as_deref().unwrap_or(""));
    field("categories", &location.categories.join(","));
    for (day, hours) in &location.hours {
        field(day.as_str(), &format!("{}-{}", hours.open, hours.close));
    }
    for (platform, url) in &location.social_links {
        field(platform, url);
    }
    field("logo", location.logo_url.as_deref().unwrap_or(""));
    field("images", &location.image_urls.join(","));

    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{DayHours, Weekday};

    fn base() -> NormalizedLocation {
        NormalizedLocation {
            business_name: "Joe's Pizza".to_string(),
            street: "12 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip: "62701".to_string(),
            country: "US".to_string(),
            phone: Some("2175551234".to_string()),
            ..NormalizedLocation::default()
        }
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = location_fingerprint(&base());
        let b = location_fingerprint(&base());
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_ignores_case_and_surrounding_whitespace() {
        let mut other = base();
        other.business_name = "  JOE'S PIZZA ".to_string();
        other.city = "springfield".to_string();
        assert_eq!(location_fingerprint(&base()), location_fingerprint(&other));
    }

    #[test]
    fn fingerprint_treats_equivalent_phone_forms_as_identical() {
        let mut other = base();
        other.phone = Some("(217) 555-1234".to_string());
        assert_eq!(location_fingerprint(&base()), location_fingerprint(&other));
    }

    #[test]
    fn changed_phone_digit_changes_fingerprint() {
        let mut other = base();
        other.phone = Some("2175551235".to_string());
        assert_ne!(location_fingerprint(&base()), location_fingerprint(&other));
    }

    #[test]
    fn changed_description_changes_fingerprint() {
        let mut other = base();
        other.description = Some("Now with gluten-free crust".to_string());
        assert_ne!(location_fingerprint(&base()), location_fingerprint(&other));
    }

    #[test]
    fn hours_insertion_order_does_not_matter() {
        let hours = |open: &str, close: &str| DayHours {
            open: open.to_string(),
            close: close.to_string(),
        };

        let mut first = base();
        first.hours.insert(Weekday::Monday, hours("09:00", "17:00"));
        first.hours.insert(Weekday::Friday, hours("09:00", "21:00"));

        let mut second = base();
        second.hours.insert(Weekday::Friday, hours("09:00", "21:00"));
        second.hours.insert(Weekday::Monday, hours("09:00", "17:00"));

        assert_eq!(
            location_fingerprint(&first),
            location_fingerprint(&second)
        );
    }

    #[test]
    fn category_order_is_significant() {
        let mut first = base();
        first.categories = vec!["Pizza".to_string(), "Italian".to_string()];
        let mut second = base();
        second.categories = vec!["Italian".to_string(), "Pizza".to_string()];
        assert_ne!(location_fingerprint(&first), location_fingerprint(&second));
    }
}
