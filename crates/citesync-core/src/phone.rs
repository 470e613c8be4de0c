//! Best-effort phone canonicalization for outbound listing payloads.

/// Normalize a phone number to E.164-like form.
///
/// Exactly 10 digits are prefixed with `+1`; exactly 11 digits with a
/// leading `1` get a bare `+`. Anything else is passed through unchanged —
/// this is canonicalization, not validation.
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    match digits.len() {
        10 => format!("+1{digits}"),
        11 if digits.starts_with('1') => format!("+{digits}"),
        _ => raw.to_string(),
    }
}
