//! Field-level validation shared by the workflow steps.

use std::sync::OnceLock;

use regex::Regex;
use time::{format_description::FormatItem, macros::format_description, Date};
use url::Url;

const DATE_FORMAT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("pattern is a literal"))
}

/// 10 digits starting with 6/7/8/9.
pub fn is_valid_mobile(raw: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^[6-9][0-9]{9}$").is_match(raw.trim())
}

/// Exactly 6 digits.
pub fn is_valid_postal_code(raw: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^[0-9]{6}$").is_match(raw.trim())
}

pub fn is_valid_email(raw: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_match(raw.trim())
}

/// 15-character positional tax id: 2 digits, 5 letters, 4 digits, 2 letters,
/// 2 digits. Empty is fine; the field is optional.
pub fn is_valid_tax_id(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }
    static RE: OnceLock<Regex> = OnceLock::new();
    trimmed.len() == 15
        && regex(&RE, r"^[0-9]{2}[A-Za-z]{5}[0-9]{4}[A-Za-z]{2}[0-9]{2}$").is_match(trimmed)
}

/// Absolute http(s) URL or a bare domain. Empty is fine; the field is
/// optional.
pub fn is_valid_website(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }

    if let Ok(parsed) = Url::parse(trimmed) {
        return matches!(parsed.scheme(), "http" | "https");
    }

    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"^([A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
    )
    .is_match(trimmed)
}

pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), DATE_FORMAT).ok()
}

pub fn is_valid_date(raw: &str) -> bool {
    parse_date(raw).is_some()
}

pub fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_numbers() {
        assert!(is_valid_mobile("9876543210"));
        assert!(is_valid_mobile("6000000000"));
        assert!(!is_valid_mobile("5876543210"));
        assert!(!is_valid_mobile("987654321"));
        assert!(!is_valid_mobile("98765432101"));
        assert!(!is_valid_mobile("98765abc10"));
    }

    #[test]
    fn postal_codes() {
        assert!(is_valid_postal_code("781001"));
        assert!(!is_valid_postal_code("78100"));
        assert!(!is_valid_postal_code("78100A"));
    }

    #[test]
    fn emails() {
        assert!(is_valid_email("sender@example.com"));
        assert!(!is_valid_email("sender@example"));
        assert!(!is_valid_email("sender.example.com"));
    }

    #[test]
    fn tax_ids() {
        assert!(is_valid_tax_id(""));
        assert!(is_valid_tax_id("18AABCU9603RZ65"));
        assert!(!is_valid_tax_id("18AABCU9603RZ6"));
        assert!(!is_valid_tax_id("1XAABCU9603RZ65"));
        assert!(!is_valid_tax_id("18AABCU9603RZ651"));
    }

    #[test]
    fn websites() {
        assert!(is_valid_website(""));
        assert!(is_valid_website("https://example.com/ship"));
        assert!(is_valid_website("example.co.in"));
        assert!(!is_valid_website("ftp://example.com"));
        assert!(!is_valid_website("not a domain"));
    }

    #[test]
    fn dates() {
        assert!(is_valid_date("2026-08-30"));
        assert!(!is_valid_date("30-08-2026"));
        assert!(!is_valid_date("2026-13-01"));
        assert!(!is_valid_date(""));
    }
}
