// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field normalization: email/phone sanity checks and the canonical
//! summary projection.
//!
//! These are pure functions used on both sides of the wire -- the server
//! enforces them during validation and the client duplicates them
//! defensively -- so both sides must agree byte for byte.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::FieldBag;

/// The fixed vocabulary of field bag keys.
pub mod keys {
    pub const MODE: &str = "mode";
    pub const FULL_NAME: &str = "full_name";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const BUSINESS_NAME: &str = "business_name";
    pub const NEEDS_SUMMARY: &str = "needs_summary";
    pub const URGENCY: &str = "urgency";
    pub const BUDGET_BAND: &str = "budget_band";
    pub const SKIP_SCHEDULING: &str = "skip_scheduling";
    pub const SCHEDULING_OPTION: &str = "scheduling_option";
    pub const PREFERRED_TIMES: &str = "preferred_times";
    pub const TIMEZONE: &str = "timezone";
    pub const PREFERRED_CONTACT_CHANNEL: &str = "preferred_contact_channel";
    pub const BOOKING_URL: &str = "booking_url";
    pub const SUMMARY: &str = "summary";
    pub const ATTACHMENTS: &str = "attachments";
}

/// Cheap email shape gate: non-whitespace either side of one `@`, with a
/// dotted domain. Not RFC validation and not a security boundary.
static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email shape regex is valid"));

/// Returns whether `value` matches the `local@domain.tld` shape.
pub fn validate_email(value: &str) -> bool {
    EMAIL_SHAPE.is_match(value)
}

/// Strips every non-digit character and returns the digit string.
pub fn normalize_phone(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// A phone value is acceptable when it is omitted (empty after
/// normalization) or has at least ten digits.
pub fn phone_is_acceptable(normalized: &str) -> bool {
    normalized.is_empty() || normalized.len() >= 10
}

/// Renders the canonical multi-line summary of a field bag.
///
/// One line per populated well-known key, in fixed order; absent keys are
/// omitted entirely. Pure projection: the same bag always yields the same
/// string, so the client preview and the server default summary agree.
pub fn build_summary(fields: &FieldBag) -> String {
    let get = |key: &str| fields.get(key).map(String::as_str).filter(|v| !v.is_empty());

    let mut lines = Vec::new();
    if let Some(v) = get(keys::FULL_NAME) {
        lines.push(format!("Name: {v}"));
    }
    if let Some(v) = get(keys::EMAIL) {
        lines.push(format!("Email: {v}"));
    }
    if let Some(v) = get(keys::PHONE) {
        lines.push(format!("Phone: {v}"));
    }
    if let Some(v) = get(keys::BUSINESS_NAME) {
        lines.push(format!("Company: {v}"));
    }
    if let Some(v) = get(keys::NEEDS_SUMMARY) {
        lines.push(format!("Needs: {v}"));
    }
    if let Some(v) = get(keys::URGENCY) {
        lines.push(format!("Urgency: {v}"));
    }
    if let Some(v) = get(keys::BUDGET_BAND) {
        lines.push(format!("Budget: {v}"));
    }
    if let Some(v) = get(keys::PREFERRED_CONTACT_CHANNEL) {
        lines.push(format!("Preferred Channel: {v}"));
    }
    if let Some(v) = get(keys::PREFERRED_TIMES) {
        let tz = get(keys::TIMEZONE)
            .map(|z| format!(" ({z})"))
            .unwrap_or_default();
        lines.push(format!("Preferred Times: {v}{tz}"));
    }
    if let Some(v) = get(keys::BOOKING_URL) {
        lines.push(format!("Booking Link: {v}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(entries: &[(&str, &str)]) -> FieldBag {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn email_shape_accepts_plain_addresses() {
        assert!(validate_email("jane@example.com"));
        assert!(validate_email("a.b+c@sub.domain.co"));
    }

    #[test]
    fn email_shape_rejects_malformed_addresses() {
        assert!(!validate_email("jane"));
        assert!(!validate_email("jane@example"));
        assert!(!validate_email("jane doe@example.com"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn phone_normalization_strips_everything_but_digits() {
        assert_eq!(normalize_phone("+1 (555) 010-2030"), "15550102030");
        assert_eq!(normalize_phone("no digits here"), "");
    }

    #[test]
    fn phone_acceptance_rules() {
        assert!(phone_is_acceptable(""));
        assert!(phone_is_acceptable("5550102030"));
        assert!(!phone_is_acceptable("555010"));
    }

    #[test]
    fn summary_emits_fixed_order_and_skips_absent_keys() {
        let fields = bag(&[
            (keys::EMAIL, "jane@example.com"),
            (keys::FULL_NAME, "Jane Doe"),
            (keys::NEEDS_SUMMARY, "New marketing site"),
        ]);
        insta::assert_snapshot!(build_summary(&fields), @r"
        Name: Jane Doe
        Email: jane@example.com
        Needs: New marketing site
        ");
    }

    #[test]
    fn summary_appends_timezone_to_preferred_times() {
        let fields = bag(&[
            (keys::PREFERRED_TIMES, "Tue 2-4pm"),
            (keys::TIMEZONE, "America/Chicago"),
        ]);
        assert_eq!(
            build_summary(&fields),
            "Preferred Times: Tue 2-4pm (America/Chicago)"
        );
    }

    #[test]
    fn summary_omits_timezone_suffix_when_absent() {
        let fields = bag(&[(keys::PREFERRED_TIMES, "Thu morning")]);
        assert_eq!(build_summary(&fields), "Preferred Times: Thu morning");
    }

    #[test]
    fn summary_is_deterministic() {
        let fields = bag(&[
            (keys::FULL_NAME, "Jane Doe"),
            (keys::BUSINESS_NAME, "Acme"),
            (keys::BUDGET_BAND, "$5k-$15k"),
        ]);
        assert_eq!(build_summary(&fields), build_summary(&fields));
    }

    #[test]
    fn summary_of_empty_bag_is_empty() {
        assert_eq!(build_summary(&FieldBag::new()), "");
    }

    #[test]
    fn summary_ignores_empty_values() {
        let fields = bag(&[(keys::PHONE, ""), (keys::FULL_NAME, "Jane Doe")]);
        assert_eq!(build_summary(&fields), "Name: Jane Doe");
    }
}
