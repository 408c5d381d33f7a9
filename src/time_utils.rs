// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and parsing.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Layout of LibreLinkUp's `FactoryTimestamp`, e.g. `1/2/2024 3:04:05 PM`.
///
/// The upstream always reports this in UTC without a zone marker.
pub const FACTORY_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a `FactoryTimestamp` literal as a UTC instant.
///
/// Strict: surrounding whitespace, a zone suffix, 24-hour clock values or
/// any other shape is rejected rather than guessed at.
pub fn parse_factory_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if raw.is_empty() {
        return Err("empty timestamp".to_string());
    }
    if raw.trim() != raw || !raw.is_ascii() {
        return Err("unexpected characters around timestamp".to_string());
    }

    // date, time and meridiem, separated by exactly one space each
    let parts: Vec<&str> = raw.split(' ').collect();
    if parts.len() != 3 {
        return Err(format!("expected 3 fields, found {}", parts.len()));
    }
    if parts[0].split('/').count() != 3 || parts[1].split(':').count() != 3 {
        return Err("expected M/d/y h:m:s".to_string());
    }
    // chrono accepts a signed year; the upstream never sends one
    let digits_and = |field: &str, sep: char| field.chars().all(|c| c.is_ascii_digit() || c == sep);
    if !digits_and(parts[0], '/') || !digits_and(parts[1], ':') {
        return Err("expected only digits in date and time".to_string());
    }
    if !matches!(parts[2], "AM" | "PM") {
        return Err(format!("expected AM or PM, found {:?}", parts[2]));
    }

    NaiveDateTime::parse_from_str(raw, FACTORY_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| e.to_string())
}
