//! Inbound coordinate and location-name validation.
//!
//! Pure functions, no side effects. Runs before any cache or network I/O
//! so malformed requests never cost an upstream call.

use common::error::BadRequestReason;
use regex::Regex;
use std::sync::LazyLock;

const MAX_LOCATION_LEN: usize = 100;

/// Substring markers that reject a location name outright: protocol
/// handlers, script tags, and HTML entity escapes.
const DENYLIST: &[&str] = &[
    "<script",
    "javascript:",
    "data:",
    "vbscript:",
    "&#",
    "&lt;",
    "&gt;",
    "&quot;",
];

/// Individually dangerous characters, rejected regardless of context.
const DENIED_CHARS: &[char] = &['<', '>', '"', '\'', '{', '}'];

/// Allow-list for whatever survives the denylist: Unicode letters and
/// numbers, whitespace, and a small punctuation set.
static ALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{L}\p{N}\s\-'.,()/]+$").expect("allow-list pattern compiles")
});

/// Validate the full request tuple.
pub fn validate_request(lat: f64, lon: f64, location_name: &str) -> Result<(), BadRequestReason> {
    validate_coordinates(lat, lon)?;
    validate_location_name(location_name)
}

pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), BadRequestReason> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(BadRequestReason::InvalidCoordinate);
    }
    Ok(())
}

pub fn validate_location_name(name: &str) -> Result<(), BadRequestReason> {
    let len = name.chars().count();
    if len == 0 || len > MAX_LOCATION_LEN {
        return Err(BadRequestReason::InvalidLocationLength);
    }

    let lowered = name.to_lowercase();
    if DENYLIST.iter().any(|marker| lowered.contains(marker))
        || name.chars().any(|c| DENIED_CHARS.contains(&c))
    {
        return Err(BadRequestReason::UnsafeLocationName);
    }

    if !ALLOWED.is_match(name) {
        return Err(BadRequestReason::InvalidLocationCharset);
    }

    Ok(())
}
