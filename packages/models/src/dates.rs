//! Lenient date parsing for the date strings the SGU APIs emit.
//!
//! Formats seen on the wire include full RFC 3339 timestamps
//! (`2023-06-15T10:30:00+00:00`), naive date-times without an offset, and
//! plain dates with a trailing `Z` (`2024-08-01Z`). Everything is
//! normalised to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parses an API date or date-time string into UTC.
///
/// Returns `None` for empty or unparseable input.
#[must_use]
pub fn parse_api_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Parses an optional API date string.
#[must_use]
pub fn parse_optional(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(parse_api_datetime)
}
