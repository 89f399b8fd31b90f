//! Lenient date handling.
//!
//! Reference dates and event dates arrive as free text from forms and from
//! the remote store. Nothing here fails: callers pass a fallback (normally
//! the current date or time) that is used when the text does not parse.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %b %Y"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: [&str; 4] = ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

/// Parse a calendar date, accepting plain dates and full timestamps.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| parse_datetime(raw).map(|dt| dt.date_naive()))
}

/// Parse a date, falling back to `fallback` when the text is unusable.
#[must_use]
pub fn date_or(raw: &str, fallback: NaiveDate) -> NaiveDate {
    parse_date(raw).unwrap_or_else(|| {
        tracing::debug!(raw, %fallback, "unparseable date, using fallback");
        fallback
    })
}

/// Parse a point in time. Naive timestamps are taken as UTC and a bare
/// date means midnight UTC.
#[must_use]
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%SZ") {
        return Some(dt.and_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.and_utc())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        })
}

/// Parse a wall-clock time such as `14:30` or `2:30 PM`.
#[must_use]
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
}

/// Render a date in the `YYYY-MM-DD` form used throughout the state tree.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
