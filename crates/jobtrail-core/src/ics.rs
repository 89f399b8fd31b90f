//! iCalendar export.
//!
//! Renders calendar events as RFC 5545 text: a `VCALENDAR` wrapping one
//! `VEVENT` per event, each carrying a display reminder ahead of the
//! start. Output lines are CRLF-terminated and folded at 75 octets.
//!
//! Only `UID` and `DTSTAMP` depend on the generation time; every other
//! line is a pure function of the event.

use crate::dates;
use crate::model::CalendarEvent;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_LINE_OCTETS: usize = 75;
const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Knobs for the exported text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub product_id: String,
    /// Minutes before the start at which the reminder fires.
    pub reminder_minutes: u32,
    /// Event length used when no end time is recorded.
    pub default_duration_minutes: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            product_id: "-//jobtrail//calendar export//EN".to_string(),
            reminder_minutes: 30,
            default_duration_minutes: 60,
        }
    }
}

/// Escape a TEXT value: backslash, semicolon, comma, then newline.
/// CRLF and lone CR both count as a newline.
#[must_use]
pub fn escape_text(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// Compact UTC form used by `DTSTART`, `DTEND`, and `DTSTAMP`.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Start of an event. An all-day event starts at midnight UTC; a missing
/// or unparseable date means `now`.
#[must_use]
pub fn event_start(event: &CalendarEvent, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(date) = dates::parse_date(&event.date) else {
        tracing::debug!(event = %event.id, date = %event.date, "event has no usable date, exporting at now");
        return now;
    };

    if let Some(time) = event.time.as_deref().and_then(dates::parse_time) {
        return date.and_time(time).and_utc();
    }

    dates::parse_datetime(&event.date).unwrap_or_else(|| date.and_time(NaiveTime::MIN).and_utc())
}

/// End of an event: the recorded end when it parses and follows the
/// start, otherwise start plus the default duration.
#[must_use]
pub fn event_end(event: &CalendarEvent, start: DateTime<Utc>, options: &ExportOptions) -> DateTime<Utc> {
    event
        .end
        .as_deref()
        .and_then(dates::parse_datetime)
        .filter(|end| *end > start)
        .unwrap_or_else(|| start + Duration::minutes(i64::from(options.default_duration_minutes)))
}

fn uid_for(event: &CalendarEvent, now: DateTime<Utc>) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(event.id.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(now.to_rfc3339().as_bytes());
    let hex = hasher.finalize().to_hex();
    format!("{}-{}@jobtrail", event.id, &hex.as_str()[..16])
}

struct Writer {
    buf: String,
}

impl Writer {
    const fn new() -> Self {
        Self { buf: String::new() }
    }

    fn line(&mut self, name: &str, value: &str) {
        let mut width = 0;
        for ch in name.chars().chain(std::iter::once(':')).chain(value.chars()) {
            let len = ch.len_utf8();
            if width + len > MAX_LINE_OCTETS {
                self.buf.push_str("\r\n ");
                width = 1;
            }
            self.buf.push(ch);
            width += len;
        }
        self.buf.push_str("\r\n");
    }

    fn open(&mut self, options: &ExportOptions) {
        self.line("BEGIN", "VCALENDAR");
        self.line("VERSION", "2.0");
        self.line("PRODID", &options.product_id);
        self.line("CALSCALE", "GREGORIAN");
        self.line("METHOD", "PUBLISH");
    }

    fn close(&mut self) {
        self.line("END", "VCALENDAR");
    }

    fn event(&mut self, event: &CalendarEvent, now: DateTime<Utc>, options: &ExportOptions) {
        let start = event_start(event, now);
        let end = event_end(event, start, options);
        let summary = escape_text(&event.title);

        self.line("BEGIN", "VEVENT");
        self.line("UID", &uid_for(event, now));
        self.line("DTSTAMP", &format_timestamp(now));
        self.line("DTSTART", &format_timestamp(start));
        self.line("DTEND", &format_timestamp(end));
        self.line("SUMMARY", &summary);
        self.line(
            "DESCRIPTION",
            &escape_text(event.description.as_deref().unwrap_or_default()),
        );
        self.line(
            "LOCATION",
            &escape_text(event.location.as_deref().unwrap_or_default()),
        );
        self.line("CATEGORIES", &event.kind.as_str().to_ascii_uppercase());
        self.line("BEGIN", "VALARM");
        self.line("TRIGGER", &format!("-PT{}M", options.reminder_minutes));
        self.line("ACTION", "DISPLAY");
        self.line("DESCRIPTION", &format!("Reminder: {summary}"));
        self.line("END", "VALARM");
        self.line("END", "VEVENT");
    }

    fn finish(self) -> String {
        self.buf
    }
}

/// Render one event as a standalone calendar, stamped with the current time.
#[must_use]
pub fn to_calendar_text(event: &CalendarEvent) -> String {
    to_calendar_text_at(event, Utc::now(), &ExportOptions::default())
}

/// Render one event as a standalone calendar, generated at `now`.
#[must_use]
pub fn to_calendar_text_at(
    event: &CalendarEvent,
    now: DateTime<Utc>,
    options: &ExportOptions,
) -> String {
    to_calendar_feed_at(std::slice::from_ref(event), now, options)
}

/// Render several events inside a single calendar, stamped with the
/// current time.
#[must_use]
pub fn to_calendar_feed(events: &[CalendarEvent], options: &ExportOptions) -> String {
    to_calendar_feed_at(events, Utc::now(), options)
}

/// Render several events inside a single calendar, generated at `now`.
#[must_use]
pub fn to_calendar_feed_at(
    events: &[CalendarEvent],
    now: DateTime<Utc>,
    options: &ExportOptions,
) -> String {
    let mut writer = Writer::new();
    writer.open(options);
    for event in events {
        writer.event(event, now, options);
    }
    writer.close();
    writer.finish()
}
