use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;

use super::error::TimestampError;
use super::model::Instant;

/// Offset-less ISO-8601 shapes, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_OF_DAY_PATTERN: &str = r"^(\d{1,2}):(\d{2}):(\d{2})$";
const FILENAME_DATE_PATTERN: &str = r"(\d{2})-(\d{2})-(\d{4})";

/// Compile `pattern` once. A pattern that fails to compile is logged and
/// then matches nothing.
fn cached_regex(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| {
        Regex::new(pattern)
            .map_err(|e| log::error!("invalid pattern {pattern:?}: {e}"))
            .ok()
    })
    .as_ref()
}

fn time_of_day_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(&RE, TIME_OF_DAY_PATTERN)
}

fn filename_date_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(&RE, FILENAME_DATE_PATTERN)
}

/// Parse a raw timestamp cell.
///
/// ISO-8601 is tried first. Otherwise the value must be a bare `H:MM:SS` /
/// `HH:MM:SS` time of day, which is anchored on `base_date`.
pub fn parse_timestamp(raw: &str, base_date: Option<NaiveDate>) -> Result<Instant, TimestampError> {
    let raw = raw.trim();
    if let Some(ts) = parse_iso(raw) {
        return Ok(ts);
    }
    parse_time_of_day(raw, base_date)
}

/// ISO-8601 with or without offset, or a plain calendar date (midnight UTC).
pub fn parse_iso(raw: &str) -> Option<Instant> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ndt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Bare time of day combined with the session's calendar date.
pub fn parse_time_of_day(raw: &str, base_date: Option<NaiveDate>) -> Result<Instant, TimestampError> {
    let raw = raw.trim();
    let caps = time_of_day_re()
        .and_then(|re| re.captures(raw))
        .ok_or_else(|| TimestampError::Unparseable(raw.to_string()))?;

    let part = |i: usize| caps[i].parse::<u32>().unwrap_or(u32::MAX);
    let time = NaiveTime::from_hms_opt(part(1), part(2), part(3))
        .ok_or_else(|| TimestampError::Unparseable(raw.to_string()))?;

    let date = base_date.ok_or_else(|| TimestampError::BaseDateRequired(raw.to_string()))?;
    Ok(date.and_time(time).and_utc())
}

/// Recording date embedded in a file name as `DD-MM-YYYY`.
pub fn base_date_from_filename(name: &str) -> Option<NaiveDate> {
    filename_date_re()?.captures_iter(name).find_map(|caps| {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}
