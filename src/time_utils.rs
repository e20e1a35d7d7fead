// SPDX-License-Identifier: MIT

//! Shared helpers for calendar-day and time-of-day arithmetic.
//!
//! Booking dates, streak dates, and "today" are always compared as day keys
//! (midnight UTC) so time-of-day differences never cause false mismatches.

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, TimeZone, Utc};

/// Truncate a UTC timestamp to midnight UTC (the canonical day key).
pub fn day_key(date: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(date.year(), date.month(), date.day(), 0, 0, 0)
        .single()
        .unwrap_or(date)
}

/// Parse a date-bearing string into a day key.
///
/// Accepts RFC3339 timestamps and bare `YYYY-MM-DD` dates.
pub fn parse_day(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(day_key(dt.with_timezone(&Utc)));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// Parse an `"HH:mm"` wall-clock string into minutes since midnight.
pub fn parse_hhmm(raw: &str) -> Option<u32> {
    let (h, m) = raw.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Hour component of an `"HH:mm"` string.
pub fn hour_of(raw: &str) -> Option<u32> {
    parse_hhmm(raw).map(|minutes| minutes / 60)
}

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_key_truncates_to_midnight() {
        let dt = DateTime::parse_from_rfc3339("2024-03-05T17:45:12Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_utc_rfc3339(day_key(dt)), "2024-03-05T00:00:00Z");
    }

    #[test]
    fn test_parse_day_accepts_both_formats() {
        let from_rfc3339 = parse_day("2024-03-05T17:45:12+02:00").unwrap();
        let from_date = parse_day("2024-03-05").unwrap();
        assert_eq!(from_rfc3339, from_date);
    }

    #[test]
    fn test_parse_day_normalizes_timezone_offsets() {
        // 23:30 at -03:00 is already the next day in UTC
        let key = parse_day("2024-03-05T23:30:00-03:00").unwrap();
        assert_eq!(format_utc_rfc3339(key), "2024-03-06T00:00:00Z");
    }

    #[test]
    fn test_parse_day_rejects_garbage() {
        assert!(parse_day("tomorrow").is_none());
        assert!(parse_day("2024-13-01").is_none());
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("09:30"), Some(570));
        assert_eq!(parse_hhmm("00:00"), Some(0));
        assert_eq!(parse_hhmm("23:59"), Some(1439));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("9:30"), None);
        assert_eq!(parse_hhmm("09-30"), None);
    }

    #[test]
    fn test_hour_of() {
        assert_eq!(hour_of("06:59"), Some(6));
        assert_eq!(hour_of("22:00"), Some(22));
        assert_eq!(hour_of("bad"), None);
    }
}
