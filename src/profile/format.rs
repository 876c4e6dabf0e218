//! Display formatting helpers: permissive date parsing, compact counts,
//! key humanization, and relative timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Epoch values above this are interpreted as milliseconds, below as
/// seconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 10_000_000_000;

/// Parses a date from whatever a profile payload happens to contain:
/// epoch seconds, epoch milliseconds, or an ISO-ish string. Returns
/// `None` for anything unparseable; that is never an error.
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let epoch = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            if epoch > EPOCH_MILLIS_THRESHOLD {
                Utc.timestamp_millis_opt(epoch).single()
            } else {
                Utc.timestamp_opt(epoch, 0).single()
            }
        }
        Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

/// Parses an ISO-ish date string, tolerating missing offsets and
/// date-only values.
pub fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

/// Short calendar date, e.g. `Jan 1, 2021`.
pub fn format_short_date(dt: &DateTime<Utc>) -> String {
    dt.format("%b %-d, %Y").to_string()
}

/// Date plus time, for values that carried a time component.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%b %-d, %Y %H:%M").to_string()
}

/// Compacts large counts: `1500` → `1.5K`, `2_300_000` → `2.3M`.
pub fn format_count(n: f64) -> String {
    if n >= 1_000_000.0 {
        format!("{:.1}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.1}K", n / 1_000.0)
    } else if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Turns a raw payload key into a display label: splits camelCase,
/// replaces underscores, and capitalizes each word.
pub fn humanize_key(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch == '_' {
            spaced.push(' ');
        } else {
            if ch.is_uppercase() && !spaced.is_empty() && !spaced.ends_with(' ') {
                spaced.push(' ');
            }
            spaced.push(ch);
        }
    }

    spaced
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Relative timestamp for result cards: "Just now", "5m ago", "3h ago",
/// or the calendar date for anything older. Unparseable input is
/// returned as-is.
pub fn time_ago(checked_at: &str, now: DateTime<Utc>) -> String {
    let Some(then) = parse_date_str(checked_at) else {
        return checked_at.to_string();
    };

    let secs = (now - then).num_seconds();
    if secs < 60 {
        "Just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86400 {
        format!("{}h ago", secs / 3600)
    } else {
        format_short_date(&then)
    }
}

/// Shortens long URLs for display, keeping the first 37 characters.
pub fn truncate_url(url: &str) -> String {
    if url.chars().count() <= 40 {
        url.to_string()
    } else {
        let head: String = url.chars().take(37).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use serde_json::json;

    #[test]
    fn test_parse_date_epoch_seconds() {
        let dt = parse_date(&json!(1609459200)).unwrap();
        assert_eq!(dt.year(), 2021);
        assert_eq!(dt.month(), 1);
    }

    #[test]
    fn test_parse_date_epoch_millis() {
        let dt = parse_date(&json!(1609459200000i64)).unwrap();
        assert_eq!(dt.year(), 2021);
        assert_eq!(dt.month(), 1);
    }

    #[test]
    fn test_parse_date_strings() {
        assert!(parse_date(&json!("2021-01-01T00:00:00Z")).is_some());
        assert!(parse_date(&json!("2021-01-01T00:00:00.123456")).is_some());
        assert!(parse_date(&json!("2021-01-01 12:30:00")).is_some());
        assert!(parse_date(&json!("2021-01-01")).is_some());
        assert!(parse_date(&json!("yesterday")).is_none());
        assert!(parse_date(&json!(true)).is_none());
    }

    #[test]
    fn test_format_short_date() {
        let dt = parse_date(&json!(1609459200)).unwrap();
        assert_eq!(format_short_date(&dt), "Jan 1, 2021");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0.0), "0");
        assert_eq!(format_count(999.0), "999");
        assert_eq!(format_count(1500.0), "1.5K");
        assert_eq!(format_count(2_300_000.0), "2.3M");
    }

    #[test]
    fn test_humanize_key() {
        assert_eq!(humanize_key("follower_count"), "Follower Count");
        assert_eq!(humanize_key("followerCount"), "Follower Count");
        assert_eq!(humanize_key("bio"), "Bio");
    }

    #[test]
    fn test_time_ago() {
        let now = parse_date_str("2024-05-01T12:00:00Z").unwrap();
        assert_eq!(time_ago("2024-05-01T11:59:30Z", now), "Just now");
        assert_eq!(time_ago("2024-05-01T11:55:00Z", now), "5m ago");
        assert_eq!(time_ago("2024-05-01T09:00:00Z", now), "3h ago");
        assert_eq!(time_ago("2024-04-01T12:00:00Z", now), "Apr 1, 2024");
        assert_eq!(time_ago("garbage", now), "garbage");
    }

    #[test]
    fn test_truncate_url() {
        let short = "https://example.com";
        assert_eq!(truncate_url(short), short);

        let long = "https://example.com/a/very/long/path/that/never/ends";
        let truncated = truncate_url(long);
        assert_eq!(truncated.chars().count(), 40);
        assert!(truncated.ends_with("..."));
    }
}
