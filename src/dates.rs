use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

static ISO_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());
static POSTED_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^posted\s+").unwrap());
static DAYS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\+?\s+days?\s+ago$").unwrap());
static UNITS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+(minute|hour|day|week|month|year)s?\s+ago").unwrap());

/// Normalizes marketplace-style timestamps into absolute instants.
///
/// Handles, in priority order: ISO-looking absolute dates, "just now",
/// "30+ days ago" (the `+` is accepted but only the named days are
/// subtracted), generic "<n> <unit> ago" with fixed unit durations, and a
/// final generic absolute parse. Returns `None` for anything else; callers
/// treat absence as a valid outcome, not an error.
pub fn normalize_relative_date(input: &str, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }

    if ISO_PREFIX.is_match(text) {
        if let Some(date) = parse_absolute(text) {
            return Some(date);
        }
    }

    let lowered = text.to_lowercase();
    let normalized = POSTED_PREFIX.replace(&lowered, "");
    let normalized = normalized.trim();

    if normalized == "just now" {
        return Some(reference);
    }

    if let Some(caps) = DAYS_AGO.captures(normalized) {
        if let Ok(days) = caps[1].parse::<i64>() {
            return Some(reference - Duration::days(days));
        }
    }

    if let Some(caps) = UNITS_AGO.captures(normalized) {
        if let Ok(value) = caps[1].parse::<i64>() {
            let unit_secs: i64 = match &caps[2] {
                "minute" => 60,
                "hour" => 3600,
                "day" => 86_400,
                "week" => 7 * 86_400,
                "month" => 30 * 86_400,
                "year" => 365 * 86_400,
                _ => 0,
            };
            let secs = value.saturating_mul(unit_secs);
            // a zero magnitude ("0 minutes ago") falls through to the
            // generic parse below
            if secs > 0 {
                return Some(reference - Duration::seconds(secs));
            }
        }
    }

    parse_absolute(text)
}

fn parse_absolute(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(text) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(d.and_utc());
    }
    if let Ok(d) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(d.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
    }
    if let Ok(d) = DateTime::parse_from_rfc2822(text) {
        return Some(d.with_timezone(&Utc));
    }
    None
}

/// True when `date` is no later than `reference` and at most 24 hours old.
/// The 24h boundary itself is included; anything in the future is not.
pub fn is_within_last_24_hours(date: DateTime<Utc>, reference: DateTime<Utc>) -> bool {
    let elapsed = reference - date;
    if elapsed < Duration::zero() {
        return false;
    }
    elapsed <= Duration::hours(24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 21, 12, 0, 0).unwrap()
    }

    #[test]
    fn just_now_resolves_to_reference() {
        let t = reference();
        assert_eq!(normalize_relative_date("Just now", t), Some(t));
        assert_eq!(normalize_relative_date("JUST NOW", t), Some(t));
        assert_eq!(normalize_relative_date("Posted just now", t), Some(t));
    }

    #[test]
    fn hours_ago_subtracts_fixed_duration() {
        let t = reference();
        assert_eq!(
            normalize_relative_date("2 hours ago", t),
            Some(t - Duration::seconds(7200))
        );
        assert_eq!(
            normalize_relative_date("Posted 6 minutes ago", t),
            Some(t - Duration::seconds(360))
        );
        assert_eq!(
            normalize_relative_date("1 week ago", t),
            Some(t - Duration::days(7))
        );
        assert_eq!(
            normalize_relative_date("2 months ago", t),
            Some(t - Duration::days(60))
        );
        assert_eq!(
            normalize_relative_date("1 year ago", t),
            Some(t - Duration::days(365))
        );
    }

    #[test]
    fn plus_days_subtracts_only_named_days() {
        let t = reference();
        assert_eq!(
            normalize_relative_date("30+ days ago", t),
            Some(t - Duration::days(30))
        );
        assert_eq!(
            normalize_relative_date("1 day ago", t),
            Some(t - Duration::days(1))
        );
    }

    #[test]
    fn iso_text_parses_to_exact_instant() {
        let t = reference();
        let parsed = normalize_relative_date("2025-01-20T13:34:01.384Z", t).unwrap();
        assert_eq!(parsed, Utc.timestamp_millis_opt(1737380041384).unwrap());

        let day_only = normalize_relative_date("2025-01-20", t).unwrap();
        assert_eq!(day_only, Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap());
    }

    #[test]
    fn unrecognized_text_is_unparsable() {
        let t = reference();
        assert_eq!(normalize_relative_date("sometime", t), None);
        assert_eq!(normalize_relative_date("", t), None);
        assert_eq!(normalize_relative_date("   ", t), None);
    }

    #[test]
    fn zero_magnitude_falls_through_to_absolute_parse() {
        // "0 minutes ago" is not a usable relative offset and the raw text is
        // not an absolute date either
        assert_eq!(normalize_relative_date("0 minutes ago", reference()), None);
    }

    #[test]
    fn freshness_boundary_is_inclusive_at_24h() {
        let t = reference();
        assert!(is_within_last_24_hours(t - Duration::hours(24), t));
        assert!(!is_within_last_24_hours(t - Duration::hours(24) - Duration::seconds(1), t));
    }

    #[test]
    fn future_dates_are_excluded() {
        let t = reference();
        assert!(!is_within_last_24_hours(t + Duration::seconds(1), t));
        assert!(is_within_last_24_hours(t, t));
    }
}
