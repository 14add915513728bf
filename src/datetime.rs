//! Canonical-timezone clock.
//!
//! The park lives in US Mountain Time and every day-boundary decision
//! (cache day-scope, history pruning, "did today's run succeed") is made
//! in that zone, regardless of where the host happens to run. Do not
//! substitute host-local time here.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use chrono_tz::US::Mountain;

/// The single reference timezone for all date comparisons.
pub const CANONICAL_TZ: Tz = Mountain;

/// Current time in the canonical timezone.
pub fn now_canonical() -> DateTime<Tz> {
    Utc::now().with_timezone(&CANONICAL_TZ)
}

/// Today's calendar date in the canonical timezone.
pub fn today_canonical() -> NaiveDate {
    now_canonical().date_naive()
}

/// Today's date as the `YYYY-MM-DD` string used for cache day-scoping
/// and history lookups.
pub fn today_string() -> String {
    today_canonical().format("%Y-%m-%d").to_string()
}

/// Human-readable date, e.g. "January 5, 2025".
pub fn format_date_readable(dt: &DateTime<Tz>) -> String {
    // %-d strips the leading zero on Unix; parkdaily targets Linux hosts.
    dt.format("%B %-d, %Y").to_string()
}

/// Lowercase 12-hour time without a leading zero, e.g. "6:05 am".
pub fn format_time_12hr(dt: &DateTime<Tz>) -> String {
    dt.format("%-I:%M %p").to_string().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn today_string_is_iso_date() {
        let today = today_string();
        assert_eq!(today.len(), 10);
        assert!(NaiveDate::parse_from_str(&today, "%Y-%m-%d").is_ok());
    }

    #[test]
    fn readable_date_has_no_leading_zero() {
        let dt = CANONICAL_TZ.with_ymd_and_hms(2025, 1, 5, 8, 30, 0).unwrap();
        assert_eq!(format_date_readable(&dt), "January 5, 2025");
        assert_eq!(format_time_12hr(&dt), "8:30 am");
    }

    #[test]
    fn canonical_date_can_disagree_with_utc() {
        // Late evening Mountain Time is already the next day in UTC; the
        // canonical date must come from the Mountain clock.
        let dt = CANONICAL_TZ.with_ymd_and_hms(2025, 7, 1, 22, 30, 0).unwrap();
        assert_eq!(dt.date_naive().to_string(), "2025-07-01");
        assert_eq!(dt.with_timezone(&Utc).date_naive().to_string(), "2025-07-02");
    }
}
