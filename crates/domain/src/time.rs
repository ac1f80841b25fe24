//! Time and HTTP date helpers.

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// UTC timestamp used for `Date` headers.
pub type Timestamp = DateTime<Utc>;

/// Rendered in place of the current time when the wall clock is not synchronised.
pub const UNSYNCED_HTTP_DATE: &str = "Sat, 01 Jan 2000 00:00:00 GMT";

/// Earliest year a wall clock is trusted to have been synchronised.
const FIRST_TRUSTED_YEAR: i32 = 2001;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Whether a wall-clock reading looks like it came from a synchronised clock.
///
/// Boards without a battery-backed RTC boot at the epoch (or at 2000-01-01)
/// until a network time sync happens.
#[must_use]
pub fn is_plausible(ts: Timestamp) -> bool {
    ts.year() >= FIRST_TRUSTED_YEAR
}

/// Format a timestamp as an RFC 1123 date: `Sat, 01 Jan 2000 00:01:15 GMT`.
///
/// `None` yields [`UNSYNCED_HTTP_DATE`].
#[must_use]
pub fn http_date(ts: Option<Timestamp>) -> String {
    match ts {
        Some(ts) => ts.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        None => UNSYNCED_HTTP_DATE.to_string(),
    }
}

/// Build a timestamp from calendar fields, as reported by an external clock.
///
/// Returns `None` for impossible dates.
#[must_use]
pub fn from_calendar(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<Timestamp> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_format_rfc1123_date() {
        let ts = from_calendar(2017, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(http_date(Some(ts)), "Sun, 05 Mar 2017 07:08:09 GMT");
    }

    #[test]
    fn should_fall_back_to_placeholder_without_clock() {
        assert_eq!(http_date(None), UNSYNCED_HTTP_DATE);
    }

    #[test]
    fn should_distrust_epoch_readings() {
        let epoch = from_calendar(1970, 1, 1, 0, 0, 0).unwrap();
        assert!(!is_plausible(epoch));
        assert!(is_plausible(now()));
    }

    #[test]
    fn should_reject_impossible_calendar_date() {
        assert!(from_calendar(2021, 2, 30, 0, 0, 0).is_none());
    }
}
