//! US Pacific calendar dates for tinderbox build timestamps.
//!
//! Tinderbox folders are named after the Unix time of the build, while users
//! ask for builds by their Pacific-time day. Uses the rules in force since
//! 2007: daylight time from the second Sunday of March 02:00 to the first
//! Sunday of November 02:00.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Weekday};

const STANDARD_OFFSET_HOURS: i64 = -8;

/// Pacific calendar date of a Unix timestamp.
pub(crate) fn pacific_date(timestamp: i64) -> Option<NaiveDate> {
    let utc = DateTime::from_timestamp(timestamp, 0)?.naive_utc();
    let standard = utc + TimeDelta::hours(STANDARD_OFFSET_HOURS);
    let local = if is_daylight_time(standard)? {
        standard + TimeDelta::hours(1)
    } else {
        standard
    };
    Some(local.date())
}

/// Whether `standard` (local standard time) falls in daylight saving time.
fn is_daylight_time(standard: NaiveDateTime) -> Option<bool> {
    let year = chrono::Datelike::year(&standard);
    let starts =
        NaiveDate::from_weekday_of_month_opt(year, 3, Weekday::Sun, 2)?.and_hms_opt(2, 0, 0)?;
    // 02:00 daylight time is 01:00 standard time.
    let ends =
        NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Sun, 1)?.and_hms_opt(1, 0, 0)?;
    Some(standard >= starts && standard < ends)
}
