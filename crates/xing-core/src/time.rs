//! Time-of-day helpers.

use chrono::{Duration, Local, NaiveDateTime, SubsecRound, Timelike};

/// Number of minutes in a day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Current local wall-clock time, truncated to microseconds.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

/// Minutes since local midnight (0..1440).
pub fn minute_of_day(ts: NaiveDateTime) -> u32 {
    ts.hour() * 60 + ts.minute()
}

/// Distance between two minute-of-day values on the 24h clock face.
///
/// 23:58 and 00:02 are 4 minutes apart.
pub fn circular_distance(a: u32, b: u32) -> u32 {
    let diff = a.abs_diff(b) % MINUTES_PER_DAY;
    diff.min(MINUTES_PER_DAY - diff)
}

/// Human-readable age of a report, e.g. "3 minutes ago".
///
/// Negative ages (clock skew between devices) read as "just now".
pub fn format_age(age: Duration) -> String {
    let seconds = age.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    let (count, unit) = if seconds < 3600 {
        (age.num_minutes(), "minute")
    } else if seconds < 86_400 {
        (age.num_hours(), "hour")
    } else {
        (age.num_days(), "day")
    };
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    #[test]
    fn minute_of_day_ignores_date() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 1, 59)
            .unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 6, 30)
            .unwrap()
            .and_hms_opt(8, 1, 0)
            .unwrap();
        assert_eq!(minute_of_day(a), 481);
        assert_eq!(minute_of_day(a), minute_of_day(b));
    }

    #[test]
    fn circular_distance_wraps_midnight() {
        assert_eq!(circular_distance(23 * 60 + 58, 2), 4);
        assert_eq!(circular_distance(2, 23 * 60 + 58), 4);
        assert_eq!(circular_distance(23 * 60 + 59, 1), 2);
    }

    #[test]
    fn circular_distance_plain_cases() {
        assert_eq!(circular_distance(480, 480), 0);
        assert_eq!(circular_distance(480, 495), 15);
        assert_eq!(circular_distance(0, 720), 720);
    }

    #[test]
    fn format_age_buckets() {
        assert_eq!(format_age(Duration::seconds(-30)), "just now");
        assert_eq!(format_age(Duration::seconds(59)), "just now");
        assert_eq!(format_age(Duration::seconds(60)), "1 minute ago");
        assert_eq!(format_age(Duration::minutes(42)), "42 minutes ago");
        assert_eq!(format_age(Duration::minutes(125)), "2 hours ago");
        assert_eq!(format_age(Duration::hours(30)), "1 day ago");
        assert_eq!(format_age(Duration::days(9)), "9 days ago");
    }
}
