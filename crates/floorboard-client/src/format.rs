//! Display formatting for the feed and composer

use std::fmt::Display;

use chrono::{DateTime, Datelike, TimeZone};

/// Shown beside the composer
pub const COMMUNITY_GUIDELINES: [&str; 3] = ["Be respectful", "Stay on topic", "Keep it neighborly"];

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Relative day heading for a message timestamp.
///
/// Distance is counted in whole days rounded up, so anything within the
/// last 24 hours is "Today".
pub fn day_label<Tz>(timestamp: &DateTime<Tz>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let elapsed_ms = now
        .clone()
        .signed_duration_since(timestamp.clone())
        .num_milliseconds()
        .abs();
    let days = (elapsed_ms + DAY_MS - 1) / DAY_MS;

    match days {
        0 | 1 => "Today".to_string(),
        2 => "Yesterday".to_string(),
        3..=7 => format!("{} days ago", days - 1),
        _ if timestamp.year() == now.year() => timestamp.format("%b %-d").to_string(),
        _ => timestamp.format("%b %-d, %Y").to_string(),
    }
}

/// 12-hour clock time, e.g. "3:07 PM"
pub fn time_label<Tz>(timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp.format("%-I:%M %p").to_string()
}

pub fn message_count_label(count: usize) -> String {
    format!("{} messages", count)
}

/// Composer counter, e.g. "42/1000"
pub fn character_counter(len: usize, cap: usize) -> String {
    format!("{}/{}", len, cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_day_label_buckets() {
        let now = at(2025, 8, 10, 12, 0);
        assert_eq!(day_label(&now, &now), "Today");
        assert_eq!(day_label(&(now - Duration::hours(23)), &now), "Today");
        assert_eq!(day_label(&(now - Duration::hours(30)), &now), "Yesterday");
        assert_eq!(day_label(&(now - Duration::days(3)), &now), "2 days ago");
        assert_eq!(day_label(&(now - Duration::days(6) - Duration::hours(1)), &now), "6 days ago");
        assert_eq!(day_label(&at(2025, 1, 5, 9, 0), &now), "Jan 5");
        assert_eq!(day_label(&at(2024, 1, 5, 9, 0), &now), "Jan 5, 2024");
    }

    #[test]
    fn test_time_label() {
        assert_eq!(time_label(&at(2025, 1, 1, 15, 7)), "3:07 PM");
        assert_eq!(time_label(&at(2025, 1, 1, 0, 30)), "12:30 AM");
    }

    #[test]
    fn test_counters() {
        assert_eq!(message_count_label(4), "4 messages");
        assert_eq!(character_counter(42, 1000), "42/1000");
    }
}
