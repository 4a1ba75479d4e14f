//! Scheduled-time handling for satellite observations.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Nominal (scheduled) start time of an observation.
///
/// Sibling matching compares scheduled times, not the actual scan start,
/// so that every band of one scan lines up on the same key.
pub type ScheduledTime = DateTime<Utc>;

/// Label used when no layer is focused.
pub const EMPTY_TIME_LABEL: &str = "YYYY-MM-DD HH:MM";

/// Format a scheduled time the way layer lists and animation labels show it.
pub fn display_time(time: Option<&ScheduledTime>) -> String {
    match time {
        Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        None => EMPTY_TIME_LABEL.to_string(),
    }
}

/// Parse a date and time pair like `20150714` / `0030` (AHI file names).
pub fn parse_date_hhmm(date: &str, hhmm: &str) -> Option<ScheduledTime> {
    let naive_date = NaiveDate::parse_from_str(date, "%Y%m%d").ok()?;
    let naive_time = NaiveTime::parse_from_str(hhmm, "%H%M").ok()?;
    Some(Utc.from_utc_datetime(&NaiveDateTime::new(naive_date, naive_time)))
}

/// Parse GOES timestamp format: YYYYDDDHHMMSS (day of year format).
pub fn parse_day_of_year_timestamp(time_str: &str) -> Option<ScheduledTime> {
    if time_str.len() < 13 || !time_str.is_char_boundary(13) {
        return None;
    }

    let year: i32 = time_str[0..4].parse().ok()?;
    let day_of_year: u32 = time_str[4..7].parse().ok()?;
    let hour: u32 = time_str[7..9].parse().ok()?;
    let minute: u32 = time_str[9..11].parse().ok()?;
    let second: u32 = time_str[11..13].parse().ok()?;

    let naive_date = NaiveDate::from_yo_opt(year, day_of_year)?;
    let naive_time = NaiveTime::from_hms_opt(hour, minute, second)?;
    Some(Utc.from_utc_datetime(&NaiveDateTime::new(naive_date, naive_time)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_display_time() {
        let t = Utc.with_ymd_and_hms(2015, 7, 14, 0, 30, 0).unwrap();
        assert_eq!(display_time(Some(&t)), "2015-07-14 00:30");
        assert_eq!(display_time(None), EMPTY_TIME_LABEL);
    }

    #[test]
    fn test_parse_date_hhmm() {
        let t = parse_date_hhmm("20150714", "0030").unwrap();
        assert_eq!(t.year(), 2015);
        assert_eq!(t.month(), 7);
        assert_eq!(t.minute(), 30);
        assert!(parse_date_hhmm("2015071", "0030").is_none());
    }

    #[test]
    fn test_parse_day_of_year() {
        let t = parse_day_of_year_timestamp("2024352180021").unwrap();
        assert_eq!(t.month(), 12);
        assert_eq!(t.day(), 17);
        assert_eq!(t.hour(), 18);
        assert!(parse_day_of_year_timestamp("2024").is_none());
    }
}
