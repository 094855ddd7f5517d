//! Timestamp utilities

use chrono::{DateTime, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Date as shown in messages, e.g. "14 Sep 2019"
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d %b %Y").to_string())
        .unwrap_or_default()
}

/// Timestamp as shown in messages, e.g. "01 Jul 2019, 23:59 UTC"
pub fn format_datetime(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%d %b %Y, %H:%M UTC").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_returns_recent_timestamp() {
        let timestamp = now();
        assert!(timestamp.timestamp() > 946_684_800);
        assert!(timestamp.timestamp() < 4_102_444_800);
    }

    #[test]
    fn test_format_date() {
        let d = NaiveDate::from_ymd_opt(2019, 9, 14);
        assert_eq!(format_date(d), "14 Sep 2019");
        assert_eq!(format_date(None), "");
    }

    #[test]
    fn test_format_datetime() {
        let ts = Utc.with_ymd_and_hms(2019, 7, 1, 23, 59, 0).single();
        assert_eq!(format_datetime(ts), "01 Jul 2019, 23:59 UTC");
    }
}
