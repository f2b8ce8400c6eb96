use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a calendar date from text.
///
/// Accepts plain dates, year-month (`2024-01`, read as the first of the
/// month), naive ISO datetimes and RFC 3339 timestamps. The time of day is
/// discarded.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date);
        }
    }

    if is_year_month(text) {
        return NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d").ok();
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Convert epoch milliseconds (the default JSON date encoding of dataframe
/// libraries) to a UTC calendar date.
pub fn from_epoch_millis(millis: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

fn is_year_month(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_plain_dates() {
        assert_eq!(parse_date_text("2024-03-31"), date(2024, 3, 31));
        assert_eq!(parse_date_text("2024/03/31"), date(2024, 3, 31));
        assert_eq!(parse_date_text("03/31/2024"), date(2024, 3, 31));
    }

    #[test]
    fn test_year_month_is_first_of_month() {
        assert_eq!(parse_date_text("2024-02"), date(2024, 2, 1));
        assert_eq!(parse_date_text("2024-13"), None);
    }

    #[test]
    fn test_iso_datetimes() {
        assert_eq!(parse_date_text("2024-01-31T00:00:00.000"), date(2024, 1, 31));
        assert_eq!(parse_date_text("2024-01-31 00:00:00"), date(2024, 1, 31));
        assert_eq!(parse_date_text("2024-01-31T00:00:00.000Z"), date(2024, 1, 31));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(parse_date_text(""), None);
        assert_eq!(parse_date_text("next month"), None);
        assert_eq!(parse_date_text("2024-02-30"), None);
    }

    #[test]
    fn test_epoch_millis() {
        // 2024-01-31T00:00:00Z
        assert_eq!(from_epoch_millis(1_706_659_200_000), date(2024, 1, 31));
    }
}
