//! Calendar-date helpers shared by the parsers and downstream crates.
//!
//! Polars stores `Date` columns as `i32` days since the Unix epoch; these
//! functions convert between that physical value and `chrono::NaiveDate`.

use chrono::{Duration, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

fn unix_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

pub fn date_to_epoch_days(date: NaiveDate) -> i32 {
    let days = date.signed_duration_since(unix_epoch()).num_days();
    i32::try_from(days).unwrap_or(if days < 0 { i32::MIN } else { i32::MAX })
}

pub fn epoch_days_to_date(days: i32) -> Option<NaiveDate> {
    unix_epoch().checked_add_signed(Duration::days(i64::from(days)))
}

/// Parses a calendar date, accepting plain dates and timestamps (the time
/// part is dropped). Returns `None` for blanks and textual nulls.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() || is_textual_null(trimmed) {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    None
}

pub(crate) fn is_textual_null(value: &str) -> bool {
    value.eq_ignore_ascii_case("nan")
        || value.eq_ignore_ascii_case("nat")
        || value.eq_ignore_ascii_case("none")
        || value.eq_ignore_ascii_case("null")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_days_round_trip_known_dates() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(date_to_epoch_days(epoch), 0);

        let day = NaiveDate::from_ymd_opt(2023, 3, 15).unwrap();
        assert_eq!(date_to_epoch_days(day), 19_431);
        assert_eq!(epoch_days_to_date(19_431), Some(day));
    }

    #[test]
    fn parse_date_accepts_timestamps_and_day_first() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 15).unwrap();
        assert_eq!(parse_date("2023-03-15"), Some(expected));
        assert_eq!(parse_date(" 2023-03-15 00:00:00 "), Some(expected));
        assert_eq!(parse_date("2023-03-15T10:30:00"), Some(expected));
        assert_eq!(parse_date("15/03/2023"), Some(expected));
        assert_eq!(parse_date("15-03-2023"), Some(expected));
    }

    #[test]
    fn parse_date_rejects_blanks_and_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("NaN"), None);
        assert_eq!(parse_date("yesterday"), None);
    }
}
