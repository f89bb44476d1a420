//! Date-time conversions between the wire format and `datetime-local` inputs
//!
//! The backend exchanges ISO-8601 instants; forms edit minute precision
//! values without a zone. Form values are interpreted as UTC.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// `datetime-local` input format
pub const FORM_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
/// Format used in list and detail screens
pub const DISPLAY_DATETIME_FORMAT: &str = "%d/%m/%y %H:%M";

/// Value for a `datetime-local` input; empty when unset
pub fn to_form_value(value: Option<&DateTime<Utc>>) -> String {
    value
        .map(|dt| dt.format(FORM_DATETIME_FORMAT).to_string())
        .unwrap_or_default()
}

/// Parse a submitted form value
///
/// Accepts `YYYY-MM-DDTHH:MM`, the same with seconds, or a full RFC 3339
/// instant. Blank or unparsable input yields `None`.
pub fn from_form_value(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    [FORM_DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Pre-filled value for a new record: start of the given day
pub fn default_form_value(now: DateTime<Utc>) -> String {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.format(FORM_DATETIME_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn display(value: Option<&DateTime<Utc>>) -> String {
    value
        .map(|dt| dt.format(DISPLAY_DATETIME_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_value_round_trip() {
        let dt = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 0).unwrap();
        let value = to_form_value(Some(&dt));
        assert_eq!(value, "2021-03-04T05:06");
        assert_eq!(from_form_value(&value), Some(dt));
        assert_eq!(to_form_value(None), "");
    }

    #[test]
    fn test_from_form_value_variants() {
        let expected = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(from_form_value("2021-03-04T05:06:07"), Some(expected));
        assert_eq!(from_form_value("2021-03-04T07:06:07+02:00"), Some(expected));
        assert_eq!(from_form_value("  "), None);
        assert_eq!(from_form_value("yesterday"), None);
    }

    #[test]
    fn test_default_and_display() {
        let now = Utc.with_ymd_and_hms(2021, 12, 31, 18, 45, 10).unwrap();
        assert_eq!(default_form_value(now), "2021-12-31T00:00");
        assert_eq!(display(Some(&now)), "31/12/21 18:45");
        assert_eq!(display(None), "");
    }
}
