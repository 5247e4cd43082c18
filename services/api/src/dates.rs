//! Date parameters and ranges

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// Parse an instant written as RFC 3339, a naive date-time (read as UTC) or
/// a plain `YYYY-MM-DD` date (midnight UTC)
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Parse the upper bound of a range; a date-only value covers the whole day
pub fn parse_range_end(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => date
            .and_hms_micro_opt(23, 59, 59, 999_999)
            .map(|end| end.and_utc()),
        Err(_) => parse_instant(value),
    }
}

/// Raw `startDate`/`endDate` query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Inclusive creation-date range; either bound may be open
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Parse and check the bounds; blank values are treated as absent
    pub fn from_params(params: &DateRangeParams) -> ApiResult<Self> {
        let start = match params.start_date.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(parse_instant(raw).ok_or_else(|| {
                ApiError::BadRequest(format!("Invalid startDate '{}'", raw))
            })?),
            None => None,
        };

        let end = match params.end_date.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(raw) => Some(parse_range_end(raw).ok_or_else(|| {
                ApiError::BadRequest(format!("Invalid endDate '{}'", raw))
            })?),
            None => None,
        };

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ApiError::BadRequest(
                    "startDate must not be later than endDate".to_string(),
                ));
            }
        }

        Ok(Self { start, end })
    }

    /// Like [`DateRange::from_params`] but both bounds must be given
    pub fn closed_from_params(params: &DateRangeParams) -> ApiResult<Self> {
        let range = Self::from_params(params)?;
        if range.start.is_none() || range.end.is_none() {
            return Err(ApiError::BadRequest(
                "startDate and endDate are required".to_string(),
            ));
        }
        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn params(start: Option<&str>, end: Option<&str>) -> DateRangeParams {
        DateRangeParams {
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_instant_formats() {
        let rfc = parse_instant("2024-03-01T10:30:00+02:00").unwrap();
        assert_eq!(rfc.hour(), 8);

        let naive = parse_instant("2024-03-01T10:30:00").unwrap();
        assert_eq!(naive.hour(), 10);

        let date = parse_instant("2024-03-01").unwrap();
        assert_eq!((date.day(), date.hour()), (1, 0));

        assert!(parse_instant("yesterday").is_none());
    }

    #[test]
    fn test_date_only_end_covers_whole_day() {
        let end = parse_range_end("2024-03-01").unwrap();
        assert_eq!((end.day(), end.hour(), end.minute()), (1, 23, 59));

        let exact = parse_range_end("2024-03-01T12:00:00Z").unwrap();
        assert_eq!(exact.hour(), 12);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let result = DateRange::from_params(&params(Some("2024-05-01"), Some("2024-04-01")));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_same_day_range_is_accepted() {
        let range = DateRange::from_params(&params(Some("2024-05-01"), Some("2024-05-01"))).unwrap();
        assert!(range.start.unwrap() < range.end.unwrap());
    }

    #[test]
    fn test_blank_bounds_are_open() {
        let range = DateRange::from_params(&params(Some("  "), None)).unwrap();
        assert_eq!(range, DateRange::default());
        assert!(DateRange::closed_from_params(&params(Some("2024-05-01"), None)).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(DateRange::from_params(&params(Some("soon"), None)).is_err());
    }
}
