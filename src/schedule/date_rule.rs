use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use crate::error::{DateManagerError, Result};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Validated pair of target and cutoff dates
///
/// The target is what gets written as the next payment date. Any subscription
/// whose last payment is strictly after the cutoff is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRule {
    target_date: DateTime<Utc>,
    cutoff_date: DateTime<Utc>,
}

impl DateRule {
    /// Parse both inputs and require `target > cutoff`
    pub fn validate(target_raw: &str, cutoff_raw: &str) -> Result<Self> {
        let target_date = parse_date(target_raw)?;
        let cutoff_date = parse_date(cutoff_raw)?;
        Self::new(target_date, cutoff_date)
    }

    pub fn new(target_date: DateTime<Utc>, cutoff_date: DateTime<Utc>) -> Result<Self> {
        if target_date <= cutoff_date {
            return Err(DateManagerError::OrderingViolation {
                target: target_date.format("%Y-%m-%d %H:%M:%S").to_string(),
                cutoff: cutoff_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            });
        }

        Ok(Self { target_date, cutoff_date })
    }

    pub fn target_date(&self) -> DateTime<Utc> {
        self.target_date
    }

    pub fn cutoff_date(&self) -> DateTime<Utc> {
        self.cutoff_date
    }

    /// True when a payment at `last_payment` protects the record from update
    pub fn is_recent(&self, last_payment: DateTime<Utc>) -> bool {
        last_payment > self.cutoff_date
    }
}

/// Parse a calendar date or date-time. Date-only input resolves to midnight UTC.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DateManagerError::InvalidDate("date is empty".to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(naive.and_utc());
            }
        }
    }

    Err(DateManagerError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_target_after_cutoff_is_valid() {
        let rule = DateRule::validate("2024-02-01", "2024-01-15").unwrap();
        assert_eq!(rule.target_date(), Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(rule.cutoff_date(), Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_target_before_cutoff_is_rejected() {
        let err = DateRule::validate("2024-01-01", "2024-01-05").unwrap_err();
        assert!(matches!(err, DateManagerError::OrderingViolation { .. }));
    }

    #[test]
    fn test_equal_dates_are_rejected() {
        let err = DateRule::validate("2024-01-05", "2024-01-05").unwrap_err();
        assert!(matches!(err, DateManagerError::OrderingViolation { .. }));
    }

    #[test]
    fn test_unparseable_date_is_invalid() {
        assert!(matches!(
            DateRule::validate("next tuesday", "2024-01-05"),
            Err(DateManagerError::InvalidDate(_))
        ));
        assert!(matches!(
            DateRule::validate("2024-02-01", "   "),
            Err(DateManagerError::InvalidDate(_))
        ));
        assert!(matches!(
            DateRule::validate("2024-02-30", "2024-01-05"),
            Err(DateManagerError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_accepts_datetime_and_picker_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap();
        assert_eq!(parse_date("2024-03-09 14:30:00").unwrap(), expected);
        assert_eq!(parse_date("2024-03-09T14:30").unwrap(), expected);
        assert_eq!(parse_date("2024-03-09T15:30:00+01:00").unwrap(), expected);
        assert_eq!(
            parse_date("03/09/2024").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_recency_is_strict() {
        let rule = DateRule::validate("2024-02-01", "2024-01-15").unwrap();
        assert!(!rule.is_recent(rule.cutoff_date()));
        assert!(rule.is_recent(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 1).unwrap()));
    }

    #[test]
    fn test_any_later_target_validates() {
        let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for offset in [1i64, 60, 86_400, 31_536_000] {
            let target = cutoff + chrono::Duration::seconds(offset);
            assert!(DateRule::new(target, cutoff).is_ok());
            assert!(DateRule::new(cutoff, target).is_err());
        }
    }
}
