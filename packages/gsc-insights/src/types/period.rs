//! Closed date ranges used as the unit of comparison.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{InsightsError, Result};

/// A closed date range `[start, end]`, both inclusive, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawPeriod> for Period {
    type Error = InsightsError;

    fn try_from(raw: RawPeriod) -> Result<Self> {
        Period::new(raw.start, raw.end)
    }
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(InsightsError::validation(format!(
                "period start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` dates.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| InsightsError::validation(format!("invalid date '{}': {}", s, e)))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    /// The `days`-long period ending on `end` inclusive.
    pub fn last_days(days: u32, end: NaiveDate) -> Result<Self> {
        if days == 0 {
            return Err(InsightsError::validation("period must span at least one day"));
        }
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days) - 1))
            .ok_or_else(|| out_of_range(days, end))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered, inclusive.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The equal-length period immediately before this one.
    pub fn preceding(&self) -> Result<Self> {
        let end = self.start.checked_sub_signed(Duration::days(1));
        let start = end.and_then(|end| end.checked_sub_signed(Duration::days(self.days() - 1)));
        match (start, end) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(InsightsError::validation(format!(
                "no representable period precedes {}",
                self
            ))),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn out_of_range(days: u32, end: NaiveDate) -> InsightsError {
    InsightsError::validation(format!("{} days before {} is out of range", days, end))
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_rejects_inverted_range() {
        assert!(Period::new(date("2024-02-01"), date("2024-01-01")).is_err());
        assert!(Period::new(date("2024-01-01"), date("2024-01-01")).is_ok());
    }

    #[test]
    fn test_days_and_preceding() {
        let period = Period::parse("2024-03-01", "2024-03-28").unwrap();
        assert_eq!(period.days(), 28);

        let before = period.preceding().unwrap();
        assert_eq!(before.end(), date("2024-02-29"));
        assert_eq!(before.days(), 28);
        assert_eq!(before.start(), date("2024-02-02"));
    }

    #[test]
    fn test_date_underflow_is_validation_error() {
        let first = Period::new(NaiveDate::MIN, NaiveDate::MIN).unwrap();
        let err = first.preceding().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);

        // The day before exists, but not the full window.
        let near_start = Period::new(
            NaiveDate::MIN + Duration::days(2),
            NaiveDate::MIN + Duration::days(10),
        )
        .unwrap();
        let err = near_start.preceding().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Validation);

        assert!(Period::last_days(u32::MAX, date("2024-01-07")).is_err());
    }

    #[test]
    fn test_last_days() {
        let period = Period::last_days(7, date("2024-01-07")).unwrap();
        assert_eq!(period.start(), date("2024-01-01"));
        assert!(period.contains(date("2024-01-04")));
        assert!(!period.contains(date("2024-01-08")));
        assert!(Period::last_days(0, date("2024-01-07")).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: std::result::Result<Period, _> =
            serde_json::from_str(r#"{"start":"2024-01-01","end":"2024-01-31"}"#);
        assert!(ok.is_ok());
        let bad: std::result::Result<Period, _> =
            serde_json::from_str(r#"{"start":"2024-02-01","end":"2024-01-31"}"#);
        assert!(bad.is_err());
    }
}
