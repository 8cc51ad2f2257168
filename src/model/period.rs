use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A half-open `[start, end)` date interval. A billing period is identified by its `start`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimePeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimePeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The calendar month that starts on the first day of `date`'s month.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = first_of_month(date);
        let end = start
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl Display for TimePeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Normalizes `date` to day 1 of its month.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month, so `with_day(1)` cannot fail.
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_month_of() {
        let p = TimePeriod::month_of(date("2024-02-17"));
        assert_eq!(p.start(), date("2024-02-01"));
        assert_eq!(p.end(), date("2024-03-01"));
    }

    #[test]
    fn test_month_of_december() {
        let p = TimePeriod::month_of(date("2023-12-31"));
        assert_eq!(p.end(), date("2024-01-01"));
    }

    #[test]
    fn test_deserialize_wire_format() {
        let p: TimePeriod =
            serde_json::from_str(r#"{"Start": "2024-01-01", "End": "2024-02-01"}"#).unwrap();
        assert_eq!(p, TimePeriod::new(date("2024-01-01"), date("2024-02-01")));
        assert_eq!(p.to_string(), "2024-01-01..2024-02-01");
    }
}
