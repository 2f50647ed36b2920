use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A calendar month as entered in a `YYYY-MM` month picker.
///
/// Field order matters: the derived `Ord` compares year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

#[derive(Debug, Error, PartialEq)]
#[error("'{0}' is not a valid year-month (expected YYYY-MM)")]
pub struct InvalidYearMonth(pub String);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Canonical persisted form: the first day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }
}

impl FromStr for YearMonth {
    type Err = InvalidYearMonth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidYearMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = InvalidYearMonth;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_picker_value() {
        let ym: YearMonth = "2021-03".parse().unwrap();
        assert_eq!(ym.year(), 2021);
        assert_eq!(ym.month(), 3);
        assert_eq!(ym.to_string(), "2021-03");
    }

    #[test]
    fn test_first_day_is_canonical_date() {
        let ym: YearMonth = "2019-11".parse().unwrap();
        assert_eq!(ym.first_day(), NaiveDate::from_ymd_opt(2019, 11, 1).unwrap());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!("2021-13".parse::<YearMonth>().is_err());
        assert!("2021/03".parse::<YearMonth>().is_err());
        assert!("21-03".parse::<YearMonth>().is_err());
        assert!("".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_ordering_is_chronological() {
        let a: YearMonth = "2020-12".parse().unwrap();
        let b: YearMonth = "2021-01".parse().unwrap();
        assert!(a < b);
    }
}
