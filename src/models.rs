use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Serialize, Serializer};

use crate::error::{Result, TazrimError};

/// Supported calendar years. Month windows and look-backs stay well inside
/// chrono's representable range.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// Largest absolute amount accepted, in agorot (₪10,000,000,000).
pub const MAX_ABS_AMOUNT: i64 = 1_000_000_000_000;

pub fn check_year(year: i32) -> Result<()> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(TazrimError::InvalidDate(format!(
            "year {year} outside {MIN_YEAR}-{MAX_YEAR}"
        )));
    }
    Ok(())
}

/// A calendar (year, month) pair. Always valid once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey(NaiveDate);

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(TazrimError::InvalidMonth(month));
        }
        check_year(year)?;
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| TazrimError::InvalidDate(format!("{year:04}-{month:02}")))
    }

    pub fn of(date: NaiveDate) -> Self {
        Self(date.with_day0(0).unwrap_or(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().0 - Days::new(1)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + Months::new(1))
    }

    pub fn prev(&self) -> Self {
        Self(self.0 - Months::new(1))
    }

    /// The `count` months strictly before this one, most recent first.
    pub fn preceding(&self, count: u32) -> Vec<Self> {
        (1..=count).map(|n| Self(self.0 - Months::new(n))).collect()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for MonthKey {
    type Err = TazrimError;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let (y, m) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| TazrimError::InvalidDate(s.to_string()))?;
        let year: i32 = y.parse().map_err(|_| TazrimError::InvalidDate(s.to_string()))?;
        let month: u32 = m.parse().map_err(|_| TazrimError::InvalidDate(s.to_string()))?;
        Self::new(year, month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    /// Signed amount in agorot.
    pub amount: i64,
    pub description: String,
    pub memo: String,
    pub account: String,
    pub category_id: Option<i64>,
    pub is_transfer: bool,
    pub is_investment: bool,
    pub is_occasional_income: bool,
    pub user_comment: Option<String>,
}

impl Transaction {
    pub fn kind(&self) -> TxnKind {
        if self.amount < 0 {
            TxnKind::Expense
        } else {
            TxnKind::Income
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub is_variable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub description: String,
    pub category_id: i64,
}

/// One record from the ingestion feed, before identity assignment.
#[derive(Debug, Clone)]
pub struct RawTransaction {
    pub date: NaiveDate,
    pub amount: i64,
    pub description: String,
    pub memo: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_key_rejects_bad_month() {
        assert!(matches!(MonthKey::new(2024, 0), Err(TazrimError::InvalidMonth(0))));
        assert!(matches!(MonthKey::new(2024, 13), Err(TazrimError::InvalidMonth(13))));
    }

    #[test]
    fn test_month_key_rejects_unsupported_years() {
        assert!(matches!(MonthKey::new(262_142, 12), Err(TazrimError::InvalidDate(_))));
        assert!(matches!(MonthKey::new(0, 1), Err(TazrimError::InvalidDate(_))));
        assert!("262142-12".parse::<MonthKey>().is_err());

        let last = MonthKey::new(MAX_YEAR, 12).unwrap();
        assert_eq!(last.next().to_string(), "10000-01");
        assert_eq!(last.last_day(), NaiveDate::from_ymd_opt(9999, 12, 31).unwrap());
        let first = MonthKey::new(MIN_YEAR, 1).unwrap();
        assert_eq!(first.preceding(3).len(), 3);
    }

    #[test]
    fn test_month_key_wraps_year() {
        let dec = MonthKey::new(2023, 12).unwrap();
        assert_eq!(dec.next(), MonthKey::new(2024, 1).unwrap());
        let jan = MonthKey::new(2024, 1).unwrap();
        assert_eq!(jan.prev(), dec);
    }

    #[test]
    fn test_last_day_handles_leap_year() {
        let feb = MonthKey::new(2024, 2).unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_preceding_months() {
        let feb = MonthKey::new(2024, 2).unwrap();
        let months: Vec<String> = feb.preceding(3).iter().map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2024-01", "2023-12", "2023-11"]);
    }

    #[test]
    fn test_parse_month_key() {
        let m: MonthKey = "2024-03".parse().unwrap();
        assert_eq!((m.year(), m.month()), (2024, 3));
        assert!("2024".parse::<MonthKey>().is_err());
        assert!("2024-13".parse::<MonthKey>().is_err());
    }

    #[test]
    fn test_of_truncates_to_first_day() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
        assert_eq!(MonthKey::of(d).first_day(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }
}
