//! Logical month/year attribution.
//!
//! Salary and card settlements posted on the first `BILL_CUTOFF_DAY` days of a
//! month are economically part of the previous month. Everything else belongs to
//! its calendar month.

use chrono::{Datelike, Days, NaiveDate};

use crate::classifier::Classifier;
use crate::error::{Result, TazrimError};
use crate::models::{check_year, MonthKey, Transaction};

pub const BILL_CUTOFF_DAY: u32 = 3;

/// Inclusive store window for a logical month: the 1st through the cutoff day of the next month.
pub fn month_window(target: MonthKey) -> (NaiveDate, NaiveDate) {
    let end = target.next().first_day() + Days::new(u64::from(BILL_CUTOFF_DAY - 1));
    (target.first_day(), end)
}

/// Inclusive store window for a logical year: Jan 1 through the cutoff day of next January.
pub fn year_window(year: i32) -> Result<(NaiveDate, NaiveDate)> {
    check_year(year)?;
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| TazrimError::InvalidDate(year.to_string()))?;
    let end = NaiveDate::from_ymd_opt(year + 1, 1, BILL_CUTOFF_DAY)
        .ok_or_else(|| TazrimError::InvalidDate((year + 1).to_string()))?;
    Ok((start, end))
}

pub fn belongs_to_month(
    target: MonthKey,
    date: NaiveDate,
    description: &str,
    amount: i64,
    classifier: &dyn Classifier,
) -> bool {
    let own = MonthKey::of(date);
    let early = date.day() <= BILL_CUTOFF_DAY;
    if own == target {
        !early || !classifier.classify(description, amount).is_billing()
    } else if own == target.next() {
        early && classifier.classify(description, amount).is_billing()
    } else {
        false
    }
}

pub fn logical_month(date: NaiveDate, description: &str, amount: i64, classifier: &dyn Classifier) -> MonthKey {
    let own = MonthKey::of(date);
    if date.day() <= BILL_CUTOFF_DAY && classifier.classify(description, amount).is_billing() {
        own.prev()
    } else {
        own
    }
}

pub fn logical_year(date: NaiveDate, description: &str, amount: i64, classifier: &dyn Classifier) -> i32 {
    if date.month() == 1
        && date.day() <= BILL_CUTOFF_DAY
        && classifier.classify(description, amount).is_billing()
    {
        date.year() - 1
    } else {
        date.year()
    }
}

/// Keeps the candidates attributed to `target`, newest first. Ties break on
/// larger absolute amount, then id, so output is stable.
pub fn attribute(target: MonthKey, candidates: Vec<Transaction>, classifier: &dyn Classifier) -> Vec<Transaction> {
    let mut kept: Vec<Transaction> = candidates
        .into_iter()
        .filter(|t| belongs_to_month(target, t.date, &t.description, t.amount, classifier))
        .collect();
    kept.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.amount.abs().cmp(&a.amount.abs()))
            .then_with(|| a.id.cmp(&b.id))
    });
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::PatternClassifier;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn month(y: i32, m: u32) -> MonthKey {
        MonthKey::new(y, m).unwrap()
    }

    fn txn(id: &str, date: NaiveDate, description: &str, amount: i64) -> Transaction {
        Transaction {
            id: id.to_string(),
            date,
            amount,
            description: description.to_string(),
            memo: String::new(),
            account: "bank".to_string(),
            category_id: None,
            is_transfer: false,
            is_investment: false,
            is_occasional_income: false,
            user_comment: None,
        }
    }

    #[test]
    fn test_early_salary_belongs_to_previous_month() {
        let c = PatternClassifier::default();
        let date = d(2024, 3, 2);
        assert!(!belongs_to_month(month(2024, 3), date, "משכורת", 1_000_000, &c));
        assert!(belongs_to_month(month(2024, 2), date, "משכורת", 1_000_000, &c));
    }

    #[test]
    fn test_early_non_salary_stays_in_its_month() {
        let c = PatternClassifier::default();
        let date = d(2024, 3, 2);
        assert!(belongs_to_month(month(2024, 3), date, "סופר", -5_000, &c));
        assert!(!belongs_to_month(month(2024, 2), date, "סופר", -5_000, &c));
    }

    #[test]
    fn test_after_cutoff_always_own_month() {
        let c = PatternClassifier::default();
        let date = d(2024, 3, 4);
        assert!(belongs_to_month(month(2024, 3), date, "משכורת", 1_000_000, &c));
        assert!(!belongs_to_month(month(2024, 2), date, "משכורת", 1_000_000, &c));
    }

    #[test]
    fn test_card_settlement_on_cutoff_day() {
        let c = PatternClassifier::default();
        let date = d(2024, 3, 3);
        assert!(belongs_to_month(month(2024, 2), date, "ישראכרט", -400_000, &c));
        assert!(!belongs_to_month(month(2024, 3), date, "ישראכרט", -400_000, &c));
    }

    #[test]
    fn test_negative_salary_text_is_not_salary() {
        let c = PatternClassifier::default();
        assert!(belongs_to_month(month(2024, 3), d(2024, 3, 1), "החזר משכורת", -2_000, &c));
    }

    #[test]
    fn test_december_to_january_rollover() {
        let c = PatternClassifier::default();
        let date = d(2024, 1, 1);
        assert!(belongs_to_month(month(2023, 12), date, "משכורת דצמבר", 1_000_000, &c));
        assert!(!belongs_to_month(month(2024, 1), date, "משכורת דצמבר", 1_000_000, &c));
        assert_eq!(logical_month(date, "משכורת דצמבר", 1_000_000, &c), month(2023, 12));
    }

    #[test]
    fn test_month_window_wraps_year() {
        assert_eq!(month_window(month(2023, 12)), (d(2023, 12, 1), d(2024, 1, 3)));
        assert_eq!(month_window(month(2024, 2)), (d(2024, 2, 1), d(2024, 3, 3)));
    }

    #[test]
    fn test_logical_year_early_january() {
        let c = PatternClassifier::default();
        assert_eq!(logical_year(d(2024, 1, 2), "משכורת", 900_000, &c), 2023);
        assert_eq!(logical_year(d(2024, 1, 2), "מכולת", -900, &c), 2024);
        assert_eq!(logical_year(d(2024, 1, 4), "משכורת", 900_000, &c), 2024);
        assert_eq!(logical_year(d(2024, 2, 1), "משכורת", 900_000, &c), 2024);
    }

    #[test]
    fn test_attribute_filters_and_orders() {
        let c = PatternClassifier::default();
        let candidates = vec![
            txn("a", d(2024, 1, 10), "קפה", -1_500),
            txn("b", d(2024, 2, 1), "משכורת פברואר", 1_300_000),
            txn("c", d(2024, 2, 2), "מכולת", -3_000),
            txn("d", d(2024, 1, 10), "דלק", -25_000),
            txn("e", d(2024, 1, 2), "ישראכרט", -50_000),
        ];
        let ids: Vec<String> = attribute(month(2024, 1), candidates, &c)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["b", "d", "a"]);
    }
}
