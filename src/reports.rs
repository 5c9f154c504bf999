use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::attribution::{self, BILL_CUTOFF_DAY};
use crate::categories::list_categories;
use crate::classifier::Classifier;
use crate::error::Result;
use crate::ledger::transactions_between;
use crate::models::{MonthKey, Transaction};

pub const DEFAULT_WINDOW_MONTHS: u32 = 3;

// ---------------------------------------------------------------------------
// Attributed transactions
// ---------------------------------------------------------------------------

pub fn attributed_transactions(
    conn: &Connection,
    classifier: &dyn Classifier,
    month: MonthKey,
) -> Result<Vec<Transaction>> {
    let (from, to) = attribution::month_window(month);
    let candidates = transactions_between(conn, from, to)?;
    Ok(attribution::attribute(month, candidates, classifier))
}

/// Months with data, newest first. A month whose data includes an early-day
/// posting also lists the previous logical month, since billing postings on
/// those days may belong there.
pub fn available_months(conn: &Connection) -> Result<Vec<MonthKey>> {
    let mut stmt = conn.prepare(
        "SELECT CAST(substr(date, 1, 4) AS INTEGER), CAST(substr(date, 6, 2) AS INTEGER), \
         MIN(CAST(substr(date, 9, 2) AS INTEGER)) \
         FROM transactions GROUP BY substr(date, 1, 7)",
    )?;
    let stamps: Vec<(i32, u32, u32)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut months = Vec::new();
    for (year, month, first_day) in stamps {
        let key = MonthKey::new(year, month)?;
        months.push(key);
        if first_day <= BILL_CUTOFF_DAY {
            months.push(key.prev());
        }
    }
    months.sort_unstable_by(|a, b| b.cmp(a));
    months.dedup();
    Ok(months)
}

// ---------------------------------------------------------------------------
// Monthly summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CategoryBucket {
    /// `None` is the uncategorized bucket.
    pub category_id: Option<i64>,
    pub income: i64,
    pub expense: i64,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferTotals {
    pub incoming: i64,
    pub outgoing: i64,
    pub net: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlySummary {
    pub month: MonthKey,
    pub income: i64,
    pub expenses: i64,
    pub balance: i64,
    pub transfers: TransferTotals,
    pub investments: i64,
    pub transaction_count: usize,
    pub categories: Vec<CategoryBucket>,
    pub transfer_transactions: Vec<Transaction>,
    pub investment_transactions: Vec<Transaction>,
}

impl MonthlySummary {
    pub fn category(&self, category_id: Option<i64>) -> Option<&CategoryBucket> {
        self.categories.iter().find(|b| b.category_id == category_id)
    }

    pub fn category_expense(&self, category_id: Option<i64>) -> i64 {
        self.category(category_id).map_or(0, |b| b.expense)
    }

    fn counted(&self) -> impl Iterator<Item = &Transaction> {
        self.categories.iter().flat_map(|b| b.transactions.iter())
    }

    /// Positive counted income not flagged occasional.
    pub fn regular_income(&self) -> i64 {
        self.counted()
            .filter(|t| t.amount > 0 && !t.is_occasional_income)
            .map(|t| t.amount)
            .sum()
    }

    pub fn occasional_income(&self) -> i64 {
        self.counted()
            .filter(|t| t.amount > 0 && t.is_occasional_income)
            .map(|t| t.amount)
            .sum()
    }
}

/// Buckets attributed transactions: transfers first, then investments, then the rest.
pub fn summarize(month: MonthKey, transactions: Vec<Transaction>) -> MonthlySummary {
    let transaction_count = transactions.len();
    let mut income = 0i64;
    let mut expenses = 0i64;
    let mut transfers = TransferTotals::default();
    let mut investments = 0i64;
    let mut transfer_transactions = Vec::new();
    let mut investment_transactions = Vec::new();
    let mut buckets: BTreeMap<Option<i64>, CategoryBucket> = BTreeMap::new();

    for t in transactions {
        if t.is_transfer {
            if t.amount > 0 {
                transfers.incoming += t.amount;
            } else {
                transfers.outgoing += t.amount.abs();
            }
            transfer_transactions.push(t);
            continue;
        }
        if t.is_investment {
            investments += t.amount.abs();
            investment_transactions.push(t);
            continue;
        }

        let bucket = buckets.entry(t.category_id).or_insert_with(|| CategoryBucket {
            category_id: t.category_id,
            income: 0,
            expense: 0,
            transactions: Vec::new(),
        });
        if t.amount > 0 {
            income += t.amount;
            bucket.income += t.amount;
        } else if t.amount < 0 {
            expenses += t.amount.abs();
            bucket.expense += t.amount.abs();
        }
        bucket.transactions.push(t);
    }
    transfers.net = transfers.incoming - transfers.outgoing;

    let mut categories: Vec<CategoryBucket> = buckets.into_values().collect();
    categories.sort_by(|a, b| b.expense.cmp(&a.expense).then(a.category_id.cmp(&b.category_id)));

    MonthlySummary {
        month,
        income,
        expenses,
        balance: income - expenses,
        transfers,
        investments,
        transaction_count,
        categories,
        transfer_transactions,
        investment_transactions,
    }
}

pub fn monthly_summary(conn: &Connection, classifier: &dyn Classifier, month: MonthKey) -> Result<MonthlySummary> {
    let transactions = attributed_transactions(conn, classifier, month)?;
    Ok(summarize(month, transactions))
}

/// Summaries for the `window` months strictly before `month`, most recent first.
pub fn preceding_summaries(
    conn: &Connection,
    classifier: &dyn Classifier,
    month: MonthKey,
    window: u32,
) -> Result<Vec<MonthlySummary>> {
    month
        .preceding(window)
        .into_iter()
        .map(|m| monthly_summary(conn, classifier, m))
        .collect()
}

// ---------------------------------------------------------------------------
// Year to date
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub income: i64,
    pub expenses: i64,
    pub balance: i64,
    pub investments: i64,
    pub transaction_count: usize,
}

pub fn year_to_date_summary(conn: &Connection, classifier: &dyn Classifier, year: i32) -> Result<YearSummary> {
    let (from, to) = attribution::year_window(year)?;
    let mut summary = YearSummary {
        year,
        income: 0,
        expenses: 0,
        balance: 0,
        investments: 0,
        transaction_count: 0,
    };

    for t in transactions_between(conn, from, to)? {
        if t.is_transfer {
            continue;
        }
        if attribution::logical_year(t.date, &t.description, t.amount, classifier) != year {
            continue;
        }
        summary.transaction_count += 1;
        if t.is_investment {
            summary.investments += t.amount.abs();
        } else if t.amount > 0 {
            summary.income += t.amount;
        } else {
            summary.expenses += t.amount.abs();
        }
    }
    summary.balance = summary.income - summary.expenses;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Moving averages
// ---------------------------------------------------------------------------

/// Mean of the nonzero values, rounded half up. Zero months count as "no data".
pub fn average_nonzero(values: &[i64]) -> i64 {
    let present: Vec<i64> = values.iter().copied().filter(|v| *v != 0).collect();
    if present.is_empty() {
        return 0;
    }
    let n = present.len() as i64;
    let sum: i64 = present.iter().sum();
    (sum + n / 2).div_euclid(n)
}

pub fn category_average(
    conn: &Connection,
    classifier: &dyn Classifier,
    category_id: Option<i64>,
    month: MonthKey,
    window: u32,
) -> Result<i64> {
    let history = preceding_summaries(conn, classifier, month, window)?;
    Ok(average_from(&history, category_id))
}

fn average_from(history: &[MonthlySummary], category_id: Option<i64>) -> i64 {
    let values: Vec<i64> = history.iter().map(|s| s.category_expense(category_id)).collect();
    average_nonzero(&values)
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryAverage {
    pub category_id: Option<i64>,
    pub average: i64,
}

/// Three-month expense average for every category and the uncategorized bucket.
pub fn category_averages(
    conn: &Connection,
    classifier: &dyn Classifier,
    month: MonthKey,
) -> Result<Vec<CategoryAverage>> {
    let history = preceding_summaries(conn, classifier, month, DEFAULT_WINDOW_MONTHS)?;
    let ids = std::iter::once(None).chain(list_categories(conn)?.into_iter().map(|c| Some(c.id)));
    Ok(ids
        .map(|category_id| CategoryAverage {
            category_id,
            average: average_from(&history, category_id),
        })
        .collect())
}
