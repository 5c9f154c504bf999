//! Expected income, fixed-expense budget and the variable-spending residual.

use rusqlite::Connection;
use serde::Serialize;

use crate::categories::list_categories;
use crate::classifier::Classifier;
use crate::db::{delete_setting, get_setting, set_setting};
use crate::error::{Result, TazrimError};
use crate::models::MonthKey;
use crate::reports::{self, average_nonzero, MonthlySummary, DEFAULT_WINDOW_MONTHS};

const DEFAULT_SAVINGS_GOAL_KEY: &str = "default_savings_goal";
const EXPECTED_INCOME_OVERRIDE_KEY: &str = "expected_income_override";

fn month_goal_key(month: MonthKey) -> String {
    format!("savings_goal:{month}")
}

// ---------------------------------------------------------------------------
// Settings store
// ---------------------------------------------------------------------------

/// User-declared budget inputs. Amounts are agorot.
pub trait BudgetSettings {
    fn default_savings_goal(&self) -> Result<i64>;
    fn month_savings_goal(&self, month: MonthKey) -> Result<Option<i64>>;
    fn expected_income_override(&self) -> Result<i64>;

    /// The month's own goal if set, else the default.
    fn savings_goal(&self, month: MonthKey) -> Result<i64> {
        match self.month_savings_goal(month)? {
            Some(goal) => Ok(goal),
            None => self.default_savings_goal(),
        }
    }
}

/// Budget settings kept in the database's key-value `settings` table.
pub struct SqliteSettings<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSettings<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn read_amount(&self, key: &str) -> Result<Option<i64>> {
        match get_setting(self.conn, key)? {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| TazrimError::Settings(format!("{key} is not an integer: {raw}"))),
            None => Ok(None),
        }
    }

    fn write_amount(&self, key: &str, value: Option<i64>) -> Result<()> {
        match value {
            Some(v) => set_setting(self.conn, key, &v.to_string()),
            None => delete_setting(self.conn, key),
        }
    }

    pub fn set_default_savings_goal(&self, value: i64) -> Result<()> {
        self.write_amount(DEFAULT_SAVINGS_GOAL_KEY, Some(value))
    }

    /// `None` removes the month's override so the default applies again.
    pub fn set_month_savings_goal(&self, month: MonthKey, value: Option<i64>) -> Result<()> {
        self.write_amount(&month_goal_key(month), value)
    }

    pub fn set_expected_income_override(&self, value: Option<i64>) -> Result<()> {
        self.write_amount(EXPECTED_INCOME_OVERRIDE_KEY, value)
    }
}

impl BudgetSettings for SqliteSettings<'_> {
    fn default_savings_goal(&self) -> Result<i64> {
        Ok(self.read_amount(DEFAULT_SAVINGS_GOAL_KEY)?.unwrap_or(0))
    }

    fn month_savings_goal(&self, month: MonthKey) -> Result<Option<i64>> {
        self.read_amount(&month_goal_key(month))
    }

    fn expected_income_override(&self) -> Result<i64> {
        Ok(self.read_amount(EXPECTED_INCOME_OVERRIDE_KEY)?.unwrap_or(0))
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Regular income is projected upward from the best signal; occasional income
/// only counts once it has arrived.
pub fn expected_income(actual_regular: i64, income_override: i64, average_regular: i64, actual_occasional: i64) -> i64 {
    actual_regular.max(income_override).max(average_regular) + actual_occasional
}

pub fn fixed_expense_contribution(actual: i64, average: i64) -> i64 {
    actual.max(average)
}

pub fn average_regular_income(
    conn: &Connection,
    classifier: &dyn Classifier,
    month: MonthKey,
    window: u32,
) -> Result<i64> {
    let history = reports::preceding_summaries(conn, classifier, month, window)?;
    Ok(regular_average_from(&history))
}

fn regular_average_from(history: &[MonthlySummary]) -> i64 {
    let values: Vec<i64> = history.iter().map(MonthlySummary::regular_income).collect();
    average_nonzero(&values)
}

#[derive(Debug, Clone, Serialize)]
pub struct FixedExpenseLine {
    pub category_id: i64,
    pub name: String,
    pub actual: i64,
    pub average: i64,
    pub budgeted: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Budget {
    pub month: MonthKey,
    pub actual_regular_income: i64,
    pub actual_occasional_income: i64,
    pub average_regular_income: i64,
    pub expected_income_override: i64,
    pub expected_regular_income: i64,
    pub expected_income: i64,
    pub savings_goal: i64,
    pub fixed_lines: Vec<FixedExpenseLine>,
    pub fixed_expenses: i64,
    pub variable_category_id: Option<i64>,
    pub variable_actual: i64,
    /// Negative when the goal plus fixed commitments exceed projected income.
    pub available_for_variable: i64,
    pub remaining_for_variable: i64,
}

/// Everything the derivation needs, gathered up front.
#[derive(Debug, Clone)]
pub struct BudgetInputs {
    pub month: MonthKey,
    pub actual_regular_income: i64,
    pub actual_occasional_income: i64,
    pub average_regular_income: i64,
    pub expected_income_override: i64,
    pub savings_goal: i64,
    /// (category id, name, actual expense, average expense) for every non-variable category.
    pub fixed: Vec<(i64, String, i64, i64)>,
    pub variable_category_id: Option<i64>,
    pub variable_actual: i64,
}

pub fn derive_budget(inputs: BudgetInputs) -> Budget {
    let expected_regular_income = inputs
        .actual_regular_income
        .max(inputs.expected_income_override)
        .max(inputs.average_regular_income);
    let expected_income = expected_income(
        inputs.actual_regular_income,
        inputs.expected_income_override,
        inputs.average_regular_income,
        inputs.actual_occasional_income,
    );

    let fixed_lines: Vec<FixedExpenseLine> = inputs
        .fixed
        .into_iter()
        .map(|(category_id, name, actual, average)| FixedExpenseLine {
            category_id,
            name,
            actual,
            average,
            budgeted: fixed_expense_contribution(actual, average),
        })
        .collect();
    let fixed_expenses: i64 = fixed_lines.iter().map(|l| l.budgeted).sum();

    let available_for_variable = expected_income - inputs.savings_goal - fixed_expenses;
    Budget {
        month: inputs.month,
        actual_regular_income: inputs.actual_regular_income,
        actual_occasional_income: inputs.actual_occasional_income,
        average_regular_income: inputs.average_regular_income,
        expected_income_override: inputs.expected_income_override,
        expected_regular_income,
        expected_income,
        savings_goal: inputs.savings_goal,
        fixed_lines,
        fixed_expenses,
        variable_category_id: inputs.variable_category_id,
        variable_actual: inputs.variable_actual,
        available_for_variable,
        remaining_for_variable: available_for_variable - inputs.variable_actual,
    }
}

pub fn available_budget(
    conn: &Connection,
    classifier: &dyn Classifier,
    settings: &dyn BudgetSettings,
    month: MonthKey,
) -> Result<Budget> {
    let summary = reports::monthly_summary(conn, classifier, month)?;
    let history = reports::preceding_summaries(conn, classifier, month, DEFAULT_WINDOW_MONTHS)?;

    let mut fixed = Vec::new();
    let mut variable_category_id = None;
    for cat in list_categories(conn)? {
        if cat.is_variable {
            variable_category_id = Some(cat.id);
            continue;
        }
        let values: Vec<i64> = history.iter().map(|s| s.category_expense(Some(cat.id))).collect();
        fixed.push((cat.id, cat.name, summary.category_expense(Some(cat.id)), average_nonzero(&values)));
    }

    let inputs = BudgetInputs {
        month,
        actual_regular_income: summary.regular_income(),
        actual_occasional_income: summary.occasional_income(),
        average_regular_income: regular_average_from(&history),
        expected_income_override: settings.expected_income_override()?,
        savings_goal: settings.savings_goal(month)?,
        fixed,
        variable_category_id,
        variable_actual: variable_category_id.map_or(0, |id| summary.category_expense(Some(id))),
    };
    Ok(derive_budget(inputs))
}
