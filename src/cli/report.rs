use std::collections::HashMap;

use colored::Colorize;
use comfy_table::{Cell, Table};
use serde::Serialize;

use crate::budget::{available_budget, Budget, SqliteSettings};
use crate::categories::variable_bucket;
use crate::classifier::PatternClassifier;
use crate::error::Result;
use crate::fmt::shekels;
use crate::models::MonthKey;
use crate::reports::{self, CategoryAverage, MonthlySummary, YearSummary};

use super::{category_label, category_names, open_db};

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Data-fetching wrappers
// ---------------------------------------------------------------------------

pub fn months(db: Option<&str>) -> Result<()> {
    let conn = open_db(db)?;
    let months = reports::available_months(&conn)?;
    if months.is_empty() {
        println!("No transactions yet.");
    }
    for m in months {
        println!("{m}");
    }
    Ok(())
}

pub fn month(db: Option<&str>, month: &str, json: bool) -> Result<()> {
    let month: MonthKey = month.parse()?;
    let conn = open_db(db)?;
    let summary = reports::monthly_summary(&conn, &PatternClassifier::default(), month)?;
    if json {
        return emit(&summary);
    }
    let names = category_names(&conn)?;
    println!("{}", format_month(&summary, &names));
    Ok(())
}

pub fn year(db: Option<&str>, year: i32, json: bool) -> Result<()> {
    let conn = open_db(db)?;
    let summary = reports::year_to_date_summary(&conn, &PatternClassifier::default(), year)?;
    if json {
        return emit(&summary);
    }
    println!("{}", format_year(&summary));
    Ok(())
}

#[derive(Serialize)]
struct AverageRow {
    category_id: Option<i64>,
    name: String,
    average: i64,
}

pub fn averages(db: Option<&str>, month: &str, json: bool) -> Result<()> {
    let month: MonthKey = month.parse()?;
    let conn = open_db(db)?;
    let averages = reports::category_averages(&conn, &PatternClassifier::default(), month)?;
    let variable = variable_bucket(&conn)?.map(|c| c.id);
    let averages = budgeted_averages(averages, variable);
    let names = category_names(&conn)?;
    if json {
        let rows: Vec<AverageRow> = averages
            .iter()
            .map(|a| AverageRow {
                category_id: a.category_id,
                name: category_label(&names, a.category_id),
                average: a.average,
            })
            .collect();
        return emit(&rows);
    }
    println!("{}", format_averages(month, &averages, &names));
    Ok(())
}

pub fn budget(db: Option<&str>, month: &str, json: bool) -> Result<()> {
    let month: MonthKey = month.parse()?;
    let conn = open_db(db)?;
    let settings = SqliteSettings::new(&conn);
    let budget = available_budget(&conn, &PatternClassifier::default(), &settings, month)?;
    if json {
        return emit(&budget);
    }
    println!("{}", format_budget(&budget));
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

fn signed(amount: i64) -> String {
    if amount < 0 {
        shekels(amount).red().to_string()
    } else {
        shekels(amount).green().to_string()
    }
}

pub(crate) fn format_month(summary: &MonthlySummary, names: &HashMap<i64, String>) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Income", "Expenses", "Count"]);
    for bucket in &summary.categories {
        table.add_row(vec![
            Cell::new(category_label(names, bucket.category_id)),
            Cell::new(shekels(bucket.income)),
            Cell::new(shekels(bucket.expense)),
            Cell::new(bucket.transactions.len()),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL".bold()),
        Cell::new(shekels(summary.income).bold()),
        Cell::new(shekels(summary.expenses).bold()),
        Cell::new(summary.transaction_count),
    ]);

    let mut out = format!("Monthly Summary: {}\n{table}\n", summary.month);
    out.push_str(&format!("\nBalance:      {}", signed(summary.balance)));
    out.push_str(&format!(
        "\nTransfers:    in {} / out {} / net {}",
        shekels(summary.transfers.incoming),
        shekels(summary.transfers.outgoing),
        shekels(summary.transfers.net)
    ));
    out.push_str(&format!("\nInvestments:  {}", shekels(summary.investments)));
    out
}

pub(crate) fn format_year(summary: &YearSummary) -> String {
    let mut table = Table::new();
    table.set_header(vec!["", "Amount"]);
    table.add_row(vec![Cell::new("Income"), Cell::new(shekels(summary.income))]);
    table.add_row(vec![Cell::new("Expenses"), Cell::new(shekels(summary.expenses))]);
    table.add_row(vec![Cell::new("Investments"), Cell::new(shekels(summary.investments))]);
    table.add_row(vec![Cell::new("Balance".bold()), Cell::new(signed(summary.balance))]);
    format!(
        "Year to Date: {} ({} transactions)\n{table}",
        summary.year, summary.transaction_count
    )
}

/// Averages shown to the user: real, fixed categories only. The uncategorized
/// and variable-expense buckets are left out.
pub(crate) fn budgeted_averages(averages: Vec<CategoryAverage>, variable: Option<i64>) -> Vec<CategoryAverage> {
    averages
        .into_iter()
        .filter(|a| a.category_id.is_some() && a.category_id != variable)
        .collect()
}

pub(crate) fn format_averages(month: MonthKey, averages: &[CategoryAverage], names: &HashMap<i64, String>) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Average"]);
    for avg in averages.iter().filter(|a| a.average != 0) {
        table.add_row(vec![
            Cell::new(category_label(names, avg.category_id)),
            Cell::new(shekels(avg.average)),
        ]);
    }
    format!("Average expenses before {month} (last {} months)\n{table}", reports::DEFAULT_WINDOW_MONTHS)
}

pub(crate) fn format_budget(budget: &Budget) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Fixed category", "Actual", "Average", "Budgeted"]);
    for line in &budget.fixed_lines {
        table.add_row(vec![
            Cell::new(&line.name),
            Cell::new(shekels(line.actual)),
            Cell::new(shekels(line.average)),
            Cell::new(shekels(line.budgeted)),
        ]);
    }

    let mut out = format!("Budget: {}\n", budget.month);
    out.push_str(&format!(
        "\nRegular income:   actual {} / average {} / override {}",
        shekels(budget.actual_regular_income),
        shekels(budget.average_regular_income),
        shekels(budget.expected_income_override)
    ));
    out.push_str(&format!("\nOccasional income: {}", shekels(budget.actual_occasional_income)));
    out.push_str(&format!("\nExpected income:  {}", shekels(budget.expected_income).bold()));
    out.push_str(&format!("\nSavings goal:     {}", shekels(budget.savings_goal)));
    out.push_str(&format!("\n\n{table}"));
    out.push_str(&format!("\nFixed expenses:   {}", shekels(budget.fixed_expenses)));
    out.push_str(&format!("\n\nAvailable for variable: {}", signed(budget.available_for_variable)));
    if budget.variable_category_id.is_some() {
        out.push_str(&format!("\nSpent so far:           {}", shekels(budget.variable_actual)));
        out.push_str(&format!("\nRemaining:              {}", signed(budget.remaining_for_variable)));
    } else {
        out.push_str(&format!("\n{}", "No variable-expense category designated".yellow()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::{derive_budget, BudgetInputs};
    use crate::reports::summarize;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_month_lists_buckets_and_totals() {
        plain();
        let summary = summarize(MonthKey::new(2024, 2).unwrap(), Vec::new());
        let out = format_month(&summary, &HashMap::new());
        assert!(out.starts_with("Monthly Summary: 2024-02"));
        assert!(out.contains("TOTAL"));
        assert!(out.contains("Investments:  ₪0.00"));
    }

    #[test]
    fn test_format_averages_skips_empty_rows() {
        plain();
        let names = HashMap::from([(1, "מזון".to_string()), (2, "רכב".to_string())]);
        let averages = vec![
            CategoryAverage { category_id: Some(1), average: 12_000 },
            CategoryAverage { category_id: Some(2), average: 0 },
        ];
        let out = format_averages(MonthKey::new(2024, 3).unwrap(), &averages, &names);
        assert!(out.contains("מזון"));
        assert!(out.contains("₪120.00"));
        assert!(!out.contains("רכב"));
    }

    #[test]
    fn test_averages_hide_uncategorized_and_variable_buckets() {
        plain();
        let names = HashMap::from([(1, "מזון".to_string()), (2, "הוצאות משתנות".to_string())]);
        let averages = vec![
            CategoryAverage { category_id: None, average: 7_000 },
            CategoryAverage { category_id: Some(1), average: 12_000 },
            CategoryAverage { category_id: Some(2), average: 90_000 },
        ];
        let shown = budgeted_averages(averages, Some(2));
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].category_id, Some(1));

        let out = format_averages(MonthKey::new(2024, 3).unwrap(), &shown, &names);
        assert!(out.contains("מזון"));
        assert!(!out.contains("הוצאות משתנות"));
        assert!(!out.contains("ללא קטגוריה"));
    }

    #[test]
    fn test_format_budget_without_variable_bucket() {
        plain();
        let budget = derive_budget(BudgetInputs {
            month: MonthKey::new(2024, 2).unwrap(),
            actual_regular_income: 1_500_000,
            actual_occasional_income: 0,
            average_regular_income: 1_400_000,
            expected_income_override: 0,
            savings_goal: 300_000,
            fixed: vec![(1, "שכירות".to_string(), 500_000, 500_000)],
            variable_category_id: None,
            variable_actual: 0,
        });
        let out = format_budget(&budget);
        assert!(out.contains("Expected income:  ₪15,000.00"));
        assert!(out.contains("Available for variable: ₪7,000.00"));
        assert!(out.contains("No variable-expense category designated"));
    }
}
