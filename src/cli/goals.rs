use crate::budget::{BudgetSettings, SqliteSettings};
use crate::error::Result;
use crate::fmt::shekels;
use crate::models::MonthKey;

use super::{open_db, parse_shekels};

pub fn set_default(db: Option<&str>, amount: &str) -> Result<()> {
    let value = parse_shekels(amount)?;
    let conn = open_db(db)?;
    SqliteSettings::new(&conn).set_default_savings_goal(value)?;
    println!("Default savings goal: {}", shekels(value));
    Ok(())
}

pub fn set_month(db: Option<&str>, month: &str, amount: Option<&str>) -> Result<()> {
    let month: MonthKey = month.parse()?;
    let value = amount.map(parse_shekels).transpose()?;
    let conn = open_db(db)?;
    let settings = SqliteSettings::new(&conn);
    settings.set_month_savings_goal(month, value)?;
    match value {
        Some(v) => println!("Savings goal for {month}: {}", shekels(v)),
        None => println!(
            "Savings goal for {month} follows the default ({})",
            shekels(settings.default_savings_goal()?)
        ),
    }
    Ok(())
}

pub fn show(db: Option<&str>, month: &str) -> Result<()> {
    let month: MonthKey = month.parse()?;
    let conn = open_db(db)?;
    let settings = SqliteSettings::new(&conn);
    let source = if settings.month_savings_goal(month)?.is_some() {
        "month"
    } else {
        "default"
    };
    println!("Savings goal for {month}: {} ({source})", shekels(settings.savings_goal(month)?));
    Ok(())
}

pub fn set_income_override(db: Option<&str>, amount: Option<&str>) -> Result<()> {
    let value = amount.map(parse_shekels).transpose()?;
    let conn = open_db(db)?;
    SqliteSettings::new(&conn).set_expected_income_override(value)?;
    match value {
        Some(v) => println!("Expected regular income: {}", shekels(v)),
        None => println!("Expected income override removed"),
    }
    Ok(())
}

pub fn show_income_override(db: Option<&str>) -> Result<()> {
    let conn = open_db(db)?;
    let value = SqliteSettings::new(&conn).expected_income_override()?;
    if value == 0 {
        println!("No expected income override");
    } else {
        println!("Expected regular income: {}", shekels(value));
    }
    Ok(())
}
