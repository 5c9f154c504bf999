use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::categorizer::apply_category;
use crate::classifier::PatternClassifier;
use crate::error::Result;
use crate::fmt::shekels;
use crate::ledger::{resolve_id, set_comment, set_investment, set_occasional_income, set_transfer};
use crate::models::{MonthKey, Transaction, TxnKind};
use crate::reports::attributed_transactions;

use super::{category_label, category_names, open_db};

const ID_PREFIX_LEN: usize = 8;

fn flags(t: &Transaction) -> String {
    let mut out = Vec::new();
    if t.is_transfer {
        out.push("transfer");
    }
    if t.is_investment {
        out.push("investment");
    }
    if t.is_occasional_income {
        out.push("occasional");
    }
    out.join(",")
}

pub fn list(db: Option<&str>, month: &str) -> Result<()> {
    let month: MonthKey = month.parse()?;
    let conn = open_db(db)?;
    let names = category_names(&conn)?;
    let rows = attributed_transactions(&conn, &PatternClassifier::default(), month)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Amount", "Category", "Flags", "Comment"]);
    for t in &rows {
        let amount = match t.kind() {
            TxnKind::Expense => shekels(t.amount).red().to_string(),
            TxnKind::Income => shekels(t.amount).green().to_string(),
        };
        table.add_row(vec![
            Cell::new(&t.id[..ID_PREFIX_LEN.min(t.id.len())]),
            Cell::new(t.date),
            Cell::new(&t.description),
            Cell::new(amount),
            Cell::new(category_label(&names, t.category_id)),
            Cell::new(flags(t)),
            Cell::new(t.user_comment.as_deref().unwrap_or("")),
        ]);
    }
    println!("Transactions for {month} ({} rows)\n{table}", rows.len());
    Ok(())
}

pub fn category(db: Option<&str>, id: &str, category_id: Option<i64>) -> Result<()> {
    let conn = open_db(db)?;
    let id = resolve_id(&conn, id)?;
    let changed = apply_category(&conn, &id, category_id)?;
    match category_id {
        Some(cat) => println!("Category {cat} applied to {changed} transaction(s); rule saved"),
        None => println!("Category cleared; rule removed"),
    }
    Ok(())
}

pub fn transfer(db: Option<&str>, id: &str, value: bool) -> Result<()> {
    let conn = open_db(db)?;
    let id = resolve_id(&conn, id)?;
    set_transfer(&conn, &id, value)?;
    println!("{} transfer: {value}", &id[..ID_PREFIX_LEN]);
    Ok(())
}

pub fn investment(db: Option<&str>, id: &str, value: bool) -> Result<()> {
    let conn = open_db(db)?;
    let id = resolve_id(&conn, id)?;
    set_investment(&conn, &id, value)?;
    println!("{} investment: {value}", &id[..ID_PREFIX_LEN]);
    Ok(())
}

pub fn occasional(db: Option<&str>, id: &str, value: bool) -> Result<()> {
    let conn = open_db(db)?;
    let id = resolve_id(&conn, id)?;
    set_occasional_income(&conn, &id, value)?;
    println!("{} occasional income: {value}", &id[..ID_PREFIX_LEN]);
    Ok(())
}

pub fn comment(db: Option<&str>, id: &str, text: Option<&str>) -> Result<()> {
    let conn = open_db(db)?;
    let id = resolve_id(&conn, id)?;
    set_comment(&conn, &id, text)?;
    println!("Comment updated");
    Ok(())
}
