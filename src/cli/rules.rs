use comfy_table::{Cell, Table};

use crate::categorizer::{auto_apply_rules, delete_rule, list_rules};
use crate::error::{Result, TazrimError};

use super::{category_label, category_names, open_db};

pub fn list(db: Option<&str>) -> Result<()> {
    let conn = open_db(db)?;
    let names = category_names(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["Description", "Category"]);
    for rule in list_rules(&conn)? {
        table.add_row(vec![
            Cell::new(rule.description),
            Cell::new(category_label(&names, Some(rule.category_id))),
        ]);
    }
    println!("Rules\n{table}");
    Ok(())
}

pub fn delete(db: Option<&str>, description: &str) -> Result<()> {
    let conn = open_db(db)?;
    if !delete_rule(&conn, description)? {
        return Err(TazrimError::Other(format!("No rule for description: {description}")));
    }
    println!("Deleted rule for '{description}'");
    Ok(())
}

pub fn apply(db: Option<&str>) -> Result<()> {
    let conn = open_db(db)?;
    let changed = auto_apply_rules(&conn)?;
    println!("{changed} categorized");
    Ok(())
}
