use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::categories::{add_category, delete_category, list_categories, set_variable_bucket, variable_bucket};
use crate::error::Result;

use super::open_db;

pub fn add(db: Option<&str>, name: &str, color: Option<&str>) -> Result<()> {
    let conn = open_db(db)?;
    let id = add_category(&conn, name, color)?;
    println!("Added category {id}: {}", name.trim());
    Ok(())
}

pub fn list(db: Option<&str>) -> Result<()> {
    let conn = open_db(db)?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Color", "Variable"]);
    for cat in list_categories(&conn)? {
        table.add_row(vec![
            Cell::new(cat.id),
            Cell::new(cat.name),
            Cell::new(cat.color),
            Cell::new(if cat.is_variable { "\u{2713}" } else { "" }),
        ]);
    }
    println!("Categories\n{table}");
    Ok(())
}

pub fn delete(db: Option<&str>, id: i64) -> Result<()> {
    let conn = open_db(db)?;
    if delete_category(&conn, id)? {
        println!("Deleted category {id}");
    } else {
        println!("{}", format!("No category with ID {id}").yellow());
    }
    Ok(())
}

pub fn variable(db: Option<&str>, id: Option<i64>) -> Result<()> {
    let conn = open_db(db)?;
    set_variable_bucket(&conn, id)?;
    match variable_bucket(&conn)? {
        Some(cat) => println!("'{}' is now the variable-expense bucket", cat.name),
        None => println!("No variable-expense bucket; all categories are budgeted as fixed"),
    }
    Ok(())
}
