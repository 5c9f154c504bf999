use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::{Result, TazrimError};
use crate::models::Category;

pub const DEFAULT_COLOR: &str = "#9e9e9e";

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name, color, is_variable FROM categories ORDER BY name ASC")?;
    let categories = stmt
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
                is_variable: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn category_exists(conn: &Connection, id: i64) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1)",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn add_category(conn: &Connection, name: &str, color: Option<&str>) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TazrimError::Validation("Name is required".into()));
    }
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )?;
    if exists {
        return Err(TazrimError::DuplicateCategory(name.to_string()));
    }
    let color = color.map(str::trim).filter(|c| !c.is_empty()).unwrap_or(DEFAULT_COLOR);
    conn.execute(
        "INSERT INTO categories (name, color) VALUES (?1, ?2)",
        [name, color],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Removes a category, its rules, and its assignment on every transaction.
/// Transactions themselves are kept. Returns false when the id was unknown.
pub fn delete_category(conn: &Connection, id: i64) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;
    let cleared = tx.execute("UPDATE transactions SET category_id = NULL WHERE category_id = ?1", [id])?;
    let rules = tx.execute("DELETE FROM rules WHERE category_id = ?1", [id])?;
    let deleted = tx.execute("DELETE FROM categories WHERE id = ?1", [id])?;
    tx.commit()?;
    if deleted > 0 {
        info!(id, cleared, rules, "category deleted");
    }
    Ok(deleted > 0)
}

/// Designates the variable-expense bucket. At most one category carries the flag;
/// `None` leaves no bucket.
pub fn set_variable_bucket(conn: &Connection, id: Option<i64>) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("UPDATE categories SET is_variable = 0 WHERE is_variable = 1", [])?;
    if let Some(id) = id {
        let updated = tx.execute("UPDATE categories SET is_variable = 1 WHERE id = ?1", [id])?;
        if updated == 0 {
            return Err(TazrimError::UnknownCategory(id));
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn variable_bucket(conn: &Connection) -> Result<Option<Category>> {
    let cat = conn
        .query_row(
            "SELECT id, name, color, is_variable FROM categories WHERE is_variable = 1 LIMIT 1",
            [],
            |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    color: row.get(2)?,
                    is_variable: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(cat)
}
