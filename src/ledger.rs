use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::classifier::Classifier;
use crate::error::{Result, TazrimError};
use crate::models::{check_year, RawTransaction, Transaction, MAX_ABS_AMOUNT};

/// Description characters that participate in the identity key.
const ID_DESCRIPTION_CHARS: usize = 50;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

pub(crate) const TXN_COLUMNS: &str = "id, date, amount, description, memo, account, category_id, \
     is_transfer, is_investment, is_occasional_income, user_comment";

pub fn normalize_description(raw: &str) -> String {
    WHITESPACE.replace_all(raw.trim(), " ").into_owned()
}

/// Stable identity for a bank event. Bank-assigned ids are not used because they
/// change between fetches.
pub fn transaction_id(account: &str, date: NaiveDate, amount: i64, description: &str) -> String {
    let desc: String = normalize_description(description)
        .chars()
        .take(ID_DESCRIPTION_CHARS)
        .collect();
    let mut hasher = Sha256::new();
    hasher.update(format!("{account}|{}|{amount}|{desc}", date.format("%Y-%m-%d")));
    let mut id = hex::encode(hasher.finalize());
    id.truncate(32);
    id
}

pub(crate) fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        amount: row.get(2)?,
        description: row.get(3)?,
        memo: row.get(4)?,
        account: row.get(5)?,
        category_id: row.get(6)?,
        is_transfer: row.get(7)?,
        is_investment: row.get(8)?,
        is_occasional_income: row.get(9)?,
        user_comment: row.get(10)?,
    })
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertResult {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl UpsertResult {
    pub fn processed(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Inserts new identities and refreshes known ones, in one SQLite transaction.
///
/// Known identities keep their category, transfer, investment, occasional-income
/// and comment values. Transfer detection runs only for brand-new identities.
/// Rules are not applied here; call `categorizer::auto_apply_rules` after the batch.
pub fn upsert_transactions(
    conn: &Connection,
    records: &[RawTransaction],
    account: &str,
    classifier: &dyn Classifier,
) -> Result<UpsertResult> {
    let account = account.trim();
    if account.is_empty() {
        return Err(TazrimError::Validation("Source account label is required".into()));
    }

    let tx = conn.unchecked_transaction()?;
    let mut result = UpsertResult::default();
    for record in records {
        let description = normalize_description(&record.description);
        if description.is_empty() {
            warn!(date = %record.date, amount = record.amount, "skipping record without description");
            result.skipped += 1;
            continue;
        }
        if check_year(record.date.year()).is_err() || record.amount.unsigned_abs() > MAX_ABS_AMOUNT as u64 {
            warn!(date = %record.date, amount = record.amount, "skipping record outside supported range");
            result.skipped += 1;
            continue;
        }
        let id = transaction_id(account, record.date, record.amount, &description);
        let memo = record.memo.trim();

        let exists = tx
            .prepare_cached("SELECT 1 FROM transactions WHERE id = ?1")?
            .exists([&id])?;
        if exists {
            tx.execute(
                "UPDATE transactions SET date = ?1, amount = ?2, description = ?3, memo = ?4, \
                 account = ?5, updated_at = datetime('now') WHERE id = ?6",
                rusqlite::params![record.date, record.amount, description, memo, account, id],
            )?;
            debug!(%id, "refreshed known transaction");
            result.updated += 1;
        } else {
            let is_transfer = classifier.is_transfer(&description);
            tx.execute(
                "INSERT INTO transactions (id, date, amount, description, memo, account, is_transfer) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![id, record.date, record.amount, description, memo, account, is_transfer],
            )?;
            debug!(%id, is_transfer, "inserted new transaction");
            result.inserted += 1;
        }
    }
    tx.commit()?;

    info!(
        account,
        inserted = result.inserted,
        updated = result.updated,
        skipped = result.skipped,
        "ingestion batch committed"
    );
    Ok(result)
}

pub fn get_transaction(conn: &Connection, id: &str) -> Result<Transaction> {
    let sql = format!("SELECT {TXN_COLUMNS} FROM transactions WHERE id = ?1");
    conn.query_row(&sql, [id], row_to_transaction)
        .optional()?
        .ok_or_else(|| TazrimError::UnknownTransaction(id.to_string()))
}

/// Resolves a full id from a unique prefix, as printed by listings.
pub fn resolve_id(conn: &Connection, prefix: &str) -> Result<String> {
    let prefix = prefix.trim();
    require_id(prefix)?;
    let mut stmt = conn.prepare("SELECT id FROM transactions WHERE substr(id, 1, ?2) = ?1 LIMIT 2")?;
    let matches: Vec<String> = stmt
        .query_map(rusqlite::params![prefix, prefix.len() as i64], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match matches.as_slice() {
        [only] => Ok(only.clone()),
        [] => Err(TazrimError::UnknownTransaction(prefix.to_string())),
        _ => Err(TazrimError::Validation(format!("Transaction id prefix is ambiguous: {prefix}"))),
    }
}

/// All transactions dated within `[from, to]`, newest first.
pub fn transactions_between(conn: &Connection, from: NaiveDate, to: NaiveDate) -> Result<Vec<Transaction>> {
    let sql = format!(
        "SELECT {TXN_COLUMNS} FROM transactions WHERE date BETWEEN ?1 AND ?2 ORDER BY date DESC, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params![from, to], row_to_transaction)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(TazrimError::Validation("Transaction id is required".into()));
    }
    Ok(())
}

fn update_one<P: rusqlite::Params>(conn: &Connection, id: &str, sql: &str, params: P) -> Result<()> {
    let updated = conn.execute(sql, params)?;
    if updated == 0 {
        return Err(TazrimError::UnknownTransaction(id.to_string()));
    }
    Ok(())
}

/// Marking a transfer clears the investment flag; the two never coexist.
pub fn set_transfer(conn: &Connection, id: &str, value: bool) -> Result<()> {
    require_id(id)?;
    update_one(
        conn,
        id,
        "UPDATE transactions SET is_transfer = ?1, \
         is_investment = CASE WHEN ?1 THEN 0 ELSE is_investment END WHERE id = ?2",
        rusqlite::params![value, id],
    )
}

/// Marking an investment clears the transfer flag.
pub fn set_investment(conn: &Connection, id: &str, value: bool) -> Result<()> {
    require_id(id)?;
    update_one(
        conn,
        id,
        "UPDATE transactions SET is_investment = ?1, \
         is_transfer = CASE WHEN ?1 THEN 0 ELSE is_transfer END WHERE id = ?2",
        rusqlite::params![value, id],
    )
}

pub fn set_occasional_income(conn: &Connection, id: &str, value: bool) -> Result<()> {
    require_id(id)?;
    update_one(
        conn,
        id,
        "UPDATE transactions SET is_occasional_income = ?1 WHERE id = ?2",
        rusqlite::params![value, id],
    )
}

/// Blank comments are stored as NULL.
pub fn set_comment(conn: &Connection, id: &str, comment: Option<&str>) -> Result<()> {
    require_id(id)?;
    let comment = comment.map(str::trim).filter(|c| !c.is_empty());
    update_one(
        conn,
        id,
        "UPDATE transactions SET user_comment = ?1 WHERE id = ?2",
        rusqlite::params![comment, id],
    )
}

pub(crate) fn update_category(conn: &Connection, id: &str, category_id: Option<i64>) -> Result<()> {
    require_id(id)?;
    update_one(
        conn,
        id,
        "UPDATE transactions SET category_id = ?1 WHERE id = ?2",
        rusqlite::params![category_id, id],
    )
}

/// Marks every given transaction as a transfer in one SQLite transaction.
pub fn mark_transfers(conn: &Connection, ids: &[String]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut changed = 0usize;
    for id in ids {
        changed += tx.execute(
            "UPDATE transactions SET is_transfer = 1, is_investment = 0 \
             WHERE id = ?1 AND (is_transfer = 0 OR is_investment = 1)",
            [id],
        )?;
    }
    tx.commit()?;
    Ok(changed)
}

#[cfg(test)]
pub(crate) fn raw(date: &str, amount: i64, description: &str) -> RawTransaction {
    RawTransaction {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        amount,
        description: description.to_string(),
        memo: String::new(),
    }
}
