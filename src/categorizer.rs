use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::categories::category_exists;
use crate::classifier::Classifier;
use crate::error::{Result, TazrimError};
use crate::ledger::{get_transaction, mark_transfers, normalize_description, update_category};
use crate::models::{MonthKey, Rule};
use crate::reports::attributed_transactions;

/// Sets (or clears) a transaction's category and maintains the description rule.
///
/// With a category: the rule for the transaction's exact description is upserted
/// and every other uncategorized transaction with that description receives the
/// category. Returns how many other transactions were cascaded.
///
/// Without a category: the rule for that description is removed. Other
/// transactions keep whatever they already have.
pub fn apply_category(conn: &Connection, txn_id: &str, category_id: Option<i64>) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let txn = get_transaction(&tx, txn_id)?;

    let cascaded = match category_id {
        Some(cat) => {
            if !category_exists(&tx, cat)? {
                return Err(TazrimError::UnknownCategory(cat));
            }
            update_category(&tx, txn_id, Some(cat))?;
            tx.execute(
                "INSERT INTO rules (description, category_id) VALUES (?1, ?2) \
                 ON CONFLICT(description) DO UPDATE SET category_id = excluded.category_id",
                rusqlite::params![txn.description, cat],
            )?;
            tx.execute(
                "UPDATE transactions SET category_id = ?1 \
                 WHERE description = ?2 AND category_id IS NULL AND id != ?3",
                rusqlite::params![cat, txn.description, txn_id],
            )?
        }
        None => {
            update_category(&tx, txn_id, None)?;
            tx.execute("DELETE FROM rules WHERE description = ?1", [&txn.description])?;
            0
        }
    };
    tx.commit()?;

    debug!(txn_id, ?category_id, cascaded, "category applied");
    Ok(cascaded)
}

/// Applies every stored rule to uncategorized transactions with the same
/// description. Idempotent. Returns the number of transactions changed.
pub fn auto_apply_rules(conn: &Connection) -> Result<usize> {
    let rules = list_rules(conn)?;

    let tx = conn.unchecked_transaction()?;
    let mut changed = 0usize;
    for rule in &rules {
        changed += tx.execute(
            "UPDATE transactions SET category_id = ?1 WHERE description = ?2 AND category_id IS NULL",
            rusqlite::params![rule.category_id, rule.description],
        )?;
    }
    tx.commit()?;

    info!(rules = rules.len(), changed, "rules applied");
    Ok(changed)
}

pub fn list_rules(conn: &Connection) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare("SELECT description, category_id FROM rules ORDER BY description")?;
    let rules = stmt
        .query_map([], |row| {
            Ok(Rule {
                description: row.get(0)?,
                category_id: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rules)
}

/// Rules are keyed by normalized description, so the lookup is normalized too.
pub fn delete_rule(conn: &Connection, description: &str) -> Result<bool> {
    let description = normalize_description(description);
    let deleted = conn.execute("DELETE FROM rules WHERE description = ?1", [description])?;
    Ok(deleted > 0)
}

pub fn detect_transfer(classifier: &dyn Classifier, description: &str) -> bool {
    classifier.is_transfer(description)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RedetectResult {
    pub marked: usize,
    pub cleared: usize,
}

/// Recomputes the transfer flag on every transaction from the current patterns.
/// Manual transfer choices are overwritten.
pub fn redetect_transfers(conn: &Connection, classifier: &dyn Classifier) -> Result<RedetectResult> {
    let mut stmt = conn.prepare("SELECT id, description, is_transfer FROM transactions")?;
    let rows: Vec<(String, String, bool)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    drop(stmt);

    let tx = conn.unchecked_transaction()?;
    let mut result = RedetectResult::default();
    for (id, description, was_transfer) in &rows {
        let is_transfer = detect_transfer(classifier, description);
        if is_transfer == *was_transfer {
            continue;
        }
        tx.execute(
            "UPDATE transactions SET is_transfer = ?1, \
             is_investment = CASE WHEN ?1 THEN 0 ELSE is_investment END WHERE id = ?2",
            rusqlite::params![is_transfer, id],
        )?;
        if is_transfer {
            result.marked += 1;
        } else {
            result.cleared += 1;
        }
    }
    tx.commit()?;

    info!(marked = result.marked, cleared = result.cleared, "transfers re-detected");
    Ok(result)
}

/// Marks every transaction attributed to the logical month as a transfer.
pub fn exclude_month(conn: &Connection, classifier: &dyn Classifier, month: MonthKey) -> Result<usize> {
    let ids: Vec<String> = attributed_transactions(conn, classifier, month)?
        .into_iter()
        .map(|t| t.id)
        .collect();
    let changed = mark_transfers(conn, &ids)?;
    info!(%month, attributed = ids.len(), changed, "month excluded");
    Ok(changed)
}
