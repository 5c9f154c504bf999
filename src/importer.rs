use std::path::Path;

use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::categorizer::auto_apply_rules;
use crate::classifier::Classifier;
use crate::error::{Result, TazrimError};
use crate::ledger::{upsert_transactions, UpsertResult};
use crate::models::{check_year, RawTransaction, MAX_ABS_AMOUNT};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parses a decimal amount into agorot without going through floating point.
/// Accepts thousands separators, a shekel sign, quotes, and parenthesized negatives.
pub fn parse_amount(raw: &str) -> Result<i64> {
    let invalid = || TazrimError::InvalidAmount(raw.to_string());
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '"' | '₪' | ' '))
        .collect();
    let mut s = cleaned.as_str();

    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        negative = true;
        s = inner;
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }

    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) || frac.len() > 2 {
        return Err(invalid());
    }
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };
    let frac: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };
    let agorot = whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(frac))
        .filter(|v| *v <= MAX_ABS_AMOUNT)
        .ok_or_else(invalid)?;
    Ok(if negative { -agorot } else { agorot })
}

/// `YYYY-MM-DD` or the local `DD/MM/YYYY`.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .map_err(|_| TazrimError::InvalidDate(raw.to_string()))?;
    check_year(date.year())?;
    Ok(date)
}

// ---------------------------------------------------------------------------
// CSV feed
// ---------------------------------------------------------------------------

pub struct ParsedFeed {
    pub records: Vec<RawTransaction>,
    pub malformed: usize,
}

/// Reads a `date,amount,description[,memo]` CSV. Bad rows are skipped and counted.
pub fn read_csv(file_path: &Path) -> Result<ParsedFeed> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(std::io::BufReader::new(file));

    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let (idx_date, idx_amount, idx_desc) = match (column("date"), column("amount"), column("description")) {
        (Some(d), Some(a), Some(s)) => (d, a, s),
        _ => {
            return Err(TazrimError::Validation(
                "CSV must have date, amount and description columns".into(),
            ))
        }
    };
    let idx_memo = column("memo");

    let mut records = Vec::new();
    let mut malformed = 0usize;
    for (line, result) in rdr.records().enumerate() {
        let Ok(record) = result else {
            malformed += 1;
            continue;
        };
        let parsed = parse_record(&record, idx_date, idx_amount, idx_desc, idx_memo);
        match parsed {
            Ok(r) => records.push(r),
            Err(e) => {
                warn!(row = line + 2, error = %e, "skipping malformed row");
                malformed += 1;
            }
        }
    }
    Ok(ParsedFeed { records, malformed })
}

fn parse_record(
    record: &csv::StringRecord,
    idx_date: usize,
    idx_amount: usize,
    idx_desc: usize,
    idx_memo: Option<usize>,
) -> Result<RawTransaction> {
    let field = |i: usize| record.get(i).unwrap_or("");
    Ok(RawTransaction {
        date: parse_date(field(idx_date))?,
        amount: parse_amount(field(idx_amount))?,
        description: field(idx_desc).to_string(),
        memo: idx_memo.map(field).unwrap_or("").to_string(),
    })
}

pub struct ImportResult {
    pub upsert: UpsertResult,
    pub malformed: usize,
    pub categorized: usize,
}

/// Ingests one feed file as a single batch, then applies stored rules.
pub fn import_file(
    conn: &Connection,
    classifier: &dyn Classifier,
    file_path: &Path,
    account: &str,
) -> Result<ImportResult> {
    let feed = read_csv(file_path)?;
    let upsert = upsert_transactions(conn, &feed.records, account, classifier)?;
    let categorized = auto_apply_rules(conn)?;
    info!(
        file = %file_path.display(),
        processed = upsert.processed(),
        malformed = feed.malformed,
        categorized,
        "import finished"
    );
    Ok(ImportResult {
        upsert,
        malformed: feed.malformed,
        categorized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::add_category;
    use crate::categorizer::apply_category;
    use crate::classifier::PatternClassifier;
    use crate::db::test_db;
    use crate::ledger::transaction_id;

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56").unwrap(), 123_456);
        assert_eq!(parse_amount("\"500.00\"").unwrap(), 50_000);
        assert_eq!(parse_amount("  -42.5  ").unwrap(), -4_250);
        assert_eq!(parse_amount("0").unwrap(), 0);
        assert_eq!(parse_amount("+13000").unwrap(), 1_300_000);
        assert_eq!(parse_amount(".5").unwrap(), 50);
    }

    #[test]
    fn test_parse_amount_parenthesized_and_currency() {
        assert_eq!(parse_amount("(500.00)").unwrap(), -50_000);
        assert_eq!(parse_amount("₪1,234.56").unwrap(), 123_456);
        assert_eq!(parse_amount("-₪50.00").unwrap(), -5_000);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(parse_amount("not_a_number").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount("1.234").is_err());
        assert!(parse_amount("1e5").is_err());
        assert!(parse_amount("92233720368547758.07").is_err());
        assert_eq!(parse_amount("10,000,000,000.00").unwrap(), MAX_ABS_AMOUNT);
        assert!(parse_amount("10,000,000,000.01").is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(parse_date("2024-02-01").unwrap(), expected);
        assert_eq!(parse_date("01/02/2024").unwrap(), expected);
        assert!(parse_date("31/02/2024").is_err());
        assert!(parse_date("yesterday").is_err());
        assert!(parse_date("12000-01-01").is_err());
    }

    #[test]
    fn test_read_csv_skips_malformed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "feed.csv",
            "Date,Amount,Description,Memo\n\
             2024-02-01,13000.00,משכורת פברואר,חברה\n\
             bad-date,10,x,\n\
             2024-02-05,-45.90,קפה,\n",
        );
        let feed = read_csv(&path).unwrap();
        assert_eq!(feed.records.len(), 2);
        assert_eq!(feed.malformed, 1);
        assert_eq!(feed.records[0].amount, 1_300_000);
        assert_eq!(feed.records[1].amount, -4_590);
    }

    #[test]
    fn test_read_csv_requires_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "feed.csv", "when,how much\n2024-01-01,5\n");
        assert!(matches!(read_csv(&path), Err(TazrimError::Validation(_))));
    }

    #[test]
    fn test_import_file_applies_rules_and_dedupes() {
        let (_dir, conn) = test_db();
        let c = PatternClassifier::default();
        let dir = tempfile::tempdir().unwrap();
        let first = write_csv(dir.path(), "jan.csv", "date,amount,description\n2024-01-10,-30,קפה\n");
        import_file(&conn, &c, &first, "bank").unwrap();

        let coffee = add_category(&conn, "Coffee", None).unwrap();
        let id = transaction_id("bank", NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(), -3_000, "קפה");
        apply_category(&conn, &id, Some(coffee)).unwrap();

        let second = write_csv(
            dir.path(),
            "feb.csv",
            "date,amount,description\n2024-01-10,-30,קפה\n2024-02-10,-32,קפה\n",
        );
        let result = import_file(&conn, &c, &second, "bank").unwrap();
        assert_eq!(result.upsert.inserted, 1);
        assert_eq!(result.upsert.updated, 1);
        assert_eq!(result.categorized, 1);

        let total: i64 = conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0)).unwrap();
        assert_eq!(total, 2);
        let coffee_count: i64 = conn
            .query_row("SELECT count(*) FROM transactions WHERE category_id = ?1", [coffee], |r| r.get(0))
            .unwrap();
        assert_eq!(coffee_count, 2);
    }
}
