use crate::categorizer::{exclude_month, redetect_transfers};
use crate::classifier::PatternClassifier;
use crate::error::Result;
use crate::models::MonthKey;

use super::open_db;

pub fn redetect(db: Option<&str>) -> Result<()> {
    let conn = open_db(db)?;
    let result = redetect_transfers(&conn, &PatternClassifier::default())?;
    println!("{} marked as transfer, {} cleared", result.marked, result.cleared);
    Ok(())
}

pub fn exclude(db: Option<&str>, month: &str) -> Result<()> {
    let month: MonthKey = month.parse()?;
    let conn = open_db(db)?;
    let marked = exclude_month(&conn, &PatternClassifier::default(), month)?;
    println!("{marked} transaction(s) in {month} marked as transfer");
    Ok(())
}
