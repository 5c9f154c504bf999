use std::path::PathBuf;

use crate::classifier::PatternClassifier;
use crate::error::Result;
use crate::importer::import_file;

use super::open_db;

pub fn run(db: Option<&str>, file: &str, account: &str) -> Result<()> {
    let conn = open_db(db)?;
    let classifier = PatternClassifier::default();
    let result = import_file(&conn, &classifier, &PathBuf::from(file), account)?;

    println!(
        "{} new, {} refreshed, {} skipped, {} malformed",
        result.upsert.inserted, result.upsert.updated, result.upsert.skipped, result.malformed
    );
    println!("{} categorized by rules", result.categorized);
    Ok(())
}
