pub mod categories;
pub mod goals;
pub mod import;
pub mod init;
pub mod maintenance;
pub mod report;
pub mod rules;
pub mod txn;

use std::collections::HashMap;

use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::categories::list_categories;
use crate::db::{get_connection, init_db};
use crate::error::{Result, TazrimError};
use crate::importer::parse_amount;
use crate::settings::db_path;

pub(crate) fn open_db(db: Option<&str>) -> Result<Connection> {
    let path = db_path(db);
    if !path.exists() {
        return Err(TazrimError::Other(format!(
            "Database not found at {}. Run `tazrim init` first.",
            path.display()
        )));
    }
    let conn = get_connection(&path)?;
    init_db(&conn)?;
    Ok(conn)
}

pub(crate) fn category_names(conn: &Connection) -> Result<HashMap<i64, String>> {
    Ok(list_categories(conn)?.into_iter().map(|c| (c.id, c.name)).collect())
}

pub(crate) fn category_label(names: &HashMap<i64, String>, id: Option<i64>) -> String {
    match id {
        Some(id) => names.get(&id).cloned().unwrap_or_else(|| format!("#{id}")),
        None => "ללא קטגוריה".to_string(),
    }
}

/// Shekel amount as typed by a user ("2,000" or "13000.50") to agorot.
pub(crate) fn parse_shekels(raw: &str) -> Result<i64> {
    parse_amount(raw)
}

#[derive(Parser)]
#[command(name = "tazrim", about = "Household budget ledger with Israeli billing-cycle months.")]
pub struct Cli {
    /// Database path (default: <data_dir>/tazrim.db)
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for tazrim data (default: ~/Documents/tazrim)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import a transactions CSV (date,amount,description[,memo]) and apply rules.
    Import {
        /// Path to CSV file
        file: String,
        /// Source account label, e.g. 'leumi-checking'
        #[arg(long)]
        account: String,
    },
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Manage description rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Inspect and classify transactions.
    Txn {
        #[command(subcommand)]
        command: TxnCommands,
    },
    /// Savings goals.
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Expected regular income override.
    IncomeOverride {
        #[command(subcommand)]
        command: IncomeOverrideCommands,
    },
    /// Generate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Bulk maintenance operations.
    Maintenance {
        #[command(subcommand)]
        command: MaintenanceCommands,
    },
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category.
    Add {
        name: String,
        /// Display color, e.g. '#4caf50'
        #[arg(long)]
        color: Option<String>,
    },
    /// List categories.
    List,
    /// Delete a category; its transactions become uncategorized.
    Delete { id: i64 },
    /// Designate the variable-expense bucket (omit the id to clear it).
    Variable { id: Option<i64> },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// List description rules.
    List,
    /// Delete the rule for a description; surrounding and repeated whitespace is ignored.
    Delete { description: String },
    /// Apply all rules to uncategorized transactions.
    Apply,
}

#[derive(Subcommand)]
pub enum TxnCommands {
    /// List transactions attributed to a logical month.
    List {
        /// Month: YYYY-MM
        month: String,
    },
    /// Set a category (cascades to same-description transactions); omit to clear.
    Category {
        /// Transaction id or unique prefix
        id: String,
        category: Option<i64>,
    },
    /// Mark as transfer (excluded from all totals).
    Transfer {
        id: String,
        /// Unset instead of set
        #[arg(long)]
        off: bool,
    },
    /// Mark as investment (tracked separately, clears transfer).
    Investment {
        id: String,
        #[arg(long)]
        off: bool,
    },
    /// Mark income as occasional (excluded from the income average).
    Occasional {
        id: String,
        #[arg(long)]
        off: bool,
    },
    /// Set a free-text comment; omit the text to clear.
    Comment { id: String, text: Option<String> },
}

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Set the default monthly savings goal (shekels).
    Default { amount: String },
    /// Set a month's savings goal (shekels); omit the amount to fall back to the default.
    Month { month: String, amount: Option<String> },
    /// Show the effective savings goal for a month.
    Show { month: String },
}

#[derive(Subcommand)]
pub enum IncomeOverrideCommands {
    /// Set the expected regular monthly income (shekels).
    Set { amount: String },
    /// Remove the override.
    Clear,
    /// Show the current override.
    Show,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Logical months that have data.
    Months,
    /// Monthly summary by category.
    Month {
        /// Month: YYYY-MM
        month: String,
        #[arg(long)]
        json: bool,
    },
    /// Year-to-date totals.
    Year {
        year: i32,
        #[arg(long)]
        json: bool,
    },
    /// Three-month category expense averages.
    Averages {
        month: String,
        #[arg(long)]
        json: bool,
    },
    /// Expected income, fixed budget and variable-spending room.
    Budget {
        month: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum MaintenanceCommands {
    /// Recompute the transfer flag on every transaction (overwrites manual choices).
    RedetectTransfers,
    /// Mark every transaction attributed to a month as a transfer.
    ExcludeMonth { month: String },
}
