mod attribution;
mod budget;
mod categories;
mod categorizer;
mod classifier;
mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod ledger;
mod models;
mod reports;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{
    CategoriesCommands, Cli, Commands, GoalCommands, IncomeOverrideCommands, MaintenanceCommands,
    ReportCommands, RulesCommands, TxnCommands,
};

fn init_tracing() {
    let fallback = settings::load_settings()
        .log_level
        .unwrap_or_else(|| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let db = cli.db.as_deref();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir, db),
        Commands::Import { file, account } => cli::import::run(db, &file, &account),
        Commands::Categories { command } => match command {
            CategoriesCommands::Add { name, color } => cli::categories::add(db, &name, color.as_deref()),
            CategoriesCommands::List => cli::categories::list(db),
            CategoriesCommands::Delete { id } => cli::categories::delete(db, id),
            CategoriesCommands::Variable { id } => cli::categories::variable(db, id),
        },
        Commands::Rules { command } => match command {
            RulesCommands::List => cli::rules::list(db),
            RulesCommands::Delete { description } => cli::rules::delete(db, &description),
            RulesCommands::Apply => cli::rules::apply(db),
        },
        Commands::Txn { command } => match command {
            TxnCommands::List { month } => cli::txn::list(db, &month),
            TxnCommands::Category { id, category } => cli::txn::category(db, &id, category),
            TxnCommands::Transfer { id, off } => cli::txn::transfer(db, &id, !off),
            TxnCommands::Investment { id, off } => cli::txn::investment(db, &id, !off),
            TxnCommands::Occasional { id, off } => cli::txn::occasional(db, &id, !off),
            TxnCommands::Comment { id, text } => cli::txn::comment(db, &id, text.as_deref()),
        },
        Commands::Goal { command } => match command {
            GoalCommands::Default { amount } => cli::goals::set_default(db, &amount),
            GoalCommands::Month { month, amount } => cli::goals::set_month(db, &month, amount.as_deref()),
            GoalCommands::Show { month } => cli::goals::show(db, &month),
        },
        Commands::IncomeOverride { command } => match command {
            IncomeOverrideCommands::Set { amount } => cli::goals::set_income_override(db, Some(amount.as_str())),
            IncomeOverrideCommands::Clear => cli::goals::set_income_override(db, None),
            IncomeOverrideCommands::Show => cli::goals::show_income_override(db),
        },
        Commands::Report { command } => match command {
            ReportCommands::Months => cli::report::months(db),
            ReportCommands::Month { month, json } => cli::report::month(db, &month, json),
            ReportCommands::Year { year, json } => cli::report::year(db, year, json),
            ReportCommands::Averages { month, json } => cli::report::averages(db, &month, json),
            ReportCommands::Budget { month, json } => cli::report::budget(db, &month, json),
        },
        Commands::Maintenance { command } => match command {
            MaintenanceCommands::RedetectTransfers => cli::maintenance::redetect(db),
            MaintenanceCommands::ExcludeMonth { month } => cli::maintenance::exclude(db, &month),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
