use std::path::Path;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

fn tazrim(home: &Path, db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tazrim").expect("binary exists");
    cmd.env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(db);
    cmd
}

fn setup() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("tazrim.db");
    tazrim(dir.path(), &db)
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Initialized"));
    (dir, db)
}

fn write_feed(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("feed.csv");
    std::fs::write(
        &path,
        "date,amount,description,memo\n\
         2024-02-01,13000.00,משכורת פברואר,\n\
         2024-01-15,-30.00,קפה,\n\
         2024-01-20,\"-1,200.00\",העברה בין חשבונות,\n\
         not-a-date,1,x,\n",
    )
    .unwrap();
    path
}

#[test]
fn missing_database_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    tazrim(dir.path(), &dir.path().join("missing.db"))
        .args(["categories", "list"])
        .assert()
        .failure()
        .stderr(contains("Database not found"));
}

#[test]
fn import_counts_new_and_malformed_rows() {
    let (dir, db) = setup();
    let feed = write_feed(dir.path());
    tazrim(dir.path(), &db)
        .arg("import")
        .arg(&feed)
        .args(["--account", "leumi"])
        .assert()
        .success()
        .stdout(contains("3 new").and(contains("1 malformed")));

    tazrim(dir.path(), &db)
        .arg("import")
        .arg(&feed)
        .args(["--account", "leumi"])
        .assert()
        .success()
        .stdout(contains("0 new").and(contains("3 refreshed")));
}

#[test]
fn early_salary_reports_in_previous_month() {
    let (dir, db) = setup();
    let feed = write_feed(dir.path());
    tazrim(dir.path(), &db)
        .arg("import")
        .arg(&feed)
        .args(["--account", "leumi"])
        .assert()
        .success();

    tazrim(dir.path(), &db)
        .args(["report", "month", "2024-01", "--json"])
        .assert()
        .success()
        .stdout(
            contains("\"income\": 1300000")
                .and(contains("\"expenses\": 3000"))
                .and(contains("\"outgoing\": 120000")),
        );

    tazrim(dir.path(), &db)
        .args(["report", "month", "2024-02", "--json"])
        .assert()
        .success()
        .stdout(contains("\"transaction_count\": 0"));

    tazrim(dir.path(), &db)
        .args(["report", "months"])
        .assert()
        .success()
        .stdout(contains("2024-02").and(contains("2024-01")));
}

#[test]
fn budget_uses_goal_and_income_override() {
    let (dir, db) = setup();
    tazrim(dir.path(), &db).args(["goal", "default", "2,000"]).assert().success();
    tazrim(dir.path(), &db)
        .args(["income-override", "set", "13500"])
        .assert()
        .success();

    tazrim(dir.path(), &db)
        .args(["report", "budget", "2024-05", "--json"])
        .assert()
        .success()
        .stdout(
            contains("\"expected_income\": 1350000")
                .and(contains("\"savings_goal\": 200000"))
                .and(contains("\"available_for_variable\": 1150000")),
        );
}

#[test]
fn invalid_month_is_rejected() {
    let (dir, db) = setup();
    tazrim(dir.path(), &db)
        .args(["report", "month", "2024-13"])
        .assert()
        .failure()
        .stderr(contains("Invalid month"));
}

#[test]
fn out_of_range_year_is_rejected() {
    let (dir, db) = setup();
    tazrim(dir.path(), &db)
        .args(["report", "month", "262142-12"])
        .assert()
        .failure()
        .stderr(contains("Invalid date").and(contains("outside 1-9999")));
}
