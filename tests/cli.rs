//! End-to-end tests of the `tally` binary against a temporary data directory

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tally(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.env("TALLY_CLI_DATA_DIR", data_dir.path())
        .env_remove("TALLY_LOG");
    cmd
}

fn initialized() -> TempDir {
    let data_dir = TempDir::new().unwrap();
    tally(&data_dir).arg("init").assert().success();
    data_dir
}

/// Add a transaction and return its `$<uuid>` reference token
fn add(data_dir: &TempDir, description: &str, expression: &str, frequency: &str) -> String {
    let output = tally(data_dir)
        .args([
            "transaction",
            "add",
            description,
            expression,
            "--frequency",
            frequency,
            "--date",
            "2025-01-01",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?}", output);

    String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .find(|line| line.contains("Reference:"))
        .and_then(|line| line.split_whitespace().last())
        .unwrap()
        .to_string()
}

#[test]
fn test_init_seeds_categories() {
    let data_dir = initialized();

    tally(&data_dir)
        .args(["category", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Groceries"))
        .stdout(predicate::str::contains("Emergency Fund"));
}

#[test]
fn test_commands_require_init() {
    let data_dir = TempDir::new().unwrap();

    tally(&data_dir)
        .args(["transaction", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tally init"));
}

#[test]
fn test_eval_plain_arithmetic() {
    let data_dir = TempDir::new().unwrap();

    tally(&data_dir)
        .args(["eval", "2 + 3 * 4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 + 3 * 4 = 14"));

    tally(&data_dir)
        .args(["eval", "-100 * 52", "--frequency", "year"])
        .assert()
        .success()
        .stdout(predicate::str::contains("expense"))
        .stdout(predicate::str::contains("-433.33 per month"));
}

#[test]
fn test_eval_rejects_bad_input() {
    let data_dir = TempDir::new().unwrap();

    tally(&data_dir)
        .args(["eval", "1 / 0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot evaluate transaction expression"));

    tally(&data_dir)
        .args(["eval", "2 ^ 3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsafe"));

    tally(&data_dir)
        .args(["eval", "5", "--frequency", "monthly"])
        .assert()
        .failure();
}

#[test]
fn test_references_and_summary() {
    let data_dir = initialized();

    let salary = add(&data_dir, "Salary", "3000", "month");
    add(&data_dir, "Tithe", &format!("{} * -0.1", salary), "month");
    add(&data_dir, "Insurance", "-1200", "year");

    tally(&data_dir)
        .args(["eval", &format!("{} / 2", salary)])
        .assert()
        .success()
        .stdout(predicate::str::contains("= 1500"));

    tally(&data_dir)
        .args(["report", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$3000.00"))
        .stdout(predicate::str::contains("$400.00"))
        .stdout(predicate::str::contains("$2600.00"))
        .stdout(predicate::str::contains("Transactions: 3"));

    tally(&data_dir)
        .args(["report", "summary", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"net_amount\": 2600.0"));
}

#[test]
fn test_unknown_reference_is_rejected() {
    let data_dir = initialized();

    tally(&data_dir)
        .args([
            "transaction",
            "add",
            "Broken",
            "$00000000-0000-4000-8000-000000000000 + 1",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reference not found"));
}

#[test]
fn test_delete_referenced_transaction() {
    let data_dir = initialized();

    let salary = add(&data_dir, "Salary", "3000", "month");
    add(&data_dir, "Savings", &format!("{} * 0.2", salary), "month");
    let salary_id = salary.trim_start_matches('$');

    tally(&data_dir)
        .args(["transaction", "delete", salary_id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Savings"));

    tally(&data_dir)
        .args(["transaction", "delete", salary_id, "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted transaction: Salary"));
}

#[test]
fn test_export_json() {
    let data_dir = initialized();
    add(&data_dir, "Rent", "-1200", "month");
    let output = data_dir.path().join("out.json");

    tally(&data_dir)
        .args(["export", "json", "--output"])
        .arg(&output)
        .assert()
        .success();

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.contains("\"schema_version\""));
    assert!(content.contains("Rent"));
}

#[test]
fn test_frequencies_and_config() {
    let data_dir = initialized();

    tally(&data_dir)
        .arg("frequencies")
        .assert()
        .success()
        .stdout(predicate::str::contains("fortnight"))
        .stdout(predicate::str::contains("0 0 1,15 * *"));

    tally(&data_dir)
        .args(["config", "currency_symbol", "€"])
        .assert()
        .success();

    tally(&data_dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("currency_symbol:        €"));
}
