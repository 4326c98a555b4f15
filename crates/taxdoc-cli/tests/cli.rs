use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const STATEMENT: &str = "HDFC Bank\nAccount No: 50100123456789\n\
    01/01/2024  Salary credit  50000.00\n\
    02/01/2024  Petrol pump Dr  2000.00\n";

fn taxdoc() -> Command {
    Command::cargo_bin("taxdoc").unwrap()
}

/// Empty config so the tests never read the user's own file.
fn write_config(dir: &Path) -> String {
    let path = dir.join("config.json");
    fs::write(&path, "{}").unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_help_lists_commands() {
    taxdoc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("engines"));
}

#[test]
fn test_parse_detects_bank_statement() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    let input = dir.path().join("statement.txt");
    fs::write(&input, STATEMENT).unwrap();

    taxdoc()
        .args(["--config", config.as_str(), "parse"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"document_type\": \"bank_statement\""))
        .stdout(predicate::str::contains("Salary credit"));
}

#[test]
fn test_parse_invoice_csv() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    let input = dir.path().join("invoice.txt");
    fs::write(&input, "Tax Invoice\nInvoice No: INV-2024-001\nTotal: 11,800.00\n").unwrap();

    taxdoc()
        .args(["--config", config.as_str(), "parse", "--type", "invoice", "-f", "csv"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("invoice_number,date,vendor_name"));
}

#[test]
fn test_parse_rejects_unknown_type() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("statement.txt");
    fs::write(&input, STATEMENT).unwrap();

    taxdoc()
        .args(["parse", "--type", "receipt"])
        .arg(&input)
        .assert()
        .failure();
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("statement.txt");
    fs::write(&input, STATEMENT).unwrap();
    let missing = dir.path().join("nope.json");

    taxdoc()
        .arg("--config")
        .arg(&missing)
        .arg("parse")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config"));
}

#[test]
fn test_config_path_reports_status() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taxdoc.json");

    taxdoc()
        .arg("--config")
        .arg(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"))
        .stdout(predicate::str::contains("taxdoc config init"));
}

#[test]
fn test_config_init_set_get() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taxdoc.json");
    let path_arg = path.to_string_lossy().into_owned();

    taxdoc()
        .args(["--config", path_arg.as_str(), "config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    taxdoc()
        .args(["--config", path_arg.as_str(), "config", "set", "ocr.worker_threads", "2"])
        .assert()
        .success();

    taxdoc()
        .args(["--config", path_arg.as_str(), "config", "get", "ocr.worker_threads"])
        .assert()
        .success()
        .stdout(predicate::str::diff("2\n"));

    taxdoc()
        .args(["--config", path_arg.as_str(), "config", "set", "ocr.worker_threads", "0"])
        .assert()
        .failure();
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    taxdoc()
        .args(["--config", config.as_str(), "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_process_rejects_unsupported_upload() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    let input = dir.path().join("notes.txt");
    fs::write(&input, "Invoice No: 1").unwrap();

    taxdoc()
        .args(["--config", config.as_str(), "process"])
        .arg(&input)
        .assert()
        .failure();
}
