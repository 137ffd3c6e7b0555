//! CLI binary smoke tests using assert_cmd.
//!
//! These tests exercise the compiled `diagnose` binary to verify that
//! argument parsing, help text, training and error handling work end-to-end.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("diagnose").unwrap()
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("smoke"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("diagnose"));
}

// ---------------------------------------------------------------------------
// train
// ---------------------------------------------------------------------------

#[test]
fn train_missing_data_errors() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .current_dir(dir.path())
        .args(["train", "--no-tracking"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("data.csv"));
}

#[test]
fn train_nonexistent_config_errors() {
    cmd()
        .args(["train", "/nonexistent/train.json"])
        .assert()
        .failure();
}

#[test]
fn train_writes_model_and_run() {
    let dir = tempfile::tempdir().unwrap();
    let data = common::write_dataset(dir.path(), 15, 4);
    let runs = dir.path().join("runs");
    let config = common::write_quick_config(dir.path(), Some(&runs));
    let model = dir.path().join("out").join("model.json");

    cmd()
        .arg("train")
        .arg(&config)
        .arg("--train_data")
        .arg(&data)
        .arg("--output_file")
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::contains("Best hyperparameters: n_estimators="))
        .stdout(predicate::str::contains("Test accuracy:"))
        .stdout(predicate::str::contains("Model saved to"));

    assert!(model.exists());
    let experiment = runs.join("test-experiment");
    let run_dirs: Vec<_> = std::fs::read_dir(&experiment).unwrap().collect();
    assert_eq!(run_dirs.len(), 1);
    let run_dir = run_dirs[0].as_ref().unwrap().path();
    assert!(run_dir.join("metrics.json").exists());
    assert!(run_dir.join("artifacts").join("model.json").exists());
}

#[test]
fn train_rejects_non_csv_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    std::fs::write(&path, "id,diagnosis\n").unwrap();
    cmd()
        .args(["train", "--no-tracking", "-d"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains(".csv extension"));
}

// ---------------------------------------------------------------------------
// serve / smoke
// ---------------------------------------------------------------------------

#[test]
fn serve_missing_model_errors() {
    cmd()
        .args(["serve", "--model", "/nonexistent/model.json", "--port", "0"])
        .assert()
        .failure();
}

#[test]
fn smoke_unreachable_server_errors() {
    cmd()
        .args(["smoke", "--url", "http://127.0.0.1:9/predict", "--timeout", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Request to http://127.0.0.1:9/predict failed"));
}
