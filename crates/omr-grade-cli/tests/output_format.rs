//! Output format tests.
//!
//! Checks the CSV layout and the JSON/JSONL record shape of `grade`, and the
//! JSON document printed by `detect`.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use omr_grade_test_support::SyntheticSheetBuilder;
use predicates::prelude::*;
use serde_json::Value;

const KEY: &str = "ABCDEABCDEABCDEABCDEABCDEA";

fn omr_grade(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("omr-grade").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir).current_dir(dir);
    cmd
}

fn write_sheet(dir: &Path, name: &str, answers: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, SyntheticSheetBuilder::standard().answers(answers).png()).unwrap();
    path
}

fn grade_cmd(dir: &Path, format: &str) -> Command {
    let key = write_sheet(dir, "key.png", KEY);
    let r1 = write_sheet(dir, "r1.png", KEY);
    let r2 = write_sheet(dir, "r2.png", "ABCDEABCDEABCDEABCDE------");

    let mut cmd = omr_grade(dir);
    cmd.args(["grade", "--x", "40", "--y", "40", "--format", format, "--key"])
        .arg(key)
        .arg(r1)
        .arg(r2);
    cmd
}

#[test]
fn test_csv_output() {
    let temp = tempfile::tempdir().unwrap();
    grade_cmd(temp.path(), "csv")
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "index,score,max,percent\n1,26,26,100\n2,20,26,76.9\n",
        ));
}

#[test]
fn test_csv_is_default_format() {
    let temp = tempfile::tempdir().unwrap();
    let key = write_sheet(temp.path(), "key.png", KEY);

    omr_grade(temp.path())
        .args(["grade", "--x", "40", "--y", "40", "--key"])
        .arg(&key)
        .arg(&key)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("index,score,max,percent\n"));
}

#[test]
fn test_jsonl_output_one_record_per_line() {
    let temp = tempfile::tempdir().unwrap();
    let output = grade_cmd(temp.path(), "jsonl").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let records: Vec<Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 2);

    let second = &records[1];
    assert_eq!(second["index"], 2);
    assert_eq!(second["score"], 20);
    assert_eq!(second["max"], 26);
    assert_eq!(second["percent"], 76.9);
    assert!(second["path"].as_str().unwrap().ends_with("r2.png"));
    assert!(second["timestamp"].as_str().unwrap().ends_with('Z'));

    let answers = second["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 26);
    assert_eq!(answers[0], "A");
    assert_eq!(answers[25], Value::Null);
}

#[test]
fn test_json_output_is_array() {
    let temp = tempfile::tempdir().unwrap();
    let output = grade_cmd(temp.path(), "json").output().unwrap();
    assert!(output.status.success());

    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["score"], 26);
    assert_eq!(rows[0]["percent"], 100.0);
}

#[test]
fn test_json_pretty_output() {
    let temp = tempfile::tempdir().unwrap();
    let mut cmd = grade_cmd(temp.path(), "json");
    cmd.arg("--pretty");
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("[\n  {"));
}

#[test]
fn test_output_file() {
    let temp = tempfile::tempdir().unwrap();
    let out = temp.path().join("results.csv");

    let mut cmd = grade_cmd(temp.path(), "csv");
    cmd.arg("--output").arg(&out);
    cmd.assert().success().stdout(predicate::str::is_empty());

    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, "index,score,max,percent\n1,26,26,100\n2,20,26,76.9\n");
}

#[test]
fn test_detect_json_shape() {
    let temp = tempfile::tempdir().unwrap();
    let sheet = write_sheet(temp.path(), "sheet.png", "ABC-E");

    let output = omr_grade(temp.path())
        .args(["detect", "--x", "40", "--y", "40"])
        .arg(&sheet)
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed["path"].as_str().unwrap().ends_with("sheet.png"));
    assert_eq!(parsed["answered"], 4);
    assert!(parsed.get("scores").is_none());

    let answers = parsed["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 26);
    assert_eq!(answers[2], "C");
    assert_eq!(answers[3], Value::Null);
    assert_eq!(answers[4], "E");
}

#[test]
fn test_detect_with_scores() {
    let temp = tempfile::tempdir().unwrap();
    let sheet = write_sheet(temp.path(), "sheet.png", "B");

    let output = omr_grade(temp.path())
        .args(["detect", "--x", "40", "--y", "40", "--scores"])
        .arg(&sheet)
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    let scores = parsed["scores"].as_array().unwrap();
    assert_eq!(scores.len(), 26);

    let first = &scores[0];
    assert_eq!(first["answer"], "B");
    let ratios = first["ratios"].as_array().unwrap();
    assert_eq!(ratios.len(), 5);
    assert!(ratios[1].as_f64().unwrap() > ratios[0].as_f64().unwrap());
}
