//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use omr_grade_test_support::SyntheticSheetBuilder;
use predicates::prelude::*;

const KEY: &str = "ABCDEABCDEABCDEABCDEABCDEA";

/// Workspace with an isolated XDG config dir and a project dir holding sheets.
struct Workspace {
    _root: tempfile::TempDir,
    xdg: PathBuf,
    project: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let xdg = root.path().join("xdg");
        let project = root.path().join("project");
        fs::create_dir_all(xdg.join("omr-grade")).unwrap();
        fs::create_dir_all(&project).unwrap();

        for (name, answers) in [("key.png", KEY), ("r1.png", "ABCDEABCDEABCDEABCDE------")] {
            let png = SyntheticSheetBuilder::standard().answers(answers).png();
            fs::write(project.join(name), png).unwrap();
        }

        Self {
            _root: root,
            xdg,
            project,
        }
    }

    fn write_xdg(&self, toml: &str) {
        fs::write(self.xdg.join("omr-grade").join("config.toml"), toml).unwrap();
    }

    fn write_project(&self, toml: &str) {
        fs::write(self.project.join(".omr-grade.toml"), toml).unwrap();
    }

    fn project_path(&self) -> &Path {
        &self.project
    }

    fn grade(&self) -> Command {
        let mut cmd = Command::cargo_bin("omr-grade").unwrap();
        cmd.env("XDG_CONFIG_HOME", &self.xdg)
            .current_dir(&self.project)
            .args(["grade", "--key", "key.png", "r1.png"]);
        cmd
    }
}

const GRID: &str = "
[grid]
x = 40
y = 40
";

#[test]
fn test_project_config_supplies_grid() {
    let ws = Workspace::new();
    ws.write_project(GRID);
    ws.grade()
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "index,score,max,percent\n1,20,26,76.9\n",
        ));
}

#[test]
fn test_xdg_config_supplies_grid() {
    let ws = Workspace::new();
    ws.write_xdg(GRID);
    ws.grade()
        .assert()
        .success()
        .stdout(predicate::str::contains("1,20,26,76.9"));
}

#[test]
fn test_project_config_applies_format() {
    let ws = Workspace::new();
    ws.write_project(&format!("{GRID}\n[output]\nformat = 'jsonl'\n"));
    ws.grade()
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{").and(predicate::str::contains("\"score\":20")));
}

#[test]
fn test_project_overrides_xdg() {
    let ws = Workspace::new();
    ws.write_xdg(&format!("{GRID}\n[output]\nformat = 'jsonl'\n"));
    ws.write_project("[output]\nformat = 'csv'\n");
    ws.grade()
        .assert()
        .success()
        .stdout(predicate::str::starts_with("index,score,max,percent"));
}

#[test]
fn test_cli_overrides_config() {
    let ws = Workspace::new();
    ws.write_project(&format!("{GRID}\n[output]\nformat = 'jsonl'\n"));
    ws.grade()
        .args(["--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("index,score,max,percent"));
}

#[test]
fn test_cli_grid_overrides_config_grid() {
    let ws = Workspace::new();
    ws.write_project("[grid]\nx = 0\ny = 0\n");
    ws.grade()
        .args(["--x", "40", "--y", "40"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,20,26,76.9"));
}

#[test]
fn test_config_found_in_parent_directory() {
    let ws = Workspace::new();
    ws.write_project(GRID);
    let nested = ws.project_path().join("nested");
    fs::create_dir(&nested).unwrap();

    let mut cmd = Command::cargo_bin("omr-grade").unwrap();
    cmd.env("XDG_CONFIG_HOME", &ws.xdg)
        .current_dir(&nested)
        .args(["grade", "--key", "../key.png", "../r1.png"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,20,26,76.9"));
}

#[test]
fn test_out_of_range_config_warns_then_fails() {
    let ws = Workspace::new();
    ws.write_project(&format!("{GRID}\n[selection]\nfill_pct = 150.0\n"));
    ws.grade()
        .assert()
        .code(1)
        .stderr(
            predicate::str::contains("warning: selection.fill_pct must be 0-100")
                .and(predicate::str::contains("fill_pct")),
        );
}

#[test]
fn test_zero_max_width_config_fails() {
    let ws = Workspace::new();
    ws.write_project(&format!("{GRID}\n[input]\nmax_width = 0\n"));
    ws.grade()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("max_width must be >= 1"));
}

#[test]
fn test_unparsable_config_is_ignored() {
    let ws = Workspace::new();
    ws.write_project("[grid\nx = 40\n");
    ws.grade()
        .assert()
        .success()
        .stderr(predicate::str::contains("Failed to parse config file"));
}
