//! CLI integration tests for pfd
//!
//! These tests run the binary against small plan, milestone and
//! precondition files written to a temporary directory.

use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get a command instance for the pfd binary whose global config lives
/// under `home`
fn pfd_cmd_with_home(home: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("pfd"));
    cmd.env_remove("PFD_CONFIG")
        .env_remove("RUST_LOG")
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

/// Get a command instance for the pfd binary, isolated from the user's
/// global config
fn pfd_cmd() -> assert_cmd::Command {
    pfd_cmd_with_home(&Path::new(env!("CARGO_TARGET_TMPDIR")).join("empty-home"))
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Two milestones in group `g`; M1 precedes M2 but its rework overlaps M2
fn setup_inputs() -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();

    let plan = write(
        &dir,
        "plan.json",
        r#"{
            "initial_state": { "time": 0.0 },
            "transitions": [
                {
                    "allocation": { "P1": {} },
                    "next_state": { "time": 1.0 }
                },
                {
                    "allocation": { "P1": {}, "P2": {} },
                    "next_state": { "time": 2.0, "completion_count": { "P1": 1 } }
                },
                {
                    "allocation": { "P2": {} },
                    "next_state": { "time": 3.0, "completion_count": { "P1": 1, "P2": 1 } }
                }
            ]
        }"#,
    );

    let milestones = write(
        &dir,
        "milestones.json",
        r#"[
            { "id": "M2", "processes": ["P2"], "groups": "g" },
            { "id": "M1", "processes": ["P1"], "successors": "M2", "groups": "g" }
        ]"#,
    );

    (dir, plan, milestones)
}

// =============================================================================
// Parse Tests
// =============================================================================

#[test]
fn test_parse_prints_normalized_form_and_tree() {
    pfd_cmd()
        .args(["parse", "\\exec(P1) && \\exec(P2) || \\true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(\\exec(P1) && \\exec(P2)) || \\true"))
        .stdout(predicate::str::contains("or\n  and\n    exec P1\n    exec P2\n  true"));
}

#[test]
fn test_parse_json_binds_context() {
    pfd_cmd()
        .args(["--format", "json", "parse", "\\complete(*)", "--context", "P7"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"kind":"all_reachable_feedback_sources_completed","context":"P7"}"#,
        ));
}

#[test]
fn test_parse_reports_syntax_error() {
    pfd_cmd()
        .args(["parse", "\\exec(P1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("offset 8"))
        .stderr(predicate::str::contains("expected ')'"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_global_default_format_applies_without_flag() {
    let home = TempDir::new().unwrap();
    let config_dir = home.path().join(".config").join("pfd-analyzer");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "default_format = \"json\"\n").unwrap();

    pfd_cmd_with_home(home.path())
        .args(["parse", "\\true"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"kind":"true"}"#));

    pfd_cmd_with_home(home.path())
        .args(["--format", "text", "parse", "\\true"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("\\true\n"));
}

// =============================================================================
// Check Tests
// =============================================================================

#[test]
fn test_check_clean_table() {
    let dir = TempDir::new().unwrap();
    let table = write(
        &dir,
        "pre.json",
        r#"[
            { "process": "P1" },
            { "process": "P2", "precondition": "\\exec(P1) && \\complete(*)" }
        ]"#,
    );

    pfd_cmd()
        .arg("check")
        .arg(&table)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 preconditions checked, no problems found"));
}

#[test]
fn test_check_reports_cycles_and_fails() {
    let dir = TempDir::new().unwrap();
    let table = write(
        &dir,
        "pre.jsonl",
        "{\"process\": \"P1\", \"precondition\": \"\\\\exec(P2)\"}\n\
         {\"process\": \"P2\", \"precondition\": \"\\\\exec(P1) || \\\\true\"}\n",
    );

    pfd_cmd()
        .arg("check")
        .arg(&table)
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "cyclic precondition reference: P1 -> P2 -> P1",
        ))
        .stderr(predicate::str::contains("1 problem(s) found"));
}

#[test]
fn test_check_json_lists_problems() {
    let dir = TempDir::new().unwrap();
    let table = write(
        &dir,
        "pre.json",
        r#"[{ "process": "P1", "precondition": "\\exec(P1" }]"#,
    );

    pfd_cmd()
        .args(["--format", "json", "check"])
        .arg(&table)
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""kind":"syntax""#))
        .stdout(predicate::str::contains(r#""position":8"#));
}

#[test]
fn test_check_missing_file() {
    pfd_cmd()
        .args(["check", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open does-not-exist.json"));
}

// =============================================================================
// Timeline Tests
// =============================================================================

#[test]
fn test_timeline_removes_overlap() {
    let (_dir, plan, milestones) = setup_inputs();

    pfd_cmd()
        .arg("timeline")
        .arg("--plan")
        .arg(&plan)
        .arg("--milestones")
        .arg(&milestones)
        .assert()
        .success()
        .stdout(predicate::str::contains("Group g (2 milestones):"))
        .stdout(predicate::str::contains("M1\t0\t1\nM2\t1\t3"));
}

#[test]
fn test_timeline_json() {
    let (_dir, plan, milestones) = setup_inputs();

    let output = pfd_cmd()
        .args(["--format", "json", "timeline", "--group", "g"])
        .arg("--plan")
        .arg(&plan)
        .arg("--milestones")
        .arg(&milestones)
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["g"]["M1"]["start"], 0.0);
    assert_eq!(json["g"]["M1"]["end"], 1.0);
    assert_eq!(json["g"]["M2"]["end"], 3.0);
}

#[test]
fn test_timeline_unknown_group() {
    let (_dir, plan, milestones) = setup_inputs();

    pfd_cmd()
        .args(["timeline", "--group", "nope"])
        .arg("--plan")
        .arg(&plan)
        .arg("--milestones")
        .arg(&milestones)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown group: nope"));
}

#[test]
fn test_timeline_rejects_cyclic_milestones() {
    let (dir, plan, _) = setup_inputs();
    let milestones = write(
        &dir,
        "cyclic.json",
        r#"[
            { "id": "M1", "processes": ["P1"], "successors": "M2", "groups": "g" },
            { "id": "M2", "processes": ["P2"], "successors": "M1", "groups": "g" }
        ]"#,
    );

    pfd_cmd()
        .arg("timeline")
        .arg("--plan")
        .arg(&plan)
        .arg("--milestones")
        .arg(&milestones)
        .assert()
        .failure()
        .stderr(predicate::str::contains("M1 -> M2"));
}

// =============================================================================
// Schedule Tests
// =============================================================================

#[test]
fn test_schedule_with_start_flag() {
    let (dir, plan, milestones) = setup_inputs();

    // 2021-01-01 is a Friday; one business day later is Monday
    pfd_cmd()
        .current_dir(dir.path())
        .args(["schedule", "--start", "2021-01-01"])
        .arg("--plan")
        .arg(&plan)
        .arg("--milestones")
        .arg(&milestones)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "g\tM1\t2021-01-01 09:00\t2021-01-04 09:00",
        ))
        .stdout(predicate::str::contains(
            "g\tM2\t2021-01-04 09:00\t2021-01-06 09:00",
        ));
}

#[test]
fn test_schedule_uses_project_config() {
    let (dir, plan, milestones) = setup_inputs();
    fs::create_dir_all(dir.path().join(".pfd")).unwrap();
    write(
        &dir,
        ".pfd/config.toml",
        r#"
project_start = "2021-01-04"

[calendar]
open = "08:00"
close = "12:00"
holidays = ["2021-01-05"]
"#,
    );

    pfd_cmd()
        .current_dir(dir.path())
        .arg("schedule")
        .arg("--plan")
        .arg(&plan)
        .arg("--milestones")
        .arg(&milestones)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "g\tM1\t2021-01-04 08:00\t2021-01-06 08:00",
        ));
}

#[test]
fn test_schedule_explicit_config() {
    let (dir, plan, milestones) = setup_inputs();
    let config = write(&dir, "other.toml", "project_start = \"2021-01-01\"\n");

    pfd_cmd()
        .arg("--config")
        .arg(&config)
        .args(["--format", "json", "schedule"])
        .arg("--plan")
        .arg(&plan)
        .arg("--milestones")
        .arg(&milestones)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""start":"2021-01-01T09:00:00""#));
}

#[test]
fn test_schedule_without_start_fails() {
    let (dir, plan, milestones) = setup_inputs();

    pfd_cmd()
        .current_dir(dir.path())
        .arg("schedule")
        .arg("--plan")
        .arg(&plan)
        .arg("--milestones")
        .arg(&milestones)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No project start date"));
}
