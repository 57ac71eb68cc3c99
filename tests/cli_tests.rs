//! End-to-end tests of the sandbox-runner binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[allow(deprecated)] // cargo_bin works fine; the replacement macro is unstable
fn runner() -> Command {
    Command::cargo_bin("sandbox-runner").expect("binary `sandbox-runner` should be built")
}

#[test]
fn echo_run_prints_report() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.tsv");
    let log = dir.path().join("run.log");

    runner()
        .arg("--output")
        .arg(&out)
        .arg("--log")
        .arg(&log)
        .args(["--", "echo", "a,b,c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User CPU Time: "))
        .stdout(predicate::str::contains("System CPU Time: "))
        .stdout(predicate::str::contains("Maximum Resident Set Size: "));

    assert_eq!(fs::read_to_string(&out).unwrap(), "a\tb\tc\n");
    assert!(log.exists());
}

#[test]
fn missing_output_prints_usage_and_creates_nothing() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("run.log");

    runner()
        .arg("--log")
        .arg(&log)
        .args(["--", "echo", "hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));

    assert!(!log.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn missing_command_prints_usage() {
    let dir = tempdir().unwrap();

    runner()
        .arg("--output")
        .arg(dir.path().join("out.tsv"))
        .arg("--log")
        .arg(dir.path().join("run.log"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));

    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn no_arguments_fails() {
    runner()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn missing_executable_fails_with_empty_log() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("run.log");

    runner()
        .arg("--output")
        .arg(dir.path().join("out.tsv"))
        .arg("--log")
        .arg(&log)
        .args(["--", "/nonexistent/definitely-not-a-program"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("Failed to spawn"))
        .stderr(predicate::str::contains("Usage").not());

    assert!(log.exists());
    assert_eq!(fs::read(&log).unwrap().len(), 0);
}

#[test]
fn child_failure_still_exits_zero() {
    let dir = tempdir().unwrap();

    runner()
        .arg("--output")
        .arg(dir.path().join("out.tsv"))
        .arg("--log")
        .arg(dir.path().join("run.log"))
        .args(["--", "/bin/sh", "-c", "echo bad >&2; exit 4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User CPU Time: "));

    let logged = fs::read_to_string(dir.path().join("run.log")).unwrap();
    assert!(logged.starts_with('['));
    assert!(logged.ends_with("] bad\n"));
}

#[test]
fn input_flag_feeds_stdin() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in.csv");
    fs::write(&input, "x,y\n").unwrap();

    runner()
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(dir.path().join("out.tsv"))
        .arg("--log")
        .arg(dir.path().join("run.log"))
        .args(["--", "cat"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(dir.path().join("out.tsv")).unwrap(),
        "x\ty\n"
    );
}

#[test]
fn json_report_is_parseable() {
    let dir = tempdir().unwrap();

    let output = runner()
        .arg("--output")
        .arg(dir.path().join("out.tsv"))
        .arg("--log")
        .arg(dir.path().join("run.log"))
        .args(["--json", "--", "/bin/sh", "-c", "exit 2"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["exit_code"], 2);
    assert!(report["user_time"].as_f64().unwrap() >= 0.0);
    assert_eq!(report["timed_out"], false);
}

#[test]
fn timeout_flag_kills_child() {
    let dir = tempdir().unwrap();

    let output = runner()
        .arg("--output")
        .arg(dir.path().join("out.tsv"))
        .arg("--log")
        .arg(dir.path().join("run.log"))
        .args(["--timeout", "1", "--json", "--", "sleep", "30"])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["timed_out"], true);
    assert_eq!(report["signal"], 9);
}

#[test]
fn verbose_flag_logs_supervisor_activity() {
    let dir = tempdir().unwrap();

    runner()
        .env_remove("RUST_LOG")
        .arg("--output")
        .arg(dir.path().join("out.tsv"))
        .arg("--log")
        .arg(dir.path().join("run.log"))
        .args(["-v", "--", "echo", "hi"])
        .assert()
        .success()
        .stderr(predicate::str::contains("execution::process"))
        .stderr(predicate::str::contains("Spawned 'echo hi'"));
}

#[test]
fn quiet_by_default() {
    let dir = tempdir().unwrap();

    runner()
        .env_remove("RUST_LOG")
        .arg("--output")
        .arg(dir.path().join("out.tsv"))
        .arg("--log")
        .arg(dir.path().join("run.log"))
        .args(["--", "echo", "hi"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn help_lists_options() {
    runner()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--log"))
        .stdout(predicate::str::contains("--input"));
}
