//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomoloop"))
        .args(args)
        .env("POMOLOOP_DATA_DIR", dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_timer_status_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(out["snapshot"]["phase"], "Hypothesize");
    assert_eq!(out["snapshot"]["clock"], "02:00");
    assert_eq!(out["snapshot"]["running"], false);
    assert!(dir.path().join("config.toml").exists());
    assert!(dir.path().join("pomoloop.db").exists());
}

#[test]
fn test_timer_start_then_pause() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_json(dir.path(), &["timer", "start"]);
    assert_eq!(out["snapshot"]["running"], true);
    assert_eq!(out["events"][0]["type"], "TimerStarted");

    let out = run_json(dir.path(), &["timer", "pause"]);
    assert_eq!(out["snapshot"]["running"], false);
    assert!((out["snapshot"]["momentum"].as_f64().unwrap() - 0.5).abs() < 1e-9);
}

#[test]
fn test_next_and_tick_through_phases() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_json(dir.path(), &["timer", "next"]);
    assert_eq!(out["snapshot"]["phase"], "Focus");

    run_json(dir.path(), &["config", "micro-break", "off"]);
    run_json(dir.path(), &["timer", "start"]);
    let out = run_json(dir.path(), &["timer", "tick", "900"]);
    assert_eq!(out["snapshot"]["phase"], "Reflect");

    let (stdout, _, code) = run_cli(dir.path(), &["log"]);
    assert_eq!(code, 0);
    assert!(stdout.contains(" · Focus · momentum 0.50"));

    let stats = run_json(dir.path(), &["stats", "all"]);
    assert_eq!(stats["focus_sessions"], 1);
    assert_eq!(stats["focus_min"], 14);
}

#[test]
fn test_nudge_negative() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_json(dir.path(), &["timer", "nudge", "-30"]);
    assert_eq!(out["snapshot"]["clock"], "01:30");
}

#[test]
fn test_preset_and_slot() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["timer", "set-phase", "focus"]);
    let out = run_json(dir.path(), &["timer", "slot", "4"]);
    assert_eq!(out["snapshot"]["target_focus_secs"], 1680);
    assert_eq!(out["snapshot"]["clock"], "28:00");

    let (_, _, code) = run_cli(dir.path(), &["timer", "slot", "5"]);
    assert_ne!(code, 0);
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "preset", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_task_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["task", "add", "write docs", "--size", "s"]);
    run_json(dir.path(), &["task", "add", "fix bug"]);
    run_json(dir.path(), &["task", "down", "1"]);
    run_json(dir.path(), &["task", "done", "1"]);

    let tasks = run_json(dir.path(), &["task", "list", "--json"]);
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["title"], "fix bug");
    assert_eq!(tasks[0]["done"], true);
    assert_eq!(tasks[1]["size"], "S");

    let (stdout, _, code) = run_cli(dir.path(), &["insight"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Try: write docs (S)"));

    let (_, _, code) = run_cli(dir.path(), &["task", "rm", "3"]);
    assert_ne!(code, 0);
    let (_, _, code) = run_cli(dir.path(), &["task", "rm", "0"]);
    assert_ne!(code, 0);
}

#[test]
fn test_config_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "durations.focus_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "840");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "durations.focus_secs", "600"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "durations.focus_secs"]);
    assert_eq!(stdout.trim(), "600");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "no.such.key", "1"]);
    assert_ne!(code, 0);

    let (_, _, code) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let config = run_json(dir.path(), &["config", "list"]);
    assert_eq!(config["durations"]["focus_secs"], 840);
}

#[test]
fn test_sound_toggle_is_saved() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["config", "sound", "on"]);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "sound"]);
    assert_eq!(stdout.trim(), "true");
}

#[test]
fn test_tick_rejects_non_finite_and_survives_huge() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "tick", "inf"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("finite"));

    run_json(dir.path(), &["timer", "start"]);
    let out = run_json(dir.path(), &["timer", "tick", "1e14"]);
    assert_eq!(out["snapshot"]["phase"], "Focus");
    assert_eq!(out["events"][0]["type"], "PhaseCompleted");
}

#[test]
fn test_run_loop_completes_phase() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["timer", "set-phase", "Reflect", "--secs", "1"]);

    let (_, stderr, code) = run_cli(dir.path(), &["run", "--frame-ms", "10"]);
    assert_eq!(code, 0, "run failed: {stderr}");

    let log = run_json(dir.path(), &["log", "--json"]);
    let log = log.as_array().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["phase"], "Reflect");

    let out = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(out["snapshot"]["phase"], "Hypothesize");
    assert_eq!(out["snapshot"]["running"], false);
}
