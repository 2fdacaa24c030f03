//! End-to-end tests that run real shell commands.

#![cfg(unix)]

use std::time::Duration;
use watchfor::cli::{resolve_config, run_watch, CliOverrides};
use watchfor::config::{AppConfig, EventFormat};
use watchfor::executor::{CommandExecutor, ShellExecutor};
use watchfor::watch::{run_watch_loop, EventKind, Termination, WatchConfig, WatchLoop, WatchMode};

#[test]
fn test_shell_exit_codes() {
    let mut exec = ShellExecutor::new();
    assert!(exec.run("true", &[]).unwrap().outcome());
    assert_eq!(exec.run("exit 3", &[]).unwrap().exit_code, 3);
    assert_eq!(
        exec.run("definitely-not-a-command-watchfor", &[]).unwrap().exit_code,
        127
    );
}

#[test]
fn test_callback_sees_event_environment() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let out = dir.path().join("event.txt");
    let callback = format!(
        "printf '%s %s %s' \"$WATCHFOR_EVENT\" \"$WATCHFOR_ITERATION\" \"$WATCHFOR_OUTCOME\" > '{}'",
        out.display()
    );

    let config = AppConfig::builder()
        .command("true")
        .interval_secs(0.0)
        .callback(EventKind::Success, callback)
        .build();
    let watch = WatchConfig::try_from(&config).unwrap();
    let report = WatchLoop::new(&watch, ShellExecutor::new()).run();

    assert!(report.succeeded);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "success 0 success");
}

#[test]
fn test_change_detected_through_filesystem() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let marker = dir.path().join("ready");
    let log = dir.path().join("events.log");

    // The heartbeat creates the marker on the third iteration.
    let heartbeat = format!(
        "[ \"$WATCHFOR_ITERATION\" -ge 2 ] && touch '{}'; true",
        marker.display()
    );
    let on_change = format!("echo \"$WATCHFOR_EVENT\" >> '{}'", log.display());

    let watch = WatchConfig::new(format!("test -f '{}'", marker.display()))
        .with_interval(Duration::from_millis(10))
        .with_mode(WatchMode::Change)
        .with_max_iterations(Some(20))
        .with_callbacks(watchfor::config::CallbackConfig {
            on_heartbeat: Some(heartbeat),
            on_change: Some(on_change),
            ..Default::default()
        });
    let report = WatchLoop::new(&watch, ShellExecutor::new()).run();

    assert_eq!(report.termination, Termination::Resolved);
    assert!(report.succeeded);
    assert_eq!(report.iterations, 2);
    assert_eq!(std::fs::read_to_string(&log).unwrap(), "change\n");
}

#[test]
fn test_run_watch_exit_status() {
    let ok = AppConfig::builder().command("true").build();
    assert_eq!(run_watch(&ok).unwrap(), 0);

    let exhausted = AppConfig::builder()
        .command("false")
        .interval_secs(0.0)
        .count(2)
        .build();
    assert_eq!(run_watch(&exhausted).unwrap(), 1);
}

#[test]
fn test_run_watch_requires_command() {
    assert!(run_watch(&AppConfig::default()).is_err());
}

#[test]
fn test_ndjson_stream_to_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let events = dir.path().join("events.ndjson");
    let config_path = dir.path().join("watchfor.yaml");
    std::fs::write(
        &config_path,
        "watch:\n  command: \"exit 1\"\n  interval: 0\n  count: 2\n  mode: fail\n",
    )
    .unwrap();

    let overrides = CliOverrides {
        format: Some(EventFormat::Json),
        output_file: Some(events.clone()),
        ..CliOverrides::default()
    };
    let (config, _) = resolve_config(Some(&config_path), &overrides).unwrap();
    let watch = WatchConfig::try_from(&config).unwrap();
    let report = run_watch_loop(&watch).unwrap();
    assert!(report.succeeded);

    let content = std::fs::read_to_string(&events).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let kinds: Vec<&str> = lines
        .iter()
        .map(|l| l["event"].as_str().unwrap_or(l["type"].as_str().unwrap()))
        .collect();
    assert_eq!(kinds, vec!["heartbeat", "outcome", "fail", "finish"]);
    assert_eq!(lines[3]["exit_status"], 0);
}
