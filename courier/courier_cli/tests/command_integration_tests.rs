use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::io::Write;

fn courier() -> Command {
    Command::cargo_bin("courier").unwrap()
}

fn run_json(args: &[&str]) -> Value {
    let output = courier().args(args).assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout should be JSON")
}

#[test]
fn test_echo_returns_message() {
    let report = run_json(&["echo", "--message", r#"["ping"]"#]);

    assert_eq!(report["actor"], "echo");
    assert_eq!(report["reply"], serde_json::json!(["ping"]));
}

#[test]
fn test_echo_rejects_non_array() {
    courier()
        .args(["echo", "--message", r#"{"not": "an array"}"#])
        .assert()
        .failure()
        .stderr(predicate::str::contains("message must be a JSON array"));
}

#[test]
fn test_send_to_missing_actor_reports_status() {
    let report = run_json(&["send", "--to", "missing"]);
    assert_eq!(report["status"], "destination-not-found");

    let report = run_json(&["send", "--to", "echo"]);
    assert_eq!(report["status"], "queued");
}

#[test]
fn test_broadcast_reaches_every_listener() {
    let report = run_json(&["broadcast", "--actors", "4", "--message", r#"["hi"]"#]);

    assert_eq!(report["recipients"], 4);
    let received = report["received"].as_object().unwrap();
    assert_eq!(received.len(), 4);
    assert!(received.values().all(|count| count == 1));
}

#[test]
fn test_timer_fires_once() {
    let report = run_json(&["timer", "--name", "tick", "--delay-ms", "10", "--value", "5"]);

    assert_eq!(report["killed"], false);
    assert_eq!(report["deliveries"], serde_json::json!([["tick", 5]]));
}

#[test]
fn test_killed_timer_never_fires() {
    let report = run_json(&["timer", "--delay-ms", "50", "--kill", "--wait-ms", "150"]);

    assert_eq!(report["killed"], true);
    assert_eq!(report["deliveries"], serde_json::json!([]));
}

#[test]
fn test_relay_forwards_token_and_result() {
    let report = run_json(&["relay", "--token", "tok", "--value", r#""r""#]);

    assert_eq!(report["collected"]["data"], serde_json::json!(["tok", "r"]));
    assert_eq!(report["collected"]["from"], "worker");
}

#[test]
fn test_config_file_is_applied() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[logging]\nlevel = \"debug\"\n\n[mailbox]\ncapacity = 8\ntimeout_ms = 20"
    )
    .unwrap();

    courier()
        .args(["--config", file.path().to_str().unwrap(), "echo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ping"))
        .stderr(predicate::str::contains("DEBUG"));
}

#[test]
fn test_log_level_flag_overrides_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

    courier()
        .args(["--config", file.path().to_str().unwrap(), "--log-level", "error", "echo"])
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG").not());
}

#[test]
fn test_bad_config_file_fails() {
    courier()
        .args(["--config", "/nonexistent/courier.toml", "echo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config file"));
}
