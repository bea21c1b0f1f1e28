//! CLI integration tests
//!
//! Tests for the command-line interface using assert_cmd.
//!
//! These tests verify:
//! - Help and version flags
//! - Configuration validation and output formats
//! - Precedence of CLI arguments and environment variables
//! - A single round against unreachable endpoints

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Get a command for the rabbitmq-watcher binary, isolated from the
/// caller's environment
#[allow(deprecated)]
fn cmd() -> Command {
    let mut cmd =
        Command::cargo_bin("rabbitmq-watcher").expect("Failed to find rabbitmq-watcher binary");
    for var in [
        "RMQW_CONFIG",
        "RMQW_PREFIX",
        "RMQW_INTERVAL",
        "RMQW_CARBON_HOST",
        "RMQW_CARBON_PORT",
        "RMQW_RMQ_USER",
        "RMQW_RMQ_PASS",
        "RMQW_RMQ_HOST",
        "RMQW_RMQ_PORT",
        "RMQW_QUEUES",
        "RMQW_INCLUDE_AUTO_DELETE",
        "RMQW_LOG_LEVEL",
        "RMQW_LOG_FORMAT",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Helper to create a temporary config file with given content
fn create_temp_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file.flush().expect("Failed to flush");
    file
}

#[test]
fn test_help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("--carbon-host"))
        .stdout(predicate::str::contains("--include-auto-delete"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_validate_valid_config() {
    let config = r#"
prefix: host1
interval_secs: 30
broker:
  host: mq.local
  port: 15672
  username: monitor
  password: secret
carbon:
  host: graphite.local
  port: 2003
report:
  queues: true
"#;

    let file = create_temp_config(config);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("host1"))
        .stdout(predicate::str::contains("graphite.local:2003"))
        .stdout(predicate::str::contains("secret").not());
}

#[test]
fn test_validate_json_config_file() {
    let config = r#"{"prefix": "host1", "carbon": {"host": "graphite.local", "port": 2004}}"#;
    let file = create_temp_config(config);

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("graphite.local:2004"));
}

#[test]
fn test_validate_json_output_redacts_password() {
    let file = create_temp_config("prefix: host1\nbroker:\n  password: secret\n");

    let output = cmd()
        .arg("-c")
        .arg(file.path())
        .args(["--validate", "--output-format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["prefix"], "host1");
    assert_eq!(parsed["broker"]["password"], "********");
    assert_eq!(parsed["interval_secs"], 10);
}

#[test]
fn test_validate_yaml_output() {
    let file = create_temp_config("prefix: host1\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .args(["--validate", "--output-format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prefix: host1"))
        .stderr(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_invalid_yaml_fails() {
    let file = create_temp_config("broker:\n  host: [not valid yaml\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .timeout(Duration::from_secs(5))
        .assert()
        .failure();
}

#[test]
fn test_interval_zero_fails() {
    let file = create_temp_config("interval_secs: 0\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .arg("--validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Interval"));
}

#[test]
fn test_cli_interval_zero_fails() {
    cmd()
        .args(["-c", "/nonexistent/path/config.yaml", "-i", "0", "--validate"])
        .assert()
        .failure();
}

#[test]
fn test_missing_config_file_uses_defaults() {
    cmd()
        .args(["-c", "/nonexistent/path/config.yaml", "-P", "host1", "--validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1:2003"))
        .stdout(predicate::str::contains("15672"));
}

#[test]
fn test_cli_overrides_config_file() {
    let file = create_temp_config("prefix: from-file\ncarbon:\n  port: 2003\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .args(["-P", "from-cli", "-p", "2010", "--validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from-cli"))
        .stdout(predicate::str::contains(":2010"))
        .stdout(predicate::str::contains("from-file").not());
}

#[test]
fn test_env_override() {
    let file = create_temp_config("prefix: from-file\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .env("RMQW_PREFIX", "from-env")
        .env("RMQW_QUEUES", "true")
        .arg("--validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("from-env"))
        .stdout(predicate::str::is_match(r"queues:\s+true").unwrap());
}

#[test]
fn test_no_queues_beats_env_and_file() {
    let file = create_temp_config("report:\n  queues: true\n");

    cmd()
        .arg("-c")
        .arg(file.path())
        .env("RMQW_QUEUES", "true")
        .args(["--no-queues", "--validate"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"queues:\s+false").unwrap());
}

#[test]
fn test_flat_json_config_file() {
    let config = r#"{
  "prefix": "p1",
  "interval": 30,
  "host": "graphite.prod",
  "port": 2013,
  "rmqhost": "mq.prod",
  "rmqport": 15673,
  "rmquser": "mon",
  "rmqpass": "x",
  "queues": "true"
}"#;
    let file = create_temp_config(config);

    let output = cmd()
        .arg("-c")
        .arg(file.path())
        .args(["--validate", "--output-format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["interval_secs"], 30);
    assert_eq!(parsed["carbon"]["host"], "graphite.prod");
    assert_eq!(parsed["carbon"]["port"], 2013);
    assert_eq!(parsed["broker"]["host"], "mq.prod");
    assert_eq!(parsed["broker"]["port"], 15673);
    assert_eq!(parsed["broker"]["username"], "mon");
    assert_eq!(parsed["report"]["queues"], true);
}

#[test]
fn test_cli_wins_over_env() {
    cmd()
        .args(["-c", "/nonexistent/path/config.yaml", "-P", "from-cli", "--validate"])
        .env("RMQW_PREFIX", "from-env")
        .assert()
        .success()
        .stdout(predicate::str::contains("from-cli"))
        .stdout(predicate::str::contains("from-env").not());
}

#[test]
fn test_once_with_unreachable_endpoints_exits_cleanly() {
    // Port 9 (discard) is closed on test hosts; every step fails and is
    // skipped, and the process still exits 0
    cmd()
        .args([
            "-c",
            "/nonexistent/path/config.yaml",
            "-r",
            "127.0.0.1",
            "-b",
            "9",
            "-p",
            "9",
            "-q",
            "--once",
        ])
        .timeout(Duration::from_secs(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Round complete"));
}
