//! CLI smoke tests for the `rd` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn rd() -> Command {
    Command::cargo_bin("rd").unwrap()
}

#[test]
fn test_version() {
    rd().arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_subcommands() {
    rd().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("stop-all"));
}

#[test]
fn test_list_without_daemon_fails() {
    let temp = TempDir::new().unwrap();
    let socket = temp.path().join("missing.sock");

    rd().args(["list", "--socket"])
        .arg(&socket)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to connect"));
}

#[test]
fn test_create_with_missing_messages_file_fails() {
    let temp = TempDir::new().unwrap();
    let socket = temp.path().join("missing.sock");
    let messages = temp.path().join("nope.txt");

    rd().args(["create", "--target", "room", "--delay", "1", "--token", "tok", "--messages"])
        .arg(&messages)
        .arg("--socket")
        .arg(&socket)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_create_requires_credentials() {
    rd().args(["create", "--target", "room", "--delay", "1", "--messages", "m.txt"])
        .assert()
        .failure();
}

#[test]
fn test_status_rejects_unknown_format() {
    rd().args(["status", "task-1", "--format", "yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown format"));
}
