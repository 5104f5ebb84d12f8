use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_command() {
    Command::new(env!("CARGO_BIN_EXE_nsforge"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Linux namespace orchestration tool"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("unshare"))
        .stdout(predicate::str::contains("setns"))
        .stdout(predicate::str::contains("info"));
}

#[test]
fn test_version_command() {
    Command::new(env!("CARGO_BIN_EXE_nsforge"))
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nsforge"));
}

#[test]
fn test_invalid_command() {
    Command::new(env!("CARGO_BIN_EXE_nsforge"))
        .arg("invalid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_unshare_rejects_unknown_flag_characters() {
    Command::new(env!("CARGO_BIN_EXE_nsforge"))
        .args(["unshare", "--namespaces", "xyz"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported namespace flag character"));
}

#[test]
fn test_unshare_rejects_unknown_persist_kind() {
    Command::new(env!("CARGO_BIN_EXE_nsforge"))
        .args(["unshare", "--namespaces", "u", "--persist", "bogus=/tmp/x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown namespace kind"));
}

#[test]
fn test_unshare_rejects_malformed_offsets() {
    Command::new(env!("CARGO_BIN_EXE_nsforge"))
        .args(["unshare", "--namespaces", "T", "--monotonic", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --monotonic offset"));
}

#[test]
fn test_unshare_with_empty_selection_succeeds() {
    Command::new(env!("CARGO_BIN_EXE_nsforge"))
        .args(["unshare", "--namespaces", ""])
        .assert()
        .success();
}

#[test]
fn test_setns_requires_a_target() {
    Command::new(env!("CARGO_BIN_EXE_nsforge"))
        .args(["setns", "--namespaces", "u"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("neither a pid nor"));
}

#[test]
fn test_info_lists_namespace_files() {
    Command::new(env!("CARGO_BIN_EXE_nsforge"))
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("mnt"))
        .stdout(predicate::str::contains("uts"))
        .stdout(predicate::str::contains("pid_for_children"));
}

#[test]
fn test_info_json_output() {
    Command::new(env!("CARGO_BIN_EXE_nsforge"))
        .args(["info", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"mnt\""))
        .stdout(predicate::str::contains("\"ino\""));
}

#[test]
fn test_info_for_another_pid() {
    Command::new(env!("CARGO_BIN_EXE_nsforge"))
        .args(["info", "--pid", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Namespace files for PID 1"));
}
