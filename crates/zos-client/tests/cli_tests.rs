//! Integration tests for the zos-client CLI.
//!
//! These run the built binary with a scrubbed environment, so they
//! exercise argument parsing and connection resolution without a
//! server.

use std::process::Command;

/// Get the path to the built binary.
fn get_bin_path() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps
    path.push("zos-client");
    path
}

/// Run the CLI with given arguments and return (stdout, stderr, success).
fn run_cli(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(get_bin_path())
        .args(args)
        .env_clear()
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_help_lists_command_groups() {
    let (stdout, _, success) = run_cli(&["--help"]);
    assert!(success);
    assert!(stdout.contains("zos-files"));
    assert!(stdout.contains("zos-jobs"));
    assert!(stdout.contains("zos-console"));
    assert!(stdout.contains("zos-tso"));
    assert!(stdout.contains("zosmf"));
    assert!(stdout.contains("auth"));
    assert!(stdout.contains("completions"));
}

#[test]
fn test_version_command() {
    let (stdout, _, success) = run_cli(&["--version"]);
    assert!(success);
    assert!(stdout.contains("zos-client"));
}

#[test]
fn test_files_help_lists_verbs() {
    let (stdout, _, success) = run_cli(&["zos-files", "--help"]);
    assert!(success);
    for verb in ["create", "upload", "download", "list", "delete", "invoke"] {
        assert!(stdout.contains(verb), "missing {verb}: {stdout}");
    }
}

#[test]
fn test_jobs_help_lists_verbs() {
    let (stdout, _, success) = run_cli(&["zos-jobs", "--help"]);
    assert!(success);
    for verb in ["submit", "list", "view", "download", "cancel", "delete", "modify", "search"] {
        assert!(stdout.contains(verb), "missing {verb}: {stdout}");
    }
}

#[test]
fn test_completions_bash() {
    let (stdout, _, success) = run_cli(&["completions", "bash"]);
    assert!(success);
    assert!(stdout.contains("zos-client"));
}

#[test]
fn test_missing_host_is_reported() {
    let (_, stderr, success) = run_cli(&["zosmf", "check", "status"]);
    assert!(!success);
    assert!(stderr.contains("host"), "stderr: {stderr}");
}

#[test]
fn test_unknown_subcommand_fails() {
    let (_, stderr, success) = run_cli(&["zos-files", "teleport"]);
    assert!(!success);
    assert!(stderr.contains("teleport"), "stderr: {stderr}");
}
