//! Tests for `addy config`.

use std::fs;
use std::os::unix::fs::PermissionsExt;

use crate::support::*;

#[test]
fn test_set_get_roundtrip() {
    let t = Test::new();

    assert_roundtrip(&t, "git-repo", "git@github.com:acme/access.git");
    assert_roundtrip(&t, "git-branch", "production");
    assert_roundtrip(&t, "ssh-key-path", "/root/.ssh/deploy_key");
}

#[test]
fn test_set_writes_private_file() {
    let t = Test::new();

    assert_success(&t.config_set("git-repo", "https://example.com/access.git"));

    let path = t.config_dir().join("config.toml");
    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
    let dir_mode = fs::metadata(t.config_dir()).unwrap().permissions().mode() & 0o777;
    assert_eq!(dir_mode, 0o700);

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("git-repo = \"https://example.com/access.git\""));
}

#[test]
fn test_set_trims_value() {
    let t = Test::new();

    assert_success(&t.config_set("git-branch", "  release  "));
    assert_eq!(stdout(&t.config_get("git-branch")).trim(), "release");
}

#[test]
fn test_set_empty_value_fails() {
    let t = Test::new();

    let output = t.config_set("git-repo", "   ");
    assert_failure(&output);
    assert!(!t.config_dir().join("config.toml").exists());
}

#[test]
fn test_unknown_key_fails() {
    let t = Test::new();

    let output = t.config_set("git-url", "https://example.com/access.git");
    assert_failure(&output);
    assert_stderr_contains(&output, "unknown configuration key: git-url");
    assert_stderr_contains(&output, "git-repo, git-branch, ssh-key-path");

    assert_failure(&t.config_get("nope"));
}

#[test]
fn test_get_unset_repo_fails_with_hint() {
    let t = Test::new();

    let output = t.config_get("git-repo");
    assert_failure(&output);
    assert_stderr_contains(&output, "git-repo is not configured");
    assert_stderr_contains(&output, "addy config set git-repo <url>");
}

#[test]
fn test_branch_defaults_to_main() {
    let t = Test::new();

    let output = t.config_get("git-branch");
    assert_success(&output);
    assert_eq!(stdout(&output).trim(), "main");
}

#[test]
fn test_unset() {
    let t = Test::new();
    assert_success(&t.config_set("git-branch", "release"));

    let output = t.config_unset("git-branch");
    assert_success(&output);
    assert_stdout_contains(&output, "git-branch unset");
    assert_eq!(stdout(&t.config_get("git-branch")).trim(), "main");

    let output = t.config_unset("git-branch");
    assert_success(&output);
    assert_stdout_contains(&output, "was not set");
}

#[test]
fn test_list() {
    let t = Test::new();

    let output = t.config_list();
    assert_success(&output);
    assert_stdout_contains(&output, "no configuration");

    assert_success(&t.config_set("git-repo", "https://example.com/access.git"));
    assert_success(&t.config_set("git-branch", "release"));

    let output = t.config_list();
    assert_success(&output);
    assert_stdout_contains(&output, "git-repo = https://example.com/access.git");
    assert_stdout_contains(&output, "git-branch = release");
    assert_stdout_excludes(&output, "ssh-key-path");
}

#[test]
fn test_corrupt_config_fails() {
    let t = Test::new();
    fs::create_dir_all(t.config_dir()).unwrap();
    fs::write(t.config_dir().join("config.toml"), "git-repo = [unterminated").unwrap();

    let output = t.config_list();
    assert_failure(&output);
    assert_stderr_contains(&output, "failed to parse config");
}
