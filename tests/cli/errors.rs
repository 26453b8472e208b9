//! Tests for error handling and CLI flags.

use crate::support::*;

#[test]
fn test_help_lists_commands() {
    let t = Test::new();

    let output = t.cmd().arg("--help").output().unwrap();
    assert_success(&output);
    let out = stdout(&output);
    for command in ["install", "remove", "sync", "list", "status", "verify", "config"] {
        assert!(out.contains(command), "help missing {}: {}", command, out);
    }
    assert!(out.contains("user/<name>"));
}

#[test]
fn test_no_command_fails() {
    let t = Test::new();

    let output = t.cmd().output().unwrap();
    assert_failure(&output);
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();

    let output = t.cmd().arg("unknown-command").output().unwrap();
    assert_failure(&output);
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    let output = t.cmd().arg("--version").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "addy");
}

#[test]
fn test_install_requires_packages() {
    let t = Test::new();

    let output = t.cmd().arg("install").output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "PACKAGE");
}

#[test]
fn test_keep_home_requires_delete_account() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["remove", "user/addytest-absent", "--keep-home"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "--delete-account");
}

#[test]
fn test_root_required_for_install() {
    if nix::unistd::geteuid().is_root() {
        return;
    }
    let t = Test::new();

    let output = t
        .cmd_as_user()
        .args(["install", "user/addytest-absent"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "must be run as root");
    assert_stderr_contains(&output, "use sudo");
}

#[test]
fn test_root_required_for_config_set() {
    if nix::unistd::geteuid().is_root() {
        return;
    }
    let t = Test::new();

    let output = t
        .cmd_as_user()
        .args(["config", "set", "git-repo", "https://example.com/access.git"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert!(!t.config_dir().join("config.toml").exists());
}

#[test]
fn test_config_get_does_not_require_root() {
    let t = Test::new();

    let output = t
        .cmd_as_user()
        .args(["config", "get", "git-branch"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output).trim(), "main");
}

#[test]
fn test_verbose_flag_accepted() {
    let t = Test::new();

    let output = t.cmd().args(["--verbose", "config", "list"]).output().unwrap();
    assert_success(&output);
}

#[test]
fn test_completions_bash_outputs_script() {
    let t = Test::new();

    let output = t.cmd().args(["completions", "bash"]).output().unwrap();
    assert_success(&output);
    let out = stdout(&output);
    assert!(out.contains("_addy"), "not a bash completion script: {}", out);
}

#[test]
fn test_completions_unknown_shell_fails() {
    let t = Test::new();

    let output = t.cmd().args(["completions", "tcsh"]).output().unwrap();
    assert_failure(&output);
}
