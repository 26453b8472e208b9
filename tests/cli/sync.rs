//! Tests for `addy sync` against a local upstream repository.

use crate::support::*;

#[test]
fn test_sync_requires_repo() {
    let t = Test::new();

    let output = t.sync();
    assert_failure(&output);
    assert_stderr_contains(&output, "git-repo is not configured");
    assert!(!t.repo_dir().exists());
}

#[test]
fn test_sync_clones_then_updates() {
    if !has_git() {
        return;
    }
    let t = Test::new();
    let origin = upstream(&t.dir.path().join("upstream"), &[(ABSENT_USER, key_file().as_str())]);
    assert_success(&t.config_set("git-repo", origin.to_str().unwrap()));

    let output = t.sync();
    assert_success(&output);
    assert_stdout_contains(&output, "repository cloned (main @");
    assert_eq!(t.list_json()["count"], 1);

    commit_users(&origin, &[(OTHER_ABSENT_USER, ED25519_KEY)]);

    let output = t.sync();
    assert_success(&output);
    assert_stdout_contains(&output, "repository updated");
    assert_eq!(t.list_json()["count"], 2);
}

#[test]
fn test_sync_unknown_branch_fails() {
    if !has_git() {
        return;
    }
    let t = Test::new();
    let origin = upstream(&t.dir.path().join("upstream"), &[(ABSENT_USER, ED25519_KEY)]);
    assert_success(&t.config_set("git-repo", origin.to_str().unwrap()));
    assert_success(&t.config_set("git-branch", "release"));

    let output = t.sync();
    assert_failure(&output);
    assert_stderr_contains(&output, "git clone");
}

#[test]
fn test_sync_missing_ssh_key_fails() {
    let t = Test::new();
    assert_success(&t.config_set("git-repo", "git@example.com:acme/access.git"));
    assert_success(&t.config_set("ssh-key-path", "/nonexistent/deploy_key"));

    let output = t.sync();
    assert_failure(&output);
    assert_stderr_contains(&output, "ssh-key-path");
}
