//! Tests for `addy status`.

use crate::support::*;

#[test]
fn test_status_absent_account() {
    let t = Test::with_users(&[(ABSENT_USER, key_file().as_str())]);

    let output = t.status(ABSENT_USER);
    assert_success(&output);
    assert_stdout_contains(&output, "2 key line(s)");
    assert_stdout_contains(&output, "absent");
    assert_stdout_excludes(&output, "sudo");
}

#[test]
fn test_status_without_key_file() {
    let t = Test::new();

    let output = t.status(ABSENT_USER);
    assert_success(&output);
    assert_stdout_contains(&output, "no key file");
}

#[test]
fn test_status_invalid_username() {
    let t = Test::new();

    let output = t.status("Bad/Name");
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid username");
}

#[test]
fn test_status_existing_account() {
    let t = Test::new();

    let output = t.status("root");
    assert_success(&output);
    assert_stdout_contains(&output, "present");
    assert_stdout_contains(&output, "uid/gid");
    assert_stdout_contains(&output, "0/0");
}
