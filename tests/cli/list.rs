//! Tests for `addy list`.

use crate::support::*;

#[test]
fn test_list_empty_repository() {
    let t = Test::new();

    let output = t.list();
    assert_success(&output);
    assert_stdout_contains(&output, "no users in repository");
    assert_stderr_contains(&output, "addy sync");
}

#[test]
fn test_list_shows_repository_users() {
    let t = Test::with_users(&[
        (ABSENT_USER, key_file().as_str()),
        (OTHER_ABSENT_USER, ED25519_KEY),
    ]);

    let output = t.list();
    assert_success(&output);
    assert_stdout_contains(&output, "2 users");
    assert_stdout_contains(&output, ABSENT_USER);
    assert_stdout_contains(&output, OTHER_ABSENT_USER);
    assert_stdout_contains(&output, "not installed");
}

#[test]
fn test_list_ignores_other_files() {
    let t = Test::with_users(&[(ABSENT_USER, ED25519_KEY)]);
    std::fs::write(t.repo_dir().join("users/README.md"), "keys go here\n").unwrap();
    std::fs::create_dir_all(t.repo_dir().join("users/archive.pub")).unwrap();

    let json = t.list_json();
    assert_eq!(json["count"], 1);
    assert_eq!(json["users"][0]["name"], ABSENT_USER);
}

#[test]
fn test_list_skips_invalid_usernames() {
    let t = Test::with_users(&[(ABSENT_USER, ED25519_KEY), ("-rf", ED25519_KEY)]);

    let json = t.list_json();
    assert_eq!(json["count"], 1);
}

#[test]
fn test_list_json() {
    let t = Test::with_users(&[(ABSENT_USER, key_file().as_str())]);

    let json = t.list_json();
    assert_eq!(json["count"], 1);
    let user = &json["users"][0];
    assert_eq!(user["name"], ABSENT_USER);
    assert_eq!(user["account"], false);
    assert_eq!(user["sudo"], false);
    assert!(user["keys"].is_null());
    assert!(json["orphaned_sudo"].is_array());
}
