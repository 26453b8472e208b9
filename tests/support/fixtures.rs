//! Test fixtures and constants.

use std::path::{Path, PathBuf};
use std::process::Command;

/// A well-formed ed25519 public key.
pub const ED25519_KEY: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIOZlQvkR/NuAcValUMYNkVFxn2VW/hrOiZvGDG0gBsPq alice@laptop";

/// A well-formed ecdsa public key.
pub const ECDSA_KEY: &str =
    "ecdsa-sha2-nistp256 AAAAE2VjZHNhLXNoYTItbmlzdHAyNTYAAAAIbmlzdHAyNTYAAABBBHqrAwtiOX8vtJaHn1FtdP6VQ58V1wofBZMPaAnGJmWaDA+mAQKF0z7MxArZRHzrlbO/5YegokyvE4AVOefVIIc= bob@work";

/// Usernames that will not exist on a test host.
pub const ABSENT_USER: &str = "addytest-absent";
pub const OTHER_ABSENT_USER: &str = "addytest-other";

/// Two keys with a comment and blank line, as a key file would hold them.
pub fn key_file() -> String {
    format!("# laptop\n{}\n\n{}\n", ED25519_KEY, ECDSA_KEY)
}

/// Package string for a user target.
pub fn user_pkg(name: &str) -> String {
    format!("user/{}", name)
}

/// Whether git is installed. Tests that need it return early otherwise.
pub fn has_git() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=addy", "-c", "user.email=addy@localhost"])
        .args(args)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Create a git repository at `dir` on branch `main` holding `users`.
pub fn upstream(dir: &Path, users: &[(&str, &str)]) -> PathBuf {
    std::fs::create_dir_all(dir.join("users")).expect("failed to create upstream");
    git(dir, &["init", "-q"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    commit_users(dir, users);
    dir.to_path_buf()
}

/// Add or replace `users` in the upstream and commit.
pub fn commit_users(dir: &Path, users: &[(&str, &str)]) {
    for (name, keys) in users {
        std::fs::write(dir.join("users").join(format!("{}.pub", name)), keys)
            .expect("failed to write key file");
    }
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "--allow-empty", "-m", "update users"]);
}
