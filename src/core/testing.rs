//! Test doubles and fixtures shared by unit tests.
//!
//! Account files are chowned for real, so fake accounts reuse the name, uid
//! and gid of the user running the tests. Homes live under a temp dir.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use nix::unistd::{getegid, geteuid, Group, User};
use tempfile::TempDir;

use crate::core::account::{Identity, UserDb};
use crate::core::sudo::{PolicyChecker, SudoSettings, Verdict};
use crate::error::{AccountError, SudoError};

pub const ED25519_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIOZlQvkR/NuAcValUMYNkVFxn2VW/hrOiZvGDG0gBsPq alice@laptop";

pub const ECDSA_KEY: &str = "ecdsa-sha2-nistp256 AAAAE2VjZHNhLXNoYTItbmlzdHAyNTYAAAAIbmlzdHAyNTYAAABBBHqrAwtiOX8vtJaHn1FtdP6VQ58V1wofBZMPaAnGJmWaDA+mAQKF0z7MxArZRHzrlbO/5YegokyvE4AVOefVIIc= bob@work";

pub const RSA_KEY: &str = "ssh-rsa AAAAB3NzaC1yc2EAAAADAQABAAABAQDv1JLL8br+x1g0rQQp+dOIid3+fAiiz5SQtnSE0onC+LM0GqYk4T9y2Um+IaakiQJu8fEdn+ZuXryk8YlnGWh7vfYCYue5qeBF9fbtdy4IYRdN+dBxSWH97EmZyD4gX12Oo1Kfai/W/TAg74L/2iYvzEDUjvR/ksdVrPElqiE7nzNdrcR1liMOCanASXrGMsFSeUmY4PgIzRwFmCFMAIVlh9u2YVICghDfC01/95KBYDvJz2PttQnEGCzU4K0cADUXjS4vDWWDVed13XRnQixiDRXoUfRK9h2ehJbWJYKtRhk4P+EtMB3AnRx0PKkPKkSGPJQ+klnRgIgzz5O5wfOr carol";

/// Name and primary group of the user running the tests.
pub fn current_owner() -> (String, String) {
    let user = User::from_uid(geteuid()).unwrap().unwrap();
    let group = Group::from_gid(getegid()).unwrap().unwrap();
    (user.name, group.name)
}

/// Username for fake accounts.
pub fn test_user() -> String {
    current_owner().0
}

/// Sudo settings rooted in `root`, owned by the current user.
pub fn sudo_settings(root: &Path) -> SudoSettings {
    let dir = root.join("sudoers.d");
    let staging = root.join("staging");
    fs::create_dir_all(&dir).unwrap();
    fs::create_dir_all(&staging).unwrap();
    let (owner, group) = current_owner();
    SudoSettings {
        dir,
        staging,
        owner,
        group,
    }
}

/// In-memory account database with real home directories.
pub struct FakeUserDb {
    homes: TempDir,
    accounts: RefCell<BTreeMap<String, Identity>>,
    adds: Cell<usize>,
    add_failure: RefCell<Option<String>>,
    remove_failure: RefCell<Option<String>>,
}

impl FakeUserDb {
    pub fn new() -> Self {
        Self {
            homes: TempDir::new().unwrap(),
            accounts: RefCell::new(BTreeMap::new()),
            adds: Cell::new(0),
            add_failure: RefCell::new(None),
            remove_failure: RefCell::new(None),
        }
    }

    /// Successful `add` calls so far.
    pub fn adds(&self) -> usize {
        self.adds.get()
    }

    pub fn home_of(&self, username: &str) -> PathBuf {
        self.homes.path().join(username)
    }

    /// Make every later `add` fail with `reason`.
    pub fn fail_add(&self, reason: &str) {
        *self.add_failure.borrow_mut() = Some(reason.to_string());
    }

    /// Make every later `remove` fail with `reason`.
    pub fn fail_remove(&self, reason: &str) {
        *self.remove_failure.borrow_mut() = Some(reason.to_string());
    }

    /// Seed an existing account with the given login shell.
    pub fn insert_with_shell(&self, username: &str, shell: &str) {
        let mut identity = self.identity(username);
        identity.shell = Some(PathBuf::from(shell));
        fs::create_dir_all(self.home_of(username)).unwrap();
        self.accounts
            .borrow_mut()
            .insert(username.to_string(), identity);
    }

    fn identity(&self, username: &str) -> Identity {
        let (_, group) = current_owner();
        Identity {
            username: username.to_string(),
            uid: geteuid().as_raw(),
            gid: getegid().as_raw(),
            group,
            home: Some(self.home_of(username)),
            shell: Some(PathBuf::from("/bin/bash")),
        }
    }
}

impl UserDb for FakeUserDb {
    fn lookup(&self, username: &str) -> Result<Option<Identity>, AccountError> {
        Ok(self.accounts.borrow().get(username).cloned())
    }

    fn add(&self, username: &str) -> Result<(), AccountError> {
        if let Some(reason) = self.add_failure.borrow().clone() {
            return Err(AccountError::CreationFailed {
                username: username.to_string(),
                reason,
            });
        }
        fs::create_dir_all(self.home_of(username)).unwrap();
        self.accounts
            .borrow_mut()
            .insert(username.to_string(), self.identity(username));
        self.adds.set(self.adds.get() + 1);
        Ok(())
    }

    fn remove(&self, username: &str, remove_home: bool) -> Result<(), AccountError> {
        if let Some(reason) = self.remove_failure.borrow().clone() {
            return Err(AccountError::DeletionFailed {
                username: username.to_string(),
                reason,
            });
        }
        self.accounts.borrow_mut().remove(username);
        if remove_home {
            let _ = fs::remove_dir_all(self.home_of(username));
        }
        Ok(())
    }
}

/// Accepts everything and counts calls.
#[derive(Default)]
pub struct CountingChecker {
    calls: Cell<usize>,
}

impl CountingChecker {
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl PolicyChecker for CountingChecker {
    fn check(&self, path: &Path) -> Result<Verdict, SudoError> {
        assert!(path.is_file(), "checker called on missing file");
        self.calls.set(self.calls.get() + 1);
        Ok(Verdict::Valid)
    }
}

/// Rejects everything with a fixed diagnostic.
pub struct RejectingChecker {
    output: String,
    calls: Cell<usize>,
}

impl RejectingChecker {
    pub fn new(output: &str) -> Self {
        Self {
            output: output.to_string(),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl PolicyChecker for RejectingChecker {
    fn check(&self, _path: &Path) -> Result<Verdict, SudoError> {
        self.calls.set(self.calls.get() + 1);
        Ok(Verdict::Invalid(self.output.clone()))
    }
}

/// Fails as if `visudo` were not installed.
pub struct MissingChecker;

impl PolicyChecker for MissingChecker {
    fn check(&self, _path: &Path) -> Result<Verdict, SudoError> {
        Err(SudoError::CheckerUnavailable("visudo not found in PATH".to_string()))
    }
}
