//! Passwordless sudo grants as `sudoers.d` fragments.
//!
//! A fragment is drafted outside the sudoers directory, checked with the
//! policy checker, and only then renamed into place. The live directory
//! never holds a file the checker has not accepted.

mod checker;

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use tempfile::{Builder, NamedTempFile, PersistError};
use tracing::{debug, info, warn};

use crate::core::account::Accounts;
use crate::core::constants::{SUDOERS_DIR, SUDOERS_MODE, SUDOERS_OWNER};
use crate::core::perms::{self, PermissionState};
use crate::core::types::{Outcome, RemoveOptions, Username};
use crate::error::SudoError;

pub use checker::{PolicyChecker, Verdict, Visudo};

/// Render the fragment granting `username` passwordless sudo.
pub fn render(username: &str) -> String {
    format!("{} ALL=(ALL) NOPASSWD:ALL\n", username)
}

/// Where fragments live and who owns them.
#[derive(Debug, Clone)]
pub struct SudoSettings {
    /// Live fragment directory, read by sudo's `#includedir`.
    pub dir: PathBuf,
    /// Draft directory. Must not be `dir`.
    pub staging: PathBuf,
    pub owner: String,
    pub group: String,
}

impl Default for SudoSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(SUDOERS_DIR),
            staging: std::env::temp_dir(),
            owner: SUDOERS_OWNER.to_string(),
            group: SUDOERS_OWNER.to_string(),
        }
    }
}

/// Result of [`SudoManager::grant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    /// `Changed` if the account was created for this grant.
    pub account: Outcome,
    pub fragment: Outcome,
}

/// Result of [`SudoManager::revoke`]. `None` marks a step that was not requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revoke {
    pub fragment: Outcome,
    pub keys: Option<Outcome>,
    pub account: Option<Outcome>,
}

/// Check result for one managed fragment.
#[derive(Debug, Clone)]
pub struct FragmentCheck {
    pub username: Username,
    pub path: PathBuf,
    pub verdict: Verdict,
    pub permissions: Option<PermissionState>,
    pub permissions_ok: bool,
}

impl FragmentCheck {
    pub fn is_ok(&self) -> bool {
        self.verdict.is_valid() && self.permissions_ok
    }
}

/// Result of [`SudoManager::verify`].
#[derive(Debug, Clone, Default)]
pub struct Verification {
    pub fragments: Vec<FragmentCheck>,
}

impl Verification {
    pub fn is_ok(&self) -> bool {
        self.fragments.iter().all(FragmentCheck::is_ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &FragmentCheck> {
        self.fragments.iter().filter(|f| !f.is_ok())
    }
}

/// Grants and revokes sudo, composing an [`Accounts`] capability.
pub struct SudoManager<'a, A: Accounts, C: PolicyChecker> {
    accounts: &'a A,
    checker: &'a C,
    settings: SudoSettings,
}

impl<'a, A: Accounts, C: PolicyChecker> SudoManager<'a, A, C> {
    pub fn new(accounts: &'a A, checker: &'a C, settings: SudoSettings) -> Self {
        Self {
            accounts,
            checker,
            settings,
        }
    }

    pub fn settings(&self) -> &SudoSettings {
        &self.settings
    }

    /// Path of the fragment for `username`.
    pub fn fragment_path(&self, username: &str) -> PathBuf {
        self.settings.dir.join(username)
    }

    /// Grant `username` passwordless sudo.
    ///
    /// # Errors
    ///
    /// - `SudoError::UnsupportedName` if the name contains `.`
    /// - `SudoError::UserNotFound` if the account is missing and `create_user` is unset
    /// - `SudoError::UserCreationFailed` if creating the account fails
    /// - `SudoError::InvalidPolicy` if the checker rejects the draft
    /// - `SudoError::CheckerUnavailable` if the checker cannot run
    pub fn grant(&self, username: &str, create_user: bool) -> Result<Grant, SudoError> {
        // sudo's #includedir skips names containing '.'; a grant would be silently inert.
        if username.contains('.') {
            return Err(SudoError::UnsupportedName(username.to_string()));
        }

        let account = if self.accounts.exists(username) {
            Outcome::Unchanged
        } else if create_user {
            let (_, outcome) = self
                .accounts
                .create(username, false)
                .map_err(SudoError::UserCreationFailed)?;
            outcome
        } else {
            return Err(SudoError::UserNotFound(username.to_string()));
        };

        let content = render(username);
        let path = self.fragment_path(username);

        if self.is_current(&path, &content)? {
            perms::ensure(&path, &self.settings.owner, &self.settings.group, SUDOERS_MODE)?;
            info!(username, "sudo already granted");
            return Ok(Grant {
                account,
                fragment: Outcome::Unchanged,
            });
        }

        let draft = self.draft(&content)?;
        match self.checker.check(draft.path())? {
            Verdict::Valid => {}
            Verdict::Invalid(output) => {
                warn!(username, %output, "sudoers draft rejected");
                // Dropping the draft deletes it.
                return Err(SudoError::InvalidPolicy {
                    username: username.to_string(),
                    output,
                });
            }
        }

        self.publish(draft, &path, &content)?;
        perms::ensure(&path, &self.settings.owner, &self.settings.group, SUDOERS_MODE)?;
        info!(username, path = %path.display(), "sudo granted");

        Ok(Grant {
            account,
            fragment: Outcome::Changed,
        })
    }

    /// Revoke sudo from `username`.
    ///
    /// The fragment goes first, then keys, then the account, so a failure
    /// part way never leaves sudo active on an account being torn down.
    pub fn revoke(&self, username: &str, options: RemoveOptions) -> Result<Revoke, SudoError> {
        let path = self.fragment_path(username);
        let fragment = match fs::remove_file(&path) {
            Ok(()) => {
                info!(username, path = %path.display(), "sudo revoked");
                Outcome::Changed
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(username, "no sudo fragment to remove");
                Outcome::Unchanged
            }
            Err(source) => return Err(SudoError::RemoveFailed { path, source }),
        };

        let keys = if options.remove_user || options.delete_account {
            Some(self.accounts.remove_key(username)?)
        } else {
            None
        };

        let account = if options.delete_account {
            if self.accounts.exists(username) {
                self.accounts.delete_account(username, !options.keep_home)?;
                Some(Outcome::Changed)
            } else {
                Some(Outcome::Unchanged)
            }
        } else {
            None
        };

        Ok(Revoke {
            fragment,
            keys,
            account,
        })
    }

    /// Whether `username` holds a fragment with exactly the managed rule.
    pub fn is_granted(&self, username: &str) -> bool {
        let path = self.fragment_path(username);
        is_regular_file(&path)
            && fs::read_to_string(&path)
                .map(|content| content == render(username))
                .unwrap_or(false)
    }

    /// Usernames whose fragment holds exactly the managed rule, sorted.
    ///
    /// Hand-written fragments and dotted temp files are ignored.
    pub fn managed_fragments(&self) -> Result<Vec<Username>, SudoError> {
        let entries = match fs::read_dir(&self.settings.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(SudoError::ReadFailed {
                    path: self.settings.dir.clone(),
                    source,
                })
            }
        };

        let mut users: Vec<Username> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .filter(|name| self.is_granted(name))
            .collect();
        users.sort();
        Ok(users)
    }

    /// Re-check syntax and permissions of every managed fragment.
    pub fn verify(&self) -> Result<Verification, SudoError> {
        let (uid, gid) = perms::resolve(&self.settings.owner, &self.settings.group)?;

        let mut fragments = Vec::new();
        for username in self.managed_fragments()? {
            let path = self.fragment_path(&username);
            let verdict = self.checker.check(&path)?;
            let permissions = perms::inspect(&path)?;
            let permissions_ok = permissions
                .map(|state| state.matches(uid.as_raw(), gid.as_raw(), SUDOERS_MODE))
                .unwrap_or(false);

            if !verdict.is_valid() || !permissions_ok {
                warn!(username = %username, ?verdict, ?permissions, "fragment failed verification");
            }

            fragments.push(FragmentCheck {
                username,
                path,
                verdict,
                permissions,
                permissions_ok,
            });
        }
        Ok(Verification { fragments })
    }

    /// An existing fragment counts as current only if it matches and still passes the checker.
    fn is_current(&self, path: &Path, content: &str) -> Result<bool, SudoError> {
        if !is_regular_file(path) {
            return Ok(false);
        }
        match fs::read_to_string(path) {
            Ok(existing) if existing == content => Ok(self.checker.check(path)?.is_valid()),
            _ => Ok(false),
        }
    }

    fn draft(&self, content: &str) -> Result<NamedTempFile, SudoError> {
        let staging = &self.settings.staging;
        let write_err = |source| SudoError::WriteFailed {
            path: staging.to_path_buf(),
            source,
        };

        fs::create_dir_all(staging).map_err(write_err)?;
        let draft = self.write_temp(staging, "addy-", content)?;
        debug!(path = %draft.path().display(), "sudoers draft written");
        Ok(draft)
    }

    /// Move the checked draft to `path`.
    ///
    /// A staging dir on another filesystem cannot be renamed across; the
    /// content is then published through [`Self::publish_via_sibling`].
    fn publish(&self, draft: NamedTempFile, path: &Path, content: &str) -> Result<(), SudoError> {
        let error = match draft.persist(path) {
            Ok(_) => return Ok(()),
            Err(PersistError { error, .. }) => error,
        };

        if error.raw_os_error() != Some(Errno::EXDEV as i32) {
            return Err(SudoError::WriteFailed {
                path: path.to_path_buf(),
                source: error,
            });
        }

        debug!("staging dir is on another filesystem, publishing via sibling temp file");
        self.publish_via_sibling(path, content)
    }

    /// Write `content` to a dotted temp file next to `path` and rename it
    /// into place. `#includedir` ignores the dotted name in the meantime.
    fn publish_via_sibling(&self, path: &Path, content: &str) -> Result<(), SudoError> {
        let sibling = self.write_temp(&self.settings.dir, ".addy-", content)?;
        sibling
            .persist(path)
            .map_err(|e| SudoError::WriteFailed {
                path: path.to_path_buf(),
                source: e.error,
            })?;
        Ok(())
    }

    fn write_temp(&self, dir: &Path, prefix: &str, content: &str) -> Result<NamedTempFile, SudoError> {
        let write_err = |source| SudoError::WriteFailed {
            path: dir.to_path_buf(),
            source,
        };

        let mut file = Builder::new()
            .prefix(prefix)
            .tempfile_in(dir)
            .map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;
        file.as_file().sync_all().map_err(write_err)?;
        let (uid, gid) = perms::resolve(&self.settings.owner, &self.settings.group)?;
        perms::ensure_handle(file.as_file(), file.path(), uid, gid, SUDOERS_MODE)?;
        Ok(file)
    }
}

fn is_regular_file(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_file())
        .unwrap_or(false)
}
