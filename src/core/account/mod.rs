//! Account lifecycle and key material.
//!
//! [`Accounts`] is the capability the sudo manager and the engine hold.
//! [`AccountManager`] implements it on top of a [`UserDb`], the seam to the
//! OS account database (`SystemUserDb` in production, a fake in tests).
//!
//! Per identity the states are `absent → created → keyed → sudo-granted`.
//! Every transition is idempotent; re-entering a state is a no-op.

mod authorized;
mod system;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::keys::ParsedKey;
use crate::core::perms::PermissionState;
use crate::core::types::{KeyLine, Outcome};
use crate::error::AccountError;

pub use authorized::validate_lines;
pub use system::SystemUserDb;

/// A POSIX account as seen in the system database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub uid: u32,
    pub gid: u32,
    /// Primary group name.
    pub group: String,
    pub home: Option<PathBuf>,
    pub shell: Option<PathBuf>,
}

impl Identity {
    /// Whether the login shell blocks interactive logins.
    ///
    /// A disabled account still counts as existing for [`Accounts::create`].
    pub fn login_disabled(&self) -> bool {
        self.shell
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name == "nologin" || name == "false")
            .unwrap_or(false)
    }
}

/// Result of an `authorized_keys` install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInstall {
    pub path: PathBuf,
    pub count: usize,
    pub outcome: Outcome,
}

/// Current key material of an account.
#[derive(Debug, Clone)]
pub struct KeyStatus {
    pub path: PathBuf,
    /// Parsed keys; lines that fail validation are counted in `invalid`.
    pub keys: Vec<ParsedKey>,
    pub invalid: usize,
    pub permissions: Option<PermissionState>,
    pub dir_permissions: Option<PermissionState>,
}

/// The OS account database.
pub trait UserDb {
    /// Look up an account by name.
    fn lookup(&self, username: &str) -> Result<Option<Identity>, AccountError>;

    /// Create an account with a home directory.
    fn add(&self, username: &str) -> Result<(), AccountError>;

    /// Delete an account, optionally with its home directory.
    fn remove(&self, username: &str, remove_home: bool) -> Result<(), AccountError>;
}

/// Account operations used by the sudo manager and the engine.
pub trait Accounts {
    /// Whether the account exists. Lookup failures count as absent.
    fn exists(&self, username: &str) -> bool;

    /// Look up an account.
    fn lookup(&self, username: &str) -> Result<Option<Identity>, AccountError>;

    /// Create an account.
    ///
    /// Idempotent unless `exclusive` is set: an existing account is returned
    /// with `Outcome::Unchanged`.
    ///
    /// # Errors
    ///
    /// - `AccountError::AlreadyExists` if `exclusive` and the account exists
    /// - `AccountError::CreationFailed` if the OS refuses
    fn create(&self, username: &str, exclusive: bool) -> Result<(Identity, Outcome), AccountError>;

    /// Replace the account's `authorized_keys` with the given key lines.
    ///
    /// Blank lines and `#` comments are skipped. Either every key is written
    /// or the file is left exactly as it was.
    ///
    /// # Errors
    ///
    /// - `AccountError::InvalidKey` naming the first invalid line (1-based)
    /// - `AccountError::EmptyKeySet` if no keys remain after skipping
    /// - `AccountError::NotFound` if the account does not exist
    /// - `AccountError::Permission` if ownership or mode cannot be applied
    fn install_key(&self, username: &str, lines: &[KeyLine]) -> Result<KeyInstall, AccountError>;

    /// Delete the account's `authorized_keys`. Absent file or account is a no-op.
    fn remove_key(&self, username: &str) -> Result<Outcome, AccountError>;

    /// Delete the account.
    ///
    /// # Errors
    ///
    /// - `AccountError::NotFound` if the account does not exist
    /// - `AccountError::DeletionFailed` if the OS refuses
    fn delete_account(&self, username: &str, remove_home: bool) -> Result<(), AccountError>;

    /// Inspect the account's key material. `None` if the account is absent.
    fn key_status(&self, username: &str) -> Result<Option<KeyStatus>, AccountError>;
}

/// [`Accounts`] over a [`UserDb`].
#[derive(Debug, Default)]
pub struct AccountManager<D: UserDb> {
    db: D,
}

impl<D: UserDb> AccountManager<D> {
    pub fn new(db: D) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &D {
        &self.db
    }

    fn require(&self, username: &str) -> Result<Identity, AccountError> {
        self.db
            .lookup(username)?
            .ok_or_else(|| AccountError::NotFound(username.to_string()))
    }
}

impl<D: UserDb> Accounts for AccountManager<D> {
    fn exists(&self, username: &str) -> bool {
        match self.db.lookup(username) {
            Ok(found) => found.is_some(),
            Err(e) => {
                warn!(username, error = %e, "account lookup failed");
                false
            }
        }
    }

    fn lookup(&self, username: &str) -> Result<Option<Identity>, AccountError> {
        self.db.lookup(username)
    }

    fn create(&self, username: &str, exclusive: bool) -> Result<(Identity, Outcome), AccountError> {
        if let Some(identity) = self.db.lookup(username)? {
            if exclusive {
                return Err(AccountError::AlreadyExists(username.to_string()));
            }
            if identity.login_disabled() {
                warn!(username, shell = ?identity.shell, "account exists but logins are disabled");
            }
            info!(username, "account already exists");
            return Ok((identity, Outcome::Unchanged));
        }

        info!(username, "creating account");
        self.db.add(username)?;

        let identity = self
            .db
            .lookup(username)?
            .ok_or_else(|| AccountError::CreationFailed {
                username: username.to_string(),
                reason: "account missing after creation".to_string(),
            })?;

        info!(username, uid = identity.uid, "account created");
        Ok((identity, Outcome::Changed))
    }

    fn install_key(&self, username: &str, lines: &[KeyLine]) -> Result<KeyInstall, AccountError> {
        let keys = authorized::validate_lines(username, lines)?;
        let identity = self.require(username)?;
        authorized::install(&identity, &keys)
    }

    fn remove_key(&self, username: &str) -> Result<Outcome, AccountError> {
        match self.db.lookup(username)? {
            Some(identity) => authorized::remove(&identity),
            None => {
                info!(username, "account absent, no keys to remove");
                Ok(Outcome::Unchanged)
            }
        }
    }

    fn delete_account(&self, username: &str, remove_home: bool) -> Result<(), AccountError> {
        self.require(username)?;
        info!(username, remove_home, "deleting account");
        self.db.remove(username, remove_home)?;
        info!(username, "account deleted");
        Ok(())
    }

    fn key_status(&self, username: &str) -> Result<Option<KeyStatus>, AccountError> {
        match self.db.lookup(username)? {
            Some(identity) => authorized::status(&identity).map(Some),
            None => Ok(None),
        }
    }
}
