//! Where desired key material comes from.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::constants::{PUBKEY_EXT, USERS_DIR};
use crate::core::types::{KeyLine, Username};
use crate::error::AccountError;

/// Supplies raw key lines per username.
pub trait KeySource {
    /// Raw lines of the user's key file, unvalidated.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::KeySourceNotFound` if the user has no key file.
    fn read_keys(&self, username: &str) -> Result<Vec<KeyLine>, AccountError>;

    /// Usernames with a key file, sorted.
    fn users(&self) -> Result<Vec<Username>, AccountError>;
}

/// Reads `users/<name>.pub` from a local repository clone.
#[derive(Debug, Clone)]
pub struct RepoKeySource {
    root: PathBuf,
}

impl RepoKeySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the key file for `username`.
    pub fn key_path(&self, username: &str) -> PathBuf {
        self.root
            .join(USERS_DIR)
            .join(format!("{}.{}", username, PUBKEY_EXT))
    }
}

impl KeySource for RepoKeySource {
    fn read_keys(&self, username: &str) -> Result<Vec<KeyLine>, AccountError> {
        let path = self.key_path(username);
        debug!(path = %path.display(), "reading keys");

        match fs::read_to_string(&path) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AccountError::KeySourceNotFound(path)),
            Err(source) => Err(AccountError::KeyReadFailed { path, source }),
        }
    }

    fn users(&self) -> Result<Vec<Username>, AccountError> {
        let dir = self.root.join(USERS_DIR);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(AccountError::KeyReadFailed { path: dir, source }),
        };

        let mut users: Vec<Username> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().map(|ext| ext == PUBKEY_EXT).unwrap_or(false))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect();
        users.sort();
        Ok(users)
    }
}
