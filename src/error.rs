//! Error types.
//!
//! Each concern owns a small error enum. [`Error`] wraps them all and is the
//! only type that crosses the CLI boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Sudo(#[from] SudoError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("must be run as root")]
    NotRoot,

    #[error("{failed} of {total} {noun} failed")]
    Incomplete {
        failed: usize,
        total: usize,
        noun: &'static str,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Short kind label used when rendering reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Permission(_) => "permission",
            Error::Account(_) => "account",
            Error::Sudo(_) => "sudo",
            Error::Config(_) => "config",
            Error::Repo(_) => "repo",
            Error::Json(_) => "json",
            Error::Prompt(_) => "prompt",
            Error::NotRoot => "permission",
            Error::Incomplete { .. } => "incomplete",
            Error::Other(_) => "error",
        }
    }

    /// Remediation hint for the operator, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::Validation(ValidationError::InvalidPackage(_)) => {
                Some("use: user/<name> or sudo/<name>")
            }
            Error::Validation(ValidationError::InvalidUsername { .. }) => {
                Some("usernames are 1-32 of [A-Za-z0-9._-], starting with a letter or digit")
            }
            Error::Validation(_) => Some("fix the key in the repository and run again"),
            Error::Permission(_) | Error::NotRoot => Some("run as root (use sudo)"),
            Error::Account(e) => e.hint(),
            Error::Sudo(e) => e.hint(),
            Error::Config(ConfigError::MissingValue("git-repo")) => {
                Some("run: addy config set git-repo <url>")
            }
            Error::Config(ConfigError::MissingValue(_)) => Some("run: addy config set <key> <value>"),
            Error::Config(ConfigError::UnknownKey(_)) => {
                Some("valid keys: git-repo, git-branch, ssh-key-path")
            }
            Error::Repo(RepoError::GitNotFound) => Some("install git"),
            Error::Repo(_) => Some("check git-repo, git-branch and ssh-key-path"),
            _ => None,
        }
    }
}

/// Malformed user input: keys, usernames, package strings.
///
/// Always recoverable. Nothing on disk has changed when one of these is raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("key line is empty")]
    Empty,

    #[error("unsupported key type: {0}")]
    UnsupportedType(String),

    #[error("malformed key payload: {0}")]
    MalformedPayload(String),

    #[error("invalid username '{name}': {reason}")]
    InvalidUsername { name: String, reason: String },

    #[error("invalid package '{0}'")]
    InvalidPackage(String),
}

/// The OS refused an ownership or mode change.
#[derive(Error, Debug)]
pub enum PermissionError {
    #[error("owner not found: {0}")]
    OwnerNotFound(String),

    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("chown {} failed: {}", .path.display(), .source)]
    ChownFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("chmod {} failed: {}", .path.display(), .source)]
    ChmodFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {}: {}", .path.display(), .source)]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to change ownership through symlink {}", .0.display())]
    SymlinkRefused(PathBuf),

    #[error("failed to stat {}: {}", .path.display(), .source)]
    StatFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Account lifecycle and key material failures.
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("account already exists: {0}")]
    AlreadyExists(String),

    #[error("account not found: {0}")]
    NotFound(String),

    #[error("failed to create account {username}: {reason}")]
    CreationFailed { username: String, reason: String },

    #[error("failed to delete account {username}: {reason}")]
    DeletionFailed { username: String, reason: String },

    #[error("invalid key on line {line}: {reason}")]
    InvalidKey {
        line: usize,
        #[source]
        reason: ValidationError,
    },

    #[error("no public key found at {}", .0.display())]
    KeySourceNotFound(PathBuf),

    #[error("key source for {0} contains no keys")]
    EmptyKeySet(String),

    #[error("account {0} has no home directory")]
    NoHome(String),

    #[error("failed to write {}: {}", .path.display(), .source)]
    KeyWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {}", .path.display(), .source)]
    KeyReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove {}: {}", .path.display(), .source)]
    KeyRemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("account lookup for {username} failed: {reason}")]
    Lookup { username: String, reason: String },

    #[error(transparent)]
    Permission(#[from] PermissionError),
}

impl AccountError {
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            AccountError::NotFound(_) => Some("install the user first: addy install user/<name>"),
            AccountError::DeletionFailed { .. } => {
                Some("check for running processes owned by the account")
            }
            AccountError::InvalidKey { .. } | AccountError::EmptyKeySet(_) => {
                Some("fix users/<name>.pub in the repository and run again")
            }
            AccountError::KeySourceNotFound(_) => {
                Some("commit users/<name>.pub to the repository, then run: addy sync")
            }
            AccountError::Permission(_) => Some("run as root (use sudo)"),
            _ => None,
        }
    }
}

/// Sudo policy failures. The live sudoers directory is untouched when these
/// are raised during a grant.
#[derive(Error, Debug)]
pub enum SudoError {
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("failed to create user for sudo grant: {0}")]
    UserCreationFailed(#[source] AccountError),

    #[error("policy for {username} rejected by checker: {output}")]
    InvalidPolicy { username: String, output: String },

    #[error("policy checker unavailable: {0}")]
    CheckerUnavailable(String),

    #[error("username '{0}' cannot name a sudoers fragment (sudo ignores names containing '.')")]
    UnsupportedName(String),

    #[error("failed to write {}: {}", .path.display(), .source)]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {}", .path.display(), .source)]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove {}: {}", .path.display(), .source)]
    RemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Permission(#[from] PermissionError),
}

impl SudoError {
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            SudoError::UserNotFound(_) => Some("install the user first: addy install user/<name>"),
            SudoError::CheckerUnavailable(_) => Some("install sudo (provides visudo)"),
            SudoError::UserCreationFailed(e) | SudoError::Account(e) => e.hint(),
            SudoError::Permission(_) | SudoError::WriteFailed { .. } => {
                Some("run as root (use sudo)")
            }
            _ => None,
        }
    }
}

/// Configuration file failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to write config: {0}")]
    WriteFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("{0} is not configured")]
    MissingValue(&'static str),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Repository sync failures.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("git not found in PATH")]
    GitNotFound,

    #[error("git {command} failed: {stderr}")]
    GitFailed { command: String, stderr: String },

    #[error("failed to prepare {}: {}", .path.display(), .source)]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for addy operations.
pub type Result<T> = std::result::Result<T, Error>;
