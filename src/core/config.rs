//! Configuration file management.
//!
//! Handles reading, writing, and validating `config.toml` under the config
//! directory (`/etc/addy`, or `$ADDY_CONFIG_DIR`).

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants::{self, DEFAULT_BRANCH};
use crate::error::{ConfigError, Result};

/// Settings for the repository sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Repository URL holding `users/<name>.pub`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_repo: Option<String>,
    /// Branch to track. Defaults to `main`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    /// Private key used for git over SSH.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<PathBuf>,
}

/// A settable configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    GitRepo,
    GitBranch,
    SshKeyPath,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 3] = [ConfigKey::GitRepo, ConfigKey::GitBranch, ConfigKey::SshKeyPath];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::GitRepo => "git-repo",
            ConfigKey::GitBranch => "git-branch",
            ConfigKey::SshKeyPath => "ssh-key-path",
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Config {
    /// Configuration directory, honoring `$ADDY_CONFIG_DIR`.
    pub fn dir() -> PathBuf {
        std::env::var_os(constants::env::CONFIG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(constants::CONFIG_DIR))
    }

    /// Path to the configuration file.
    pub fn config_path() -> PathBuf {
        Self::dir().join(constants::CONFIG_FILE)
    }

    /// Load from the default location. A missing file is an empty config.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`. A missing file is an empty config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` or `ConfigError::Parse`.
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::ReadFile(e).into()),
        };
        let config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save to `path`. The parent directory is 0700 and the file 0600.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "saving config");

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(ConfigError::WriteFile)?;
            fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
                .map_err(ConfigError::WriteFile)?;
        }

        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, contents).map_err(ConfigError::WriteFile)?;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(ConfigError::WriteFile)?;
        Ok(())
    }

    /// Current value of `key`, if set.
    pub fn get(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::GitRepo => self.git_repo.clone(),
            ConfigKey::GitBranch => self.git_branch.clone(),
            ConfigKey::SshKeyPath => self
                .ssh_key_path
                .as_ref()
                .map(|p| p.display().to_string()),
        }
    }

    /// Set `key`. Empty values are rejected.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: key.as_str(),
                reason: "value must not be empty".to_string(),
            }
            .into());
        }

        match key {
            ConfigKey::GitRepo => self.git_repo = Some(value.to_string()),
            ConfigKey::GitBranch => self.git_branch = Some(value.to_string()),
            ConfigKey::SshKeyPath => self.ssh_key_path = Some(PathBuf::from(value)),
        }
        Ok(())
    }

    /// Clear `key`. Returns whether it was set.
    pub fn unset(&mut self, key: ConfigKey) -> bool {
        match key {
            ConfigKey::GitRepo => self.git_repo.take().is_some(),
            ConfigKey::GitBranch => self.git_branch.take().is_some(),
            ConfigKey::SshKeyPath => self.ssh_key_path.take().is_some(),
        }
    }

    /// All set keys with their values, in key order.
    pub fn list(&self) -> Vec<(ConfigKey, String)> {
        ConfigKey::ALL
            .into_iter()
            .filter_map(|key| self.get(key).map(|value| (key, value)))
            .collect()
    }

    /// Branch to track.
    pub fn branch(&self) -> &str {
        self.git_branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    /// Repository URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingValue` if `git-repo` is not set.
    pub fn repo_url(&self) -> Result<&str> {
        self.git_repo
            .as_deref()
            .ok_or_else(|| ConfigError::MissingValue("git-repo").into())
    }

    /// Validate the configuration for a sync.
    ///
    /// Checks:
    /// - `git-repo` is set
    /// - `git-branch`, if set, is a plausible ref name
    /// - `ssh-key-path`, if set, exists
    pub fn validate(&self) -> Result<()> {
        debug!("validating config");

        self.repo_url()?;

        if let Some(branch) = &self.git_branch {
            if branch.starts_with('-') || branch.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidValue {
                    field: "git-branch",
                    reason: format!("not a valid branch name: {}", branch),
                }
                .into());
            }
        }

        if let Some(key) = &self.ssh_key_path {
            if !key.is_file() {
                return Err(ConfigError::InvalidValue {
                    field: "ssh-key-path",
                    reason: format!("file does not exist: {}", key.display()),
                }
                .into());
            }
        }

        Ok(())
    }
}
