//! Local clone of the access repository, driven through the `git` CLI.

use std::ffi::OsStr;
use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::core::config::Config;
use crate::core::constants;
use crate::error::{RepoError, Result};

/// What a sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Cloned,
    Updated,
}

/// The local clone.
#[derive(Debug, Clone)]
pub struct Repository {
    dir: PathBuf,
}

impl Repository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Clone location, honoring `$ADDY_REPO_DIR`.
    pub fn default_dir() -> PathBuf {
        std::env::var_os(constants::env::REPO_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(constants::REPO_DIR))
    }

    pub fn open_default() -> Self {
        Self::new(Self::default_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether a clone exists.
    pub fn is_cloned(&self) -> bool {
        self.dir.join(".git").exists()
    }

    /// Bring the clone to `origin/<branch>`, cloning first if needed.
    ///
    /// Local changes in the clone are discarded.
    ///
    /// # Errors
    ///
    /// - `ConfigError` if the configuration is incomplete
    /// - `RepoError::GitNotFound` if `git` is not installed
    /// - `RepoError::GitFailed` with git's stderr on any failing command
    pub fn sync(&self, config: &Config) -> Result<SyncOutcome> {
        config.validate()?;
        let url = config.repo_url()?;
        let branch = config.branch();
        let git = Git::locate(config)?;

        info!(url, branch, dir = %self.dir.display(), "syncing repository");

        if self.is_cloned() {
            let dir = self.dir.to_string_lossy();
            let dir = &*dir;
            git.run(["-C", dir, "remote", "set-url", "origin", url])?;
            git.run(["-C", dir, "fetch", "--prune", "origin", branch])?;
            let remote_ref = format!("origin/{}", branch);
            git.run(["-C", dir, "checkout", "-B", branch, remote_ref.as_str()])?;
            git.run(["-C", dir, "reset", "--hard", remote_ref.as_str()])?;
            info!("repository updated");
            return Ok(SyncOutcome::Updated);
        }

        self.prepare()?;
        let dir = self.dir.to_string_lossy();
        git.run(["clone", "--branch", branch, "--", url, &*dir])?;
        info!("repository cloned");
        Ok(SyncOutcome::Cloned)
    }

    /// Current commit of the clone, if any.
    pub fn head(&self) -> Option<String> {
        if !self.is_cloned() {
            return None;
        }
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.dir)
            .args(["rev-parse", "--short", "HEAD"])
            .output()
            .ok()?;
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn prepare(&self) -> Result<()> {
        let prepare_err = |source| RepoError::Prepare {
            path: self.dir.clone(),
            source,
        };

        // Only directories created here get 0700; existing ancestors keep their mode.
        if let Some(parent) = self.dir.parent() {
            fs::DirBuilder::new()
                .recursive(true)
                .mode(0o700)
                .create(parent)
                .map_err(prepare_err)?;
        }

        // git refuses to clone into a non-empty directory; a leftover empty one is fine.
        if self.dir.exists() {
            let empty = fs::read_dir(&self.dir)
                .map_err(prepare_err)?
                .next()
                .is_none();
            if !empty {
                return Err(prepare_err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "directory exists and is not a git clone",
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// `GIT_SSH_COMMAND` for a deploy key. git runs it through `sh -c`.
fn ssh_command(key: &Path) -> String {
    format!(
        "ssh -i {} -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new",
        shell_quote(&key.to_string_lossy())
    )
}

/// Single-quote `s` for a POSIX shell.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

struct Git {
    program: PathBuf,
    ssh_command: Option<String>,
}

impl Git {
    fn locate(config: &Config) -> Result<Self> {
        let program = which::which("git").map_err(|_| RepoError::GitNotFound)?;
        let ssh_command = config.ssh_key_path.as_deref().map(ssh_command);
        Ok(Self {
            program,
            ssh_command,
        })
    }

    fn run<I, S>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let shown = args
            .iter()
            .map(|a| a.as_ref().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        debug!(command = %shown, "git");

        let mut cmd = Command::new(&self.program);
        cmd.args(&args).env("GIT_TERMINAL_PROMPT", "0");
        if let Some(ssh) = &self.ssh_command {
            cmd.env("GIT_SSH_COMMAND", ssh);
        }

        let output = cmd.output().map_err(|e| RepoError::GitFailed {
            command: shown.clone(),
            stderr: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(RepoError::GitFailed {
                command: shown,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(())
    }
}
