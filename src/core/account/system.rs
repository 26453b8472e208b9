//! The host account database: passwd/group lookups plus `useradd`/`userdel`.

use std::path::PathBuf;
use std::process::Command;

use nix::unistd::{Group, User};
use tracing::debug;

use super::{Identity, UserDb};
use crate::core::constants::DEFAULT_SHELL;
use crate::error::AccountError;

/// [`UserDb`] backed by the running host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemUserDb;

impl SystemUserDb {
    pub fn new() -> Self {
        Self
    }
}

impl UserDb for SystemUserDb {
    fn lookup(&self, username: &str) -> Result<Option<Identity>, AccountError> {
        let user = User::from_name(username).map_err(|errno| AccountError::Lookup {
            username: username.to_string(),
            reason: errno.to_string(),
        })?;
        let Some(user) = user else {
            return Ok(None);
        };

        // Accounts whose primary group has no entry keep the numeric gid as name.
        let group = Group::from_gid(user.gid)
            .ok()
            .flatten()
            .map(|g| g.name)
            .unwrap_or_else(|| user.gid.to_string());

        let home = Some(user.dir).filter(|dir| !dir.as_os_str().is_empty());
        let shell = Some(user.shell).filter(|sh| !sh.as_os_str().is_empty());

        Ok(Some(Identity {
            username: user.name,
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
            group,
            home,
            shell,
        }))
    }

    fn add(&self, username: &str) -> Result<(), AccountError> {
        let failed = |reason: String| AccountError::CreationFailed {
            username: username.to_string(),
            reason,
        };

        let useradd = which::which("useradd").map_err(|_| failed("useradd not found".into()))?;
        run(useradd, &["-m", "-s", DEFAULT_SHELL, username]).map_err(failed)
    }

    fn remove(&self, username: &str, remove_home: bool) -> Result<(), AccountError> {
        let failed = |reason: String| AccountError::DeletionFailed {
            username: username.to_string(),
            reason,
        };

        let userdel = which::which("userdel").map_err(|_| failed("userdel not found".into()))?;
        let mut args = Vec::with_capacity(2);
        if remove_home {
            args.push("-r");
        }
        args.push(username);
        run(userdel, &args).map_err(failed)
    }
}

/// Run an account tool, returning its stderr on failure.
fn run(program: PathBuf, args: &[&str]) -> Result<(), String> {
    debug!(program = %program.display(), ?args, "running");
    let output = Command::new(&program)
        .args(args)
        .output()
        .map_err(|e| format!("failed to run {}: {}", program.display(), e))?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(if stderr.is_empty() {
        format!("{} exited with {}", program.display(), output.status)
    } else {
        stderr
    })
}
