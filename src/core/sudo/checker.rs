//! Sudoers syntax checking.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::SudoError;

/// Result of checking one policy file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// Rejected, with the checker's diagnostic output.
    Invalid(String),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

/// Validates a sudoers fragment before it is trusted.
pub trait PolicyChecker {
    /// Check the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `SudoError::CheckerUnavailable` if the check could not run at
    /// all. A rejected file is `Ok(Verdict::Invalid)`, not an error.
    fn check(&self, path: &Path) -> Result<Verdict, SudoError>;
}

/// `visudo -c -f <path>`.
#[derive(Debug, Clone, Default)]
pub struct Visudo {
    program: Option<PathBuf>,
}

impl Visudo {
    /// Locate `visudo` on `PATH` at check time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    fn program(&self) -> Result<PathBuf, SudoError> {
        match &self.program {
            Some(program) => Ok(program.clone()),
            None => which::which("visudo")
                .map_err(|_| SudoError::CheckerUnavailable("visudo not found in PATH".to_string())),
        }
    }
}

impl PolicyChecker for Visudo {
    fn check(&self, path: &Path) -> Result<Verdict, SudoError> {
        let program = self.program()?;
        debug!(program = %program.display(), path = %path.display(), "checking sudoers syntax");

        let output = Command::new(&program)
            .arg("-c")
            .arg("-f")
            .arg(path)
            .output()
            .map_err(|e| {
                SudoError::CheckerUnavailable(format!("failed to run {}: {}", program.display(), e))
            })?;

        if output.status.success() {
            return Ok(Verdict::Valid);
        }

        let mut diagnostic = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if diagnostic.is_empty() {
            diagnostic = String::from_utf8_lossy(&output.stdout).trim().to_string();
        }
        if diagnostic.is_empty() {
            diagnostic = format!("exited with {}", output.status);
        }
        Ok(Verdict::Invalid(diagnostic))
    }
}
