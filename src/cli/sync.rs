//! Sync command.

use crate::cli::{host, output};
use crate::core::config::Config;
use crate::core::repo::{Repository, SyncOutcome};
use crate::error::Result;

/// Clone or update the repository.
pub fn execute() -> Result<()> {
    host::require_root()?;
    run()
}

/// Sync without the root check. Used by `install`.
pub(crate) fn run() -> Result<()> {
    let config = Config::load()?;
    let repo = Repository::open_default();

    let outcome = repo.sync(&config)?;
    let verb = match outcome {
        SyncOutcome::Cloned => "cloned",
        SyncOutcome::Updated => "updated",
    };
    let head = repo.head().unwrap_or_else(|| "unknown".to_string());
    output::success(&format!(
        "repository {} ({} @ {})",
        verb,
        config.branch(),
        head
    ));
    Ok(())
}
