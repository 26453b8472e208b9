//! Install command.

use crate::cli::{host, output, report, sync};
use crate::core::engine::Action;
use crate::core::types::RemoveOptions;
use crate::error::Result;

/// Sync the repository (unless `no_sync`), then install each package.
pub fn execute(packages: &[String], no_sync: bool) -> Result<()> {
    host::require_root()?;
    let targets = host::parse_targets(packages)?;

    if no_sync {
        output::dimmed("skipping repository sync");
    } else {
        sync::run()?;
    }

    let host = host::Host::new();
    let reports = host
        .engine()
        .apply_all(Action::Install, &targets, RemoveOptions::default());
    report::finish(&reports)
}
