//! Remove command.

use crate::cli::{host, output, report};
use crate::core::engine::Action;
use crate::core::types::RemoveOptions;
use crate::error::{Error, Result};

/// Remove each package. Deleting accounts asks first unless `yes`.
pub fn execute(packages: &[String], options: RemoveOptions, yes: bool) -> Result<()> {
    host::require_root()?;
    let targets = host::parse_targets(packages)?;

    if options.delete_account && !yes && !confirm_delete(&targets)? {
        output::dimmed("aborted");
        return Ok(());
    }

    let host = host::Host::new();
    let reports = host.engine().apply_all(Action::Remove, &targets, options);
    report::finish(&reports)
}

fn confirm_delete(targets: &[crate::core::engine::Target]) -> Result<bool> {
    use dialoguer::Confirm;

    if !console::user_attended() {
        return Err(Error::Other(
            "--delete-account needs confirmation; pass --yes when not on a terminal".to_string(),
        ));
    }

    let mut names: Vec<&str> = targets.iter().map(|t| t.username()).collect();
    names.sort_unstable();
    names.dedup();
    Confirm::new()
        .with_prompt(format!("Delete account(s) {}?", names.join(", ")))
        .default(false)
        .interact()
        .map_err(Into::into)
}
