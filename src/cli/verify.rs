//! Verify command - re-check every managed sudoers fragment.

use crate::cli::{host, output};
use crate::core::sudo::Verdict;
use crate::error::{Error, Result};

/// Run the policy checker and permission check on each managed fragment.
pub fn execute() -> Result<()> {
    host::require_root()?;
    let host = host::Host::new();
    let verification = host.sudo().verify()?;

    if verification.fragments.is_empty() {
        output::dimmed("no managed sudo grants");
        return Ok(());
    }

    for check in &verification.fragments {
        if check.is_ok() {
            output::success(&format!("{} ok", output::name(&check.username)));
            continue;
        }
        output::error(&format!("{} ({})", output::name(&check.username), output::path(check.path.display())));
        if let Verdict::Invalid(diagnostic) = &check.verdict {
            output::kv("syntax", diagnostic);
        }
        if !check.permissions_ok {
            let found = check
                .permissions
                .map(|p| p.to_string())
                .unwrap_or_else(|| "missing".to_string());
            output::kv("permissions", format!("{} (expected 440 root:root)", found));
        }
    }

    let failed = verification.failures().count();
    if failed > 0 {
        output::hint(&format!("repair with: {}", output::cmd("addy install sudo/<name> --no-sync")));
        return Err(Error::Incomplete {
            failed,
            total: verification.fragments.len(),
            noun: "sudo grants",
        });
    }
    Ok(())
}
