//! List command.
//!
//! Shows every user in the repository clone and where the host stands for
//! each: account present, keys installed, sudo granted. Managed sudo grants
//! for users no longer in the repository are listed as orphans.

use tracing::warn;

use crate::cli::{host::Host, output};
use crate::core::account::Accounts;
use crate::core::engine::validate_username;
use crate::core::source::KeySource;
use crate::error::Result;

struct Row {
    name: String,
    account: bool,
    keys: Option<usize>,
    sudo: bool,
}

/// List repository users.
pub fn execute(json: bool) -> Result<()> {
    let host = Host::new();
    let sudo = host.sudo();

    let mut rows = Vec::new();
    for name in host.source.users()? {
        if let Err(e) = validate_username(&name) {
            warn!(error = %e, "skipping key file");
            continue;
        }
        let keys = host
            .accounts
            .key_status(&name)
            .ok()
            .flatten()
            .filter(|status| status.permissions.is_some())
            .map(|status| status.keys.len());
        rows.push(Row {
            account: host.accounts.exists(&name),
            sudo: sudo.is_granted(&name),
            keys,
            name,
        });
    }

    let orphans: Vec<String> = sudo
        .managed_fragments()
        .unwrap_or_default()
        .into_iter()
        .filter(|name| !rows.iter().any(|r| &r.name == name))
        .collect();

    if json {
        let users: Vec<_> = rows
            .iter()
            .map(|r| {
                serde_json::json!({
                    "name": r.name,
                    "account": r.account,
                    "keys": r.keys,
                    "sudo": r.sudo,
                })
            })
            .collect();
        let result = serde_json::json!({
            "users": users,
            "count": rows.len(),
            "orphaned_sudo": orphans,
        });
        output::data(&serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if rows.is_empty() {
        output::dimmed("no users in repository");
        output::hint(&format!("run: {}", output::cmd("addy sync")));
    } else {
        output::section(&format!("{} users", rows.len()));
        for row in &rows {
            let keys = match row.keys {
                Some(1) => "1 key".to_string(),
                Some(n) => format!("{} keys", n),
                None => "no keys".to_string(),
            };
            let state = match (row.account, row.sudo) {
                (false, _) => "not installed".to_string(),
                (true, true) => format!("{}, sudo", keys),
                (true, false) => keys,
            };
            output::kv(&format!("{:<16}", row.name), state);
        }
    }

    if !orphans.is_empty() {
        output::section("sudo grants without a repository user");
        for name in &orphans {
            output::list_item(name);
        }
        output::hint(&format!("remove with: {}", output::cmd("addy remove sudo/<name>")));
    }

    Ok(())
}
