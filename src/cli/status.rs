//! Status command - account, key and sudo detail for one user.

use crate::cli::{host::Host, output};
use crate::core::account::Accounts;
use crate::core::constants::{AUTHORIZED_KEYS_MODE, SSH_DIR_MODE};
use crate::core::engine::validate_username;
use crate::core::perms;
use crate::core::source::KeySource;
use crate::error::{AccountError, Result};

/// Show status for `name`.
pub fn execute(name: &str) -> Result<()> {
    validate_username(name)?;
    let host = Host::new();

    output::section(name);

    match host.source.read_keys(name) {
        Ok(lines) => {
            let count = lines
                .iter()
                .filter(|l| !l.trim().is_empty() && !l.trim().starts_with('#'))
                .count();
            output::kv("repository", format!("{} key line(s)", count));
        }
        Err(AccountError::KeySourceNotFound(_)) => output::kv("repository", "no key file"),
        Err(e) => return Err(e.into()),
    }

    let Some(identity) = host.accounts.lookup(name)? else {
        output::kv("account", "absent");
        return Ok(());
    };

    let account = if identity.login_disabled() {
        "present (login disabled)"
    } else {
        "present"
    };
    output::kv("account", account);
    output::kv("uid/gid", format!("{}/{} ({})", identity.uid, identity.gid, identity.group));
    if let Some(home) = &identity.home {
        output::kv("home", output::path(home.display()));
    }
    if let Some(shell) = &identity.shell {
        output::kv("shell", shell.display());
    }

    match host.accounts.key_status(name) {
        Ok(Some(status)) => {
            let (uid, gid) = (identity.uid, identity.gid);
            match status.dir_permissions {
                Some(p) if p.matches(uid, gid, SSH_DIR_MODE) => output::kv(".ssh", p),
                Some(p) => output::kv(".ssh", format!("{} (expected {:o})", p, SSH_DIR_MODE)),
                None => output::kv(".ssh", "absent"),
            }
            match status.permissions {
                Some(p) if p.matches(uid, gid, AUTHORIZED_KEYS_MODE) => {
                    output::kv("authorized_keys", p)
                }
                Some(p) => output::kv(
                    "authorized_keys",
                    format!("{} (expected {:o})", p, AUTHORIZED_KEYS_MODE),
                ),
                None => output::kv("authorized_keys", "absent"),
            }
            for key in &status.keys {
                output::list_item(&format!(
                    "{} {} {}",
                    key.key_type(),
                    key.fingerprint(),
                    key.comment().unwrap_or("")
                ));
            }
            if status.invalid > 0 {
                output::warn(&format!("{} unparseable line(s) in authorized_keys", status.invalid));
            }
        }
        Ok(None) => {}
        Err(e) => output::warn(&format!("cannot read keys: {}", e)),
    }

    let sudo = host.sudo();
    if sudo.is_granted(name) {
        let path = sudo.fragment_path(name);
        match perms::inspect(&path)? {
            Some(p) => output::kv("sudo", format!("granted ({})", p)),
            None => output::kv("sudo", "granted"),
        }
    } else {
        output::kv("sudo", "not granted");
    }

    Ok(())
}
