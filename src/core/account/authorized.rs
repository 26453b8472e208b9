//! `~/.ssh/authorized_keys` management.
//!
//! The file is replaced atomically: keys are written to a sibling temp file,
//! synced, given their final owner and mode, then renamed over the target.
//! A crash at any point leaves either the old file or the new one.
//!
//! `.ssh` belongs to the account, which can rename or replace its entries
//! while addy runs as root. The directory is held open once and all writes
//! go through that descriptor.

use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use nix::unistd::{Gid, Uid};
use tempfile::Builder;
use tracing::{debug, info};

use super::{Identity, KeyInstall, KeyStatus};
use crate::core::constants::{AUTHORIZED_KEYS, AUTHORIZED_KEYS_MODE, SSH_DIR, SSH_DIR_MODE};
use crate::core::keys::{self, ParsedKey};
use crate::core::perms::{self, PinnedDir};
use crate::core::types::{KeyLine, Outcome};
use crate::error::{AccountError, PermissionError};

/// Validate every non-blank, non-comment line.
///
/// Line numbers are 1-based positions in `lines`, skipped lines included.
pub fn validate_lines(
    username: &str,
    lines: &[KeyLine],
) -> Result<Vec<ParsedKey>, AccountError> {
    let mut keys = Vec::new();
    for (idx, raw) in lines.iter().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let key = keys::validate(trimmed).map_err(|reason| AccountError::InvalidKey {
            line: idx + 1,
            reason,
        })?;
        keys.push(key);
    }

    if keys.is_empty() {
        return Err(AccountError::EmptyKeySet(username.to_string()));
    }
    Ok(keys)
}

fn ssh_dir(identity: &Identity) -> Result<PathBuf, AccountError> {
    identity
        .home
        .as_ref()
        .map(|home| home.join(SSH_DIR))
        .ok_or_else(|| AccountError::NoHome(identity.username.clone()))
}

fn render(keys: &[ParsedKey]) -> String {
    let mut out = String::new();
    for key in keys {
        out.push_str(&key.to_line());
        out.push('\n');
    }
    out
}

pub(super) fn install(identity: &Identity, keys: &[ParsedKey]) -> Result<KeyInstall, AccountError> {
    let username = identity.username.as_str();
    let (uid, gid) = (Uid::from_raw(identity.uid), Gid::from_raw(identity.gid));
    let dir = ssh_dir(identity)?;
    let path = dir.join(AUTHORIZED_KEYS);
    let content = render(keys);

    // Every later path goes through the held directory, not through `dir`.
    let (ssh, _) = perms::ensure_directory(&dir, uid, gid, SSH_DIR_MODE)?;

    if let Some((file, existing)) = read_current(&ssh) {
        if existing == content.as_bytes() {
            let outcome = perms::ensure_handle(&file, &path, uid, gid, AUTHORIZED_KEYS_MODE)?;
            debug!(username, ?outcome, "authorized_keys already current");
            return Ok(KeyInstall {
                path,
                count: keys.len(),
                outcome: Outcome::Unchanged,
            });
        }
    }

    write_atomic(&ssh, &path, content.as_bytes(), uid, gid)?;
    info!(username, count = keys.len(), path = %path.display(), "authorized_keys written");

    Ok(KeyInstall {
        path,
        count: keys.len(),
        outcome: Outcome::Changed,
    })
}

/// The current file and its content, if it is a regular file.
fn read_current(ssh: &PinnedDir) -> Option<(File, Vec<u8>)> {
    let mut file = perms::open_nofollow(&ssh.join(AUTHORIZED_KEYS), false).ok()?;
    if !file.metadata().ok()?.is_file() {
        return None;
    }
    let mut content = Vec::new();
    file.read_to_end(&mut content).ok()?;
    Some((file, content))
}

fn write_atomic(
    ssh: &PinnedDir,
    path: &Path,
    content: &[u8],
    uid: Uid,
    gid: Gid,
) -> Result<(), AccountError> {
    let write_err = |source| AccountError::KeyWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = Builder::new()
        .prefix(".authorized_keys.")
        .tempfile_in(ssh.fd_path())
        .map_err(write_err)?;
    tmp.write_all(content).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    // Owner and mode are final before the rename makes the file visible.
    perms::ensure_handle(tmp.as_file(), path, uid, gid, AUTHORIZED_KEYS_MODE)?;

    tmp.persist(ssh.join(AUTHORIZED_KEYS))
        .map_err(|e| write_err(e.error))?;
    Ok(())
}

pub(super) fn remove(identity: &Identity) -> Result<Outcome, AccountError> {
    let Some(home) = identity.home.as_ref() else {
        return Ok(Outcome::Unchanged);
    };
    let dir = home.join(SSH_DIR);
    let path = dir.join(AUTHORIZED_KEYS);

    let ssh = match PinnedDir::open(&dir) {
        Ok(ssh) => ssh,
        Err(PermissionError::StatFailed { source, .. }) if source.kind() == ErrorKind::NotFound => {
            return Ok(Outcome::Unchanged)
        }
        Err(e) => return Err(e.into()),
    };

    match fs::remove_file(ssh.join(AUTHORIZED_KEYS)) {
        Ok(()) => {
            info!(username = %identity.username, path = %path.display(), "authorized_keys removed");
            Ok(Outcome::Changed)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Outcome::Unchanged),
        Err(source) => Err(AccountError::KeyRemoveFailed { path, source }),
    }
}

pub(super) fn status(identity: &Identity) -> Result<KeyStatus, AccountError> {
    let dir = ssh_dir(identity)?;
    let path = dir.join(AUTHORIZED_KEYS);

    let mut keys = Vec::new();
    let mut invalid = 0;
    match fs::read_to_string(&path) {
        Ok(content) => {
            for line in content.lines() {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    continue;
                }
                match keys::validate(trimmed) {
                    Ok(key) => keys.push(key),
                    Err(_) => invalid += 1,
                }
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(source) => return Err(AccountError::KeyReadFailed { path, source }),
    }

    Ok(KeyStatus {
        permissions: perms::inspect(&path)?,
        dir_permissions: perms::inspect(&dir)?,
        path,
        keys,
        invalid,
    })
}
