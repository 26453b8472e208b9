//! Ownership and mode enforcement.
//!
//! Every path addy writes goes through [`ensure`] or [`ensure_directory`].
//! Both are idempotent: when the path already carries the target owner,
//! group, and mode, nothing beyond a stat happens. Errors are never retried.
//!
//! Changes go through a descriptor opened with `O_NOFOLLOW`, never through
//! a path. Paths under an account's home can be swapped by that account at
//! any moment.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::{DirBuilderExt, MetadataExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::unistd::{fchown, Gid, Group, Uid, User};
use tracing::debug;

use crate::core::types::Outcome;
use crate::error::PermissionError;

/// Observed (uid, gid, mode) of a path. Mode holds permission bits only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionState {
    pub uid: u32,
    pub gid: u32,
    pub mode: u32,
}

impl PermissionState {
    /// Whether this state equals the given owner, group, and mode.
    pub fn matches(&self, uid: u32, gid: u32, mode: u32) -> bool {
        self.uid == uid && self.gid == gid && self.mode == mode
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:o} {}:{}", self.mode, self.uid, self.gid)
    }
}

/// Read the permission state of `path` without following symlinks.
///
/// Returns `None` if the path does not exist.
pub fn inspect(path: &Path) -> Result<Option<PermissionState>, PermissionError> {
    match fs::symlink_metadata(path) {
        Ok(meta) => Ok(Some(PermissionState {
            uid: meta.uid(),
            gid: meta.gid(),
            mode: meta.mode() & 0o7777,
        })),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PermissionError::StatFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Resolve an owner and group name to numeric ids.
///
/// # Errors
///
/// Returns `PermissionError::OwnerNotFound` or `GroupNotFound` if either
/// name is missing from the system database.
pub fn resolve(owner: &str, group: &str) -> Result<(Uid, Gid), PermissionError> {
    let user = User::from_name(owner)
        .ok()
        .flatten()
        .ok_or_else(|| PermissionError::OwnerNotFound(owner.to_string()))?;
    let group_entry = Group::from_name(group)
        .ok()
        .flatten()
        .ok_or_else(|| PermissionError::GroupNotFound(group.to_string()))?;
    Ok((user.uid, group_entry.gid))
}

/// Ensure `path` is owned by `owner:group` with permission bits `mode`.
///
/// Symlinks are refused rather than followed.
///
/// # Errors
///
/// - `PermissionError::OwnerNotFound` / `GroupNotFound` for unknown names
/// - `PermissionError::StatFailed` if the path cannot be opened
/// - `PermissionError::ChownFailed` / `ChmodFailed` if the OS denies the change
pub fn ensure(path: &Path, owner: &str, group: &str, mode: u32) -> Result<Outcome, PermissionError> {
    let (uid, gid) = resolve(owner, group)?;
    let file = open_nofollow(path, false)?;
    ensure_handle(&file, path, uid, gid, mode)
}

/// Like [`ensure`] with numeric ids, but creates the directory (and missing
/// parents) first. Returns the directory held open.
///
/// # Errors
///
/// Same as [`ensure`], plus `PermissionError::CreateDirFailed` if the
/// directory cannot be created or the path exists and is not a directory.
pub fn ensure_directory(
    path: &Path,
    uid: Uid,
    gid: Gid,
    mode: u32,
) -> Result<(PinnedDir, Outcome), PermissionError> {
    let mut outcome = Outcome::Unchanged;
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            return Err(PermissionError::SymlinkRefused(path.to_path_buf()))
        }
        Ok(meta) if !meta.is_dir() => {
            return Err(PermissionError::CreateDirFailed {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "path exists and is not a directory",
                ),
            })
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "creating directory");
            fs::DirBuilder::new()
                .recursive(true)
                .mode(mode)
                .create(path)
                .map_err(|source| PermissionError::CreateDirFailed {
                    path: path.to_path_buf(),
                    source,
                })?;
            outcome = Outcome::Changed;
        }
        Err(source) => {
            return Err(PermissionError::StatFailed {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let dir = PinnedDir::open(path)?;
    match ensure_handle(&dir.file, path, uid, gid, mode)? {
        Outcome::Changed => Ok((dir, Outcome::Changed)),
        Outcome::Unchanged => Ok((dir, outcome)),
    }
}

/// Apply owner, group and mode through an open handle.
///
/// The change lands on the inode behind `file` no matter what `path`
/// names by now; `path` is only used in errors and logs.
pub fn ensure_handle(
    file: &File,
    path: &Path,
    uid: Uid,
    gid: Gid,
    mode: u32,
) -> Result<Outcome, PermissionError> {
    let stat_err = |source| PermissionError::StatFailed {
        path: path.to_path_buf(),
        source,
    };
    let meta = file.metadata().map_err(stat_err)?;

    let mut outcome = Outcome::Unchanged;

    if meta.uid() != uid.as_raw() || meta.gid() != gid.as_raw() {
        debug!(path = %path.display(), uid = uid.as_raw(), gid = gid.as_raw(), "chown");
        fchown(file.as_raw_fd(), Some(uid), Some(gid)).map_err(|errno| {
            PermissionError::ChownFailed {
                path: path.to_path_buf(),
                source: std::io::Error::from(errno),
            }
        })?;
        outcome = Outcome::Changed;
    }

    // chown can clear setuid/setgid bits; re-read the mode after it.
    let current_mode = if outcome.is_changed() {
        file.metadata().map_err(stat_err)?.mode() & 0o7777
    } else {
        meta.mode() & 0o7777
    };

    if current_mode != mode {
        debug!(path = %path.display(), mode = %format!("{:o}", mode), "chmod");
        file.set_permissions(fs::Permissions::from_mode(mode))
            .map_err(|source| PermissionError::ChmodFailed {
                path: path.to_path_buf(),
                source,
            })?;
        outcome = Outcome::Changed;
    }

    Ok(outcome)
}

/// Open `path` read-only without following a final symlink.
///
/// # Errors
///
/// - `PermissionError::SymlinkRefused` if `path` is a symlink
/// - `PermissionError::StatFailed` for any other failure
pub fn open_nofollow(path: &Path, directory: bool) -> Result<File, PermissionError> {
    // O_NONBLOCK keeps a fifo swapped in for the file from blocking the open.
    let mut flags = OFlag::O_NOFOLLOW | OFlag::O_NONBLOCK;
    if directory {
        flags |= OFlag::O_DIRECTORY;
    }
    OpenOptions::new()
        .read(true)
        .custom_flags(flags.bits())
        .open(path)
        .map_err(|source| {
            if source.raw_os_error() == Some(Errno::ELOOP as i32) {
                PermissionError::SymlinkRefused(path.to_path_buf())
            } else {
                PermissionError::StatFailed {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })
}

/// A directory held open by descriptor.
///
/// Paths from [`PinnedDir::join`] resolve through `/proc/self/fd`, so they
/// keep naming this directory even if its original path is renamed or
/// replaced with a symlink afterwards.
#[derive(Debug)]
pub struct PinnedDir {
    file: File,
    path: PathBuf,
}

impl PinnedDir {
    /// Open `path`, refusing a symlink.
    pub fn open(path: &Path) -> Result<Self, PermissionError> {
        Ok(Self {
            file: open_nofollow(path, true)?,
            path: path.to_path_buf(),
        })
    }

    /// The path the directory was opened under.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Descriptor path of the directory itself.
    pub fn fd_path(&self) -> PathBuf {
        PathBuf::from(format!("/proc/self/fd/{}", self.file.as_raw_fd()))
    }

    /// Path of `name` inside the held directory.
    pub fn join(&self, name: &str) -> PathBuf {
        self.fd_path().join(name)
    }
}
