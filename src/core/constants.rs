//! Constants used throughout addy.
//!
//! Centralizes filesystem locations and environment overrides.

/// Default configuration directory.
pub const CONFIG_DIR: &str = "/etc/addy";

/// Configuration file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Default location of the local repository clone.
pub const REPO_DIR: &str = "/var/lib/addy/repo";

/// Directory inside the repository holding `<name>.pub` files.
pub const USERS_DIR: &str = "users";

/// Extension of public key files in [`USERS_DIR`].
pub const PUBKEY_EXT: &str = "pub";

/// Live sudoers fragment directory.
pub const SUDOERS_DIR: &str = "/etc/sudoers.d";

/// Default git branch when `git-branch` is unset.
pub const DEFAULT_BRANCH: &str = "main";

/// Shell given to accounts created by addy.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// SSH directory name under an account's home.
pub const SSH_DIR: &str = ".ssh";

/// Authorized keys file name under [`SSH_DIR`].
pub const AUTHORIZED_KEYS: &str = "authorized_keys";

/// Mode of an account's `.ssh` directory.
pub const SSH_DIR_MODE: u32 = 0o700;

/// Mode of `authorized_keys`.
pub const AUTHORIZED_KEYS_MODE: u32 = 0o600;

/// Mode of sudoers fragments.
pub const SUDOERS_MODE: u32 = 0o440;

/// Owner and group of sudoers fragments.
pub const SUDOERS_OWNER: &str = "root";

/// Longest username accepted by `useradd` on common distributions.
pub const MAX_USERNAME_LEN: usize = 32;

/// Environment overrides, mainly for development and tests.
pub mod env {
    pub const CONFIG_DIR: &str = "ADDY_CONFIG_DIR";
    pub const REPO_DIR: &str = "ADDY_REPO_DIR";
    pub const LOG: &str = "ADDY_LOG";
    pub const SKIP_ROOT_CHECK: &str = "ADDY_SKIP_ROOT_CHECK";
}
