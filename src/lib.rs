//! Addy - Git-driven SSH and sudo access for Linux hosts.
//!
//! A repository holds one `users/<name>.pub` per person. Addy clones it and
//! reconciles the host against it: local accounts, `authorized_keys`, and
//! passwordless sudo fragments under `/etc/sudoers.d`.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── install       # Sync, then install user/ and sudo/ packages
//! │   ├── remove        # Remove packages, optionally deleting accounts
//! │   ├── sync          # Clone or update the repository
//! │   ├── list          # Repository users and their host state
//! │   ├── status        # Detail for one user
//! │   ├── verify        # Re-check every managed sudoers fragment
//! │   ├── config        # Get and set configuration
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── keys          # SSH public key validation
//!     ├── perms         # Owner, group and mode enforcement
//!     ├── account/      # Accounts and authorized_keys
//!     ├── sudo/         # sudoers.d fragments, gated by visudo
//!     ├── engine        # Action + target -> ordered, idempotent steps
//!     ├── source        # users/<name>.pub key source
//!     ├── repo          # git clone of the repository
//!     └── config        # /etc/addy/config.toml
//! ```
//!
//! # Operation
//!
//! Every run is synchronous and holds no state between invocations. Files are
//! published with temp-file-then-rename, so readers never observe a half
//! written file. Nothing takes a lock: run at most one addy per host at a
//! time.

pub mod cli;
pub mod core;
pub mod error;
