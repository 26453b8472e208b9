//! Wiring of the core against the running host.

use nix::unistd::geteuid;
use tracing::debug;

use crate::core::account::{AccountManager, SystemUserDb};
use crate::core::constants::env;
use crate::core::engine::{Engine, Target};
use crate::core::repo::Repository;
use crate::core::source::RepoKeySource;
use crate::core::sudo::{SudoManager, SudoSettings, Visudo};
use crate::error::{Error, Result};

/// Fail unless running as root.
///
/// `ADDY_SKIP_ROOT_CHECK=1` disables the check for development.
pub fn require_root() -> Result<()> {
    if std::env::var(env::SKIP_ROOT_CHECK).map(|v| v == "1").unwrap_or(false) {
        debug!("root check skipped");
        return Ok(());
    }
    if geteuid().is_root() {
        Ok(())
    } else {
        Err(Error::NotRoot)
    }
}

/// Parse every package up front so a typo aborts before anything changes.
pub fn parse_targets(packages: &[String]) -> Result<Vec<Target>> {
    packages
        .iter()
        .map(|p| Target::parse(p).map_err(Error::from))
        .collect()
}

/// Production collaborators for one invocation.
pub struct Host {
    pub accounts: AccountManager<SystemUserDb>,
    pub checker: Visudo,
    pub source: RepoKeySource,
}

impl Host {
    pub fn new() -> Self {
        Self {
            accounts: AccountManager::new(SystemUserDb::new()),
            checker: Visudo::new(),
            source: RepoKeySource::new(Repository::default_dir()),
        }
    }

    pub fn engine(&self) -> Engine<'_, AccountManager<SystemUserDb>, Visudo, RepoKeySource> {
        Engine::new(&self.accounts, &self.checker, &self.source, SudoSettings::default())
    }

    pub fn sudo(&self) -> SudoManager<'_, AccountManager<SystemUserDb>, Visudo> {
        SudoManager::new(&self.accounts, &self.checker, SudoSettings::default())
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}
