//! Reconciliation: turn an action on a target into ordered, idempotent steps.
//!
//! The engine is the only core entry point the CLI uses. It never returns a
//! raw error; every failure ends up in the [`Report`] next to the steps that
//! did complete, so the operator sees exactly how far a run got.

use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::core::account::{validate_lines, Accounts};
use crate::core::constants::MAX_USERNAME_LEN;
use crate::core::source::KeySource;
use crate::core::sudo::{PolicyChecker, SudoManager, SudoSettings};
use crate::core::types::{Outcome, RemoveOptions, Username};
use crate::error::{Error, Result, ValidationError};

/// What to do with a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Remove,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Install => f.write_str("install"),
            Action::Remove => f.write_str("remove"),
        }
    }
}

/// A package: `user/<name>` or `sudo/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    User(Username),
    Sudo(Username),
}

impl Target {
    /// Parse a package string, validating the username.
    pub fn parse(package: &str) -> std::result::Result<Self, ValidationError> {
        let (kind, name) = package
            .split_once('/')
            .ok_or_else(|| ValidationError::InvalidPackage(package.to_string()))?;

        validate_username(name)?;
        match kind {
            "user" => Ok(Target::User(name.to_string())),
            "sudo" => Ok(Target::Sudo(name.to_string())),
            _ => Err(ValidationError::InvalidPackage(package.to_string())),
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Target::User(name) | Target::Sudo(name) => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Target::User(_) => "user",
            Target::Sudo(_) => "sudo",
        }
    }
}

impl FromStr for Target {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Target::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind(), self.username())
    }
}

/// Check a username is safe to use as an account name and a file name.
///
/// 1 to 32 characters from `[A-Za-z0-9._-]`, starting with an alphanumeric.
pub fn validate_username(name: &str) -> std::result::Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidUsername {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("empty"));
    }
    if name.len() > MAX_USERNAME_LEN {
        return Err(invalid("longer than 32 characters"));
    }
    if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(invalid("must start with a letter or digit"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(invalid(&format!("character '{}' not allowed", c)));
    }
    Ok(())
}

/// One completed step of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub status: Outcome,
    pub summary: String,
}

impl Step {
    fn new(status: Outcome, summary: impl Into<String>) -> Self {
        Self {
            status,
            summary: summary.into(),
        }
    }
}

/// Outcome of one `apply`.
#[derive(Debug)]
pub struct Report {
    pub action: Action,
    pub target: Target,
    pub steps: Vec<Step>,
    pub failure: Option<Error>,
}

impl Report {
    fn new(action: Action, target: Target) -> Self {
        Self {
            action,
            target,
            steps: Vec::new(),
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Whether any step mutated the host.
    pub fn changed(&self) -> bool {
        self.steps.iter().any(|s| s.status.is_changed())
    }

    fn step(&mut self, status: Outcome, summary: impl Into<String>) {
        self.steps.push(Step::new(status, summary));
    }
}

/// Drives accounts, keys and sudo grants toward the desired state.
pub struct Engine<'a, A: Accounts, C: PolicyChecker, K: KeySource> {
    accounts: &'a A,
    sudo: SudoManager<'a, A, C>,
    keys: &'a K,
}

impl<'a, A: Accounts, C: PolicyChecker, K: KeySource> Engine<'a, A, C, K> {
    pub fn new(accounts: &'a A, checker: &'a C, keys: &'a K, settings: SudoSettings) -> Self {
        Self {
            accounts,
            sudo: SudoManager::new(accounts, checker, settings),
            keys,
        }
    }

    pub fn sudo(&self) -> &SudoManager<'a, A, C> {
        &self.sudo
    }

    /// Apply `action` to `target`.
    pub fn apply(&self, action: Action, target: &Target, options: RemoveOptions) -> Report {
        let mut report = Report::new(action, target.clone());
        let username = target.username();
        info!(%action, %target, "applying");

        let result = match (action, target) {
            (Action::Install, Target::User(_)) => self.install_user(username, &mut report),
            (Action::Install, Target::Sudo(_)) => self.install_sudo(username, &mut report),
            (Action::Remove, Target::User(_)) => self.remove_user(username, options, &mut report),
            (Action::Remove, Target::Sudo(_)) => self.remove_sudo(username, options, &mut report),
        };

        if let Err(e) = result {
            warn!(%action, %target, error = %e, "apply failed");
            report.failure = Some(e);
        }
        report
    }

    /// Apply `action` to each target independently, in order.
    pub fn apply_all(&self, action: Action, targets: &[Target], options: RemoveOptions) -> Vec<Report> {
        targets
            .iter()
            .map(|target| self.apply(action, target, options))
            .collect()
    }

    fn install_user(&self, username: &str, report: &mut Report) -> Result<()> {
        // Fetch and validate first: a bad key file must not leave a keyless account behind.
        let lines = self.keys.read_keys(username)?;
        validate_lines(username, &lines)?;

        let (identity, created) = self.accounts.create(username, false)?;
        match created {
            Outcome::Changed => report.step(Outcome::Changed, "account created"),
            Outcome::Unchanged if identity.login_disabled() => {
                report.step(Outcome::Unchanged, "account exists (login disabled)")
            }
            Outcome::Unchanged => report.step(Outcome::Unchanged, "account exists"),
        }

        let install = self.accounts.install_key(username, &lines)?;
        let keys = plural(install.count, "key");
        match install.outcome {
            Outcome::Changed => report.step(Outcome::Changed, format!("{} installed", keys)),
            Outcome::Unchanged => {
                report.step(Outcome::Unchanged, format!("{} already installed", keys))
            }
        }
        Ok(())
    }

    fn install_sudo(&self, username: &str, report: &mut Report) -> Result<()> {
        let grant = self.sudo.grant(username, true)?;
        if grant.account.is_changed() {
            report.step(Outcome::Changed, "account created");
        }
        match grant.fragment {
            Outcome::Changed => report.step(Outcome::Changed, "sudo granted"),
            Outcome::Unchanged => report.step(Outcome::Unchanged, "sudo already granted"),
        }
        Ok(())
    }

    fn remove_user(&self, username: &str, options: RemoveOptions, report: &mut Report) -> Result<()> {
        if options.delete_account {
            // A grant outliving its account would apply to any later account of the same name,
            // so the fragment goes even when the account is already gone.
            let revoke = self.sudo.revoke(username, RemoveOptions::default())?;
            if revoke.fragment.is_changed() {
                report.step(Outcome::Changed, "sudo revoked");
            }
        }

        if !self.accounts.exists(username) {
            report.step(Outcome::Unchanged, "account absent");
            return Ok(());
        }

        match self.accounts.remove_key(username)? {
            Outcome::Changed => report.step(Outcome::Changed, "keys removed"),
            Outcome::Unchanged => report.step(Outcome::Unchanged, "no keys installed"),
        }

        if options.delete_account {
            self.accounts.delete_account(username, !options.keep_home)?;
            report.step(Outcome::Changed, "account deleted");
        }
        Ok(())
    }

    fn remove_sudo(&self, username: &str, options: RemoveOptions, report: &mut Report) -> Result<()> {
        let revoke = self.sudo.revoke(username, options)?;
        match revoke.fragment {
            Outcome::Changed => report.step(Outcome::Changed, "sudo revoked"),
            Outcome::Unchanged => report.step(Outcome::Unchanged, "no sudo grant"),
        }
        if let Some(keys) = revoke.keys {
            match keys {
                Outcome::Changed => report.step(Outcome::Changed, "keys removed"),
                Outcome::Unchanged => report.step(Outcome::Unchanged, "no keys installed"),
            }
        }
        if let Some(account) = revoke.account {
            match account {
                Outcome::Changed => report.step(Outcome::Changed, "account deleted"),
                Outcome::Unchanged => report.step(Outcome::Unchanged, "account absent"),
            }
        }
        Ok(())
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
