//! Command-line interface.

pub mod completions;
pub mod config;
pub mod host;
pub mod install;
pub mod list;
pub mod output;
pub mod remove;
pub mod report;
pub mod status;
pub mod sync;
pub mod verify;

use clap::{Parser, Subcommand};

/// Addy - Git-driven SSH and sudo access for Linux hosts.
#[derive(Parser)]
#[command(
    name = "addy",
    about = "Git-driven SSH and sudo access for Linux hosts",
    version,
    after_help = "Packages are user/<name> (account + SSH keys) or sudo/<name> (passwordless sudo)."
)]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Install packages: create accounts, install keys, grant sudo
    Install {
        /// Packages, e.g. user/alice sudo/alice
        #[arg(required = true, value_name = "PACKAGE")]
        packages: Vec<String>,
        /// Skip the repository sync before installing
        #[arg(long)]
        no_sync: bool,
    },

    /// Remove packages: revoke keys or sudo
    Remove {
        /// Packages, e.g. sudo/alice
        #[arg(required = true, value_name = "PACKAGE")]
        packages: Vec<String>,
        /// Also remove the account's authorized_keys (sudo/ packages)
        #[arg(long)]
        remove_user: bool,
        /// Also delete the account
        #[arg(long)]
        delete_account: bool,
        /// Keep the home directory when deleting the account
        #[arg(long, requires = "delete_account")]
        keep_home: bool,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Clone or update the access repository
    Sync,

    /// List repository users and their state on this host
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show account, key and sudo state for one user
    Status {
        /// Username
        name: String,
    },

    /// Re-check every sudoers fragment managed by addy
    Verify,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Set a value (git-repo, git-branch, ssh-key-path)
    Set {
        key: String,
        value: String,
    },

    /// Print a value
    Get {
        key: String,
    },

    /// Clear a value
    Unset {
        key: String,
    },

    /// Print all values
    List,
}

/// Execute a command.
pub fn execute(command: Command) -> crate::error::Result<()> {
    use Command::*;

    match command {
        Install { packages, no_sync } => install::execute(&packages, no_sync),
        Remove {
            packages,
            remove_user,
            delete_account,
            keep_home,
            yes,
        } => remove::execute(
            &packages,
            crate::core::types::RemoveOptions {
                remove_user,
                delete_account,
                keep_home,
            },
            yes,
        ),
        Sync => sync::execute(),
        List { json } => list::execute(json),
        Status { name } => status::execute(&name),
        Verify => verify::execute(),
        Config { action } => match action {
            ConfigAction::Set { key, value } => config::set(&key, &value),
            ConfigAction::Get { key } => config::get(&key),
            ConfigAction::Unset { key } => config::unset(&key),
            ConfigAction::List => config::list(),
        },
        Completions { shell } => completions::execute(shell),
    }
}
