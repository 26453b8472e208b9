//! Addy - Git-driven SSH and sudo access for Linux hosts.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use addy::cli::output;
use addy::cli::{execute, Cli};
use addy::core::constants::env;

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env(env::LOG).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("addy=debug")
        } else {
            EnvFilter::new("addy=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    if let Err(e) = execute(cli.command) {
        tracing::debug!(kind = e.kind(), error = ?e, "command failed");
        output::error(&e.to_string());
        if let Some(hint) = e.hint() {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
