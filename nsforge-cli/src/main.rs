//! Nsforge CLI
//!
//! Thin front-end over the nsforge-namespace library: parses arguments,
//! calls `unshare`/`setns`, runs an optional command inside the result.

use clap::Parser;
use std::process;
use tracing::Level;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Execute the command
    let result = match cli.command {
        Commands::Unshare(args) => commands::unshare::execute(&args),
        Commands::Setns(args) => commands::setns::execute(&args),
        Commands::Info(args) => commands::info::execute(&args),
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
