//! Beatmill CLI
//!
//! Parses a modifier subcommand and runs the batch pipeline over the given
//! streams.

use clap::Parser;
use env_logger::Env;

use beatmill::cli::{commands, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    commands::run(&cli)?;
    Ok(())
}
