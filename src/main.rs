mod cli;
mod config;
mod error;
mod model;
mod sources;
mod sync;
mod targets;
mod util;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config_path = cli.config.unwrap_or_else(config::default_config_path);

    match &cli.command {
        Command::Sync(args) => {
            let config = config::load_config(&config_path)?;
            let now = chrono::Local::now();
            let code = cli::handle_sync(&config, args, &now).await?;
            Ok(ExitCode::from(code))
        }
        Command::Config => {
            let config = config::load_config(&config_path)?;
            cli::handle_config(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Version => {
            cli::print_version();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("TIMESHEETS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
