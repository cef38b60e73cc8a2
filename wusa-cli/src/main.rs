//! Wusa CLI
//!
//! Command-line interface for creating, starting and removing containerized
//! GitHub Actions self-hosted runners.

mod commands;
mod config;
mod exit;
mod output;

use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "wusa", version)]
#[command(about = "Containerized GitHub Actions runners", long_about = None)]
struct Cli {
    /// Directory holding the runner registry and the access token
    #[arg(long, env = "WUSA_BASE_DIR", global = true)]
    base_dir: Option<PathBuf>,

    /// Container runtime binary (docker or podman)
    #[arg(long, env = "WUSA_CONTAINER_RUNTIME", global = true)]
    runtime: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match config::load(cli.base_dir, cli.runtime) {
        Ok(config) => {
            debug!("Using base directory {}", config.base_dir.display());
            handle_command(cli.command, &config).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "ERROR".red().bold(), e);
            ExitCode::from(exit::code_for(&e))
        }
    }
}

/// Sends tracing output to stderr, leaving stdout to command output
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("wusa=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wusa=warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
