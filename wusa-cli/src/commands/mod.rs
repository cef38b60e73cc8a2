//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod auth;
mod config;
mod runner;

pub use auth::DeviceFlowError;

use anyhow::Result;
use clap::Subcommand;
use wusa_runner::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create a runner for a repository and register it with GitHub
    Create {
        /// Repository in the form owner/name
        repo: String,

        /// Comma-separated runner labels
        #[arg(short, long, value_delimiter = ',')]
        labels: Vec<String>,
    },
    /// Start a runner and wait until it listens for jobs
    Up {
        /// Runner name
        name: String,
    },
    /// Stop a runner, deregister it and delete its image
    Remove {
        /// Runner name
        name: String,
    },
    /// List runners in the local registry
    ListLocal,
    /// List the runners GitHub knows for a repository
    ListRepo {
        /// Repository in the form owner/name
        repo: String,
    },
    /// Authorize wusa with GitHub through the device flow
    Auth,
    /// Show the effective configuration
    Config,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The resolved configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Create { repo, labels } => runner::create(config, &repo, &labels).await,
        Commands::Up { name } => runner::up(config, &name),
        Commands::Remove { name } => runner::remove(config, &name).await,
        Commands::ListLocal => runner::list_local(config),
        Commands::ListRepo { repo } => runner::list_repo(config, &repo).await,
        Commands::Auth => auth::authorize(config).await,
        Commands::Config => config::show(config),
    }
}
