//! Runner command handlers
//!
//! Handles creating, starting, removing and listing runners.

use anyhow::Result;
use colored::*;
use std::sync::Arc;
use wusa_client::TokenStore;
use wusa_runner::repository::{GitHubRunnerApi, RunnerApi, RunnerRegistry};
use wusa_runner::service::validate_request;
use wusa_runner::{CliContainerDriver, Config, LifecycleService};

use super::auth::require_access_token;
use crate::output::{TerminalSink, print_runners};

/// Create a runner for `repo`
pub async fn create(config: &Config, repo: &str, labels: &[String]) -> Result<()> {
    validate_request(repo, labels)?;
    require_access_token(&TokenStore::new(&config.base_dir))?;

    let service = lifecycle(config)?;
    let runner = service.create(repo, labels, &mut TerminalSink).await?;

    println!(
        "{} Runner {} created for {}",
        "✓".green(),
        runner.name.bold(),
        runner.url_on(&config.github_url)
    );
    println!("  Start it with: wusa up {}", runner.name);
    Ok(())
}

/// Start the runner called `name`
pub fn up(config: &Config, name: &str) -> Result<()> {
    let service = lifecycle(config)?;
    let outcome = service.up(name, &mut TerminalSink)?;

    if outcome.listening {
        println!(
            "{} Runner {} is listening for jobs in container {}",
            "✓".green(),
            name.bold(),
            outcome.container.id
        );
    } else {
        println!(
            "{}",
            format!("Runner {} stopped before it listened for jobs.", name).yellow()
        );
    }
    Ok(())
}

/// Remove the runner called `name`
pub async fn remove(config: &Config, name: &str) -> Result<()> {
    require_access_token(&TokenStore::new(&config.base_dir))?;

    let service = lifecycle(config)?;
    let runner = service.remove(name, &mut TerminalSink).await?;

    println!(
        "{} Runner {} removed from {}",
        "✓".green(),
        runner.name.bold(),
        runner.repo
    );
    Ok(())
}

/// List runners in the local registry
pub fn list_local(config: &Config) -> Result<()> {
    let runners = RunnerRegistry::new(config.runner_file()).load()?;

    if runners.is_empty() {
        println!("{}", "No runners created yet.".yellow());
    } else {
        print_runners(&runners);
    }
    Ok(())
}

/// List the runners GitHub knows for `repo`
pub async fn list_repo(config: &Config, repo: &str) -> Result<()> {
    validate_request(repo, &[])?;
    let tokens = TokenStore::new(&config.base_dir);
    require_access_token(&tokens)?;

    let api = GitHubRunnerApi::new(&config.github_api_url, tokens);
    let runners = api.list_runners(repo).await?;

    if runners.is_empty() {
        println!(
            "{}",
            format!("No runners registered for {}.", repo).yellow()
        );
    } else {
        print_runners(&runners);
    }
    Ok(())
}

/// Wires the lifecycle service to the container runtime, GitHub and the registry
fn lifecycle(config: &Config) -> Result<LifecycleService> {
    let driver = CliContainerDriver::connect(&config.runtime)?;
    let api = GitHubRunnerApi::new(&config.github_api_url, TokenStore::new(&config.base_dir));

    Ok(LifecycleService::new(
        Arc::new(driver),
        Arc::new(api),
        RunnerRegistry::new(config.runner_file()),
        &config.base_image,
    )
    .with_github_url(&config.github_url))
}
