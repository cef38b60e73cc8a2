//! Configuration module
//!
//! Resolves the runner configuration from the environment and command-line
//! flags. Flags win over environment variables.

use anyhow::{Context, Result};
use std::path::PathBuf;
use wusa_runner::Config;

/// Loads, validates and prepares the configuration
///
/// # Arguments
/// * `base_dir` - Base directory given on the command line
/// * `runtime` - Container runtime given on the command line
pub fn load(base_dir: Option<PathBuf>, runtime: Option<String>) -> Result<Config> {
    let config = apply_overrides(Config::from_env(), base_dir, runtime);
    config.validate()?;

    config.ensure_base_dir().with_context(|| {
        format!(
            "Can not create base directory {}",
            config.base_dir.display()
        )
    })?;

    Ok(config)
}

fn apply_overrides(
    mut config: Config,
    base_dir: Option<PathBuf>,
    runtime: Option<String>,
) -> Config {
    if let Some(base_dir) = base_dir {
        config.base_dir = base_dir;
    }
    if let Some(runtime) = runtime.filter(|runtime| !runtime.is_empty()) {
        config.runtime = runtime;
    }
    config
}
