//! Config command handler

use anyhow::Result;
use colored::*;
use wusa_runner::Config;

/// Prints the effective configuration
pub fn show(config: &Config) -> Result<()> {
    let rows = [
        ("Base directory", config.base_dir.display().to_string()),
        ("Runner file", config.runner_file().display().to_string()),
        ("Token file", config.token_file().display().to_string()),
        ("Container runtime", config.runtime.clone()),
        ("Base image", config.base_image.clone()),
        ("GitHub API", config.github_api_url.clone()),
    ];

    for (key, value) in rows {
        println!("{} {}", format!("{:<18}", format!("{}:", key)).bold(), value);
    }

    Ok(())
}
