//! Wusa configuration
//!
//! Defines where wusa keeps its state, which container runtime it drives and
//! which GitHub endpoints it talks to.

use std::path::PathBuf;

use wusa_client::GITHUB_API_URL;
use wusa_client::auth::{GITHUB_LOGIN_URL, WUSA_CLIENT_ID};

use crate::error::{Error, Result};

/// Application name, used for the default base directory
pub const APP_NAME: &str = "wusa";

/// Registry file name inside the base directory
pub const RUNNER_FILE: &str = "runners.json";

/// Image the scaffold container is started from
pub const DEFAULT_BASE_IMAGE: &str = "wusarunner/base-linux:latest";

/// Container runtime binary
pub const DEFAULT_RUNTIME: &str = "docker";

/// Wusa configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the registry file and the access token
    pub base_dir: PathBuf,

    /// Container runtime CLI (`docker` or a compatible one such as `podman`)
    pub runtime: String,

    /// Image with the runner agent preinstalled
    pub base_image: String,

    /// Base URL of the GitHub REST API
    pub github_api_url: String,

    /// Base URL of the GitHub host
    ///
    /// Used for the login endpoints and as the `--url` runners register
    /// against. Set it together with `github_api_url` for GitHub Enterprise.
    pub github_url: String,

    /// OAuth app client ID used by the device flow
    pub client_id: String,
}

impl Config {
    /// Creates a new configuration with defaults rooted at `base_dir`
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            base_dir,
            runtime: DEFAULT_RUNTIME.to_string(),
            base_image: DEFAULT_BASE_IMAGE.to_string(),
            github_api_url: GITHUB_API_URL.to_string(),
            github_url: GITHUB_LOGIN_URL.to_string(),
            client_id: WUSA_CLIENT_ID.to_string(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - WUSA_BASE_DIR (default: `<config dir>/wusa`)
    /// - WUSA_CONTAINER_RUNTIME (default: docker)
    /// - WUSA_BASE_IMAGE (default: wusarunner/base-linux:latest)
    /// - WUSA_GITHUB_API_URL (default: https://api.github.com)
    /// - WUSA_GITHUB_URL (default: https://github.com)
    /// - WUSA_CLIENT_ID (default: the wusa OAuth app)
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
        let defaults = Self::default();

        Self {
            base_dir: var("WUSA_BASE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.base_dir),
            runtime: var("WUSA_CONTAINER_RUNTIME").unwrap_or(defaults.runtime),
            base_image: var("WUSA_BASE_IMAGE").unwrap_or(defaults.base_image),
            github_api_url: var("WUSA_GITHUB_API_URL").unwrap_or(defaults.github_api_url),
            github_url: var("WUSA_GITHUB_URL").unwrap_or(defaults.github_url),
            client_id: var("WUSA_CLIENT_ID").unwrap_or(defaults.client_id),
        }
    }

    /// Path of the registry file
    pub fn runner_file(&self) -> PathBuf {
        self.base_dir.join(RUNNER_FILE)
    }

    /// Path of the access token file
    pub fn token_file(&self) -> PathBuf {
        self.base_dir.join(wusa_client::token::ACCESS_TOKEN_FILE)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("base_dir cannot be empty".to_string()));
        }

        if self.runtime.trim().is_empty() {
            return Err(Error::InvalidConfig("runtime cannot be empty".to_string()));
        }

        if self.base_image.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "base_image cannot be empty".to_string(),
            ));
        }

        for (name, url) in [
            ("github_api_url", &self.github_api_url),
            ("github_url", &self.github_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::InvalidConfig(format!(
                    "{} must start with http:// or https://",
                    name
                )));
            }
        }

        if self.client_id.is_empty() {
            return Err(Error::InvalidConfig(
                "client_id cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Creates the base directory if it does not exist yet
    pub fn ensure_base_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        let base_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_NAME);
        Self::new(base_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.runtime, "docker");
        assert_eq!(config.base_image, "wusarunner/base-linux:latest");
        assert_eq!(config.github_api_url, "https://api.github.com");
        assert!(config.base_dir.ends_with("wusa"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_paths() {
        let config = Config::new(PathBuf::from("/tmp/wusa-test"));
        assert_eq!(config.runner_file(), PathBuf::from("/tmp/wusa-test/runners.json"));
        assert_eq!(config.token_file(), PathBuf::from("/tmp/wusa-test/.access_token"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::new(PathBuf::from("/tmp/wusa-test"));

        // Valid config should pass
        assert!(config.validate().is_ok());

        // Empty runtime should fail
        config.runtime = String::new();
        assert!(config.validate().is_err());

        config.runtime = "podman".to_string();

        // Invalid URL should fail
        config.github_api_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        config.github_api_url = "https://ghe.example.com/api/v3".to_string();
        assert!(config.validate().is_ok());
    }
}
