//! Wusa HTTP Client
//!
//! A small, type-safe client for the parts of the GitHub API that wusa needs:
//! - Runner registration and removal tokens
//! - Listing the self-hosted runners of a repository
//! - The OAuth device flow used by `wusa auth`
//! - The local store for the resulting access token
//!
//! # Example
//!
//! ```no_run
//! use wusa_client::{GitHubClient, TokenStore};
//!
//! #[tokio::main]
//! async fn main() -> wusa_client::Result<()> {
//!     let store = TokenStore::new("/home/me/.config/wusa");
//!     let client = GitHubClient::new("https://api.github.com", store.load()?);
//!
//!     for runner in client.list_runners("octo/repo").await?.runners {
//!         println!("{} ({})", runner.name, runner.status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
mod runners;
pub mod token;

// Re-export commonly used types
pub use auth::DeviceFlowClient;
pub use error::{ClientError, Result};
pub use token::TokenStore;
pub use wusa_core::dto::runner::{RunnerList, RunnerToken};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Default base URL of the GitHub REST API
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// User agent sent with every request
pub const USER_AGENT: &str = "wusa";

/// HTTP client for the GitHub REST API
///
/// Every request is authenticated with the access token obtained through
/// the device flow.
#[derive(Clone)]
pub struct GitHubClient {
    /// Base URL of the API (e.g., "https://api.github.com")
    base_url: String,
    /// OAuth access token
    token: String,
    /// HTTP client instance
    client: Client,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a new GitHub client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the API (e.g., "https://api.github.com")
    /// * `token` - OAuth access token
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(base_url, token, Client::new())
    }

    /// Create a new GitHub client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        }
    }

    /// Adds the headers GitHub expects on every API call
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header("X-GitHub-Api-Version", "2022-11-28")
            .bearer_auth(&self.token)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Any non-success status is reported as [`ClientError::BadRequest`].
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::bad_request(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GitHubClient::new("https://api.github.com", "token");
        assert_eq!(client.base_url, "https://api.github.com");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = GitHubClient::new("https://api.github.com/", "token");
        assert_eq!(client.base_url, "https://api.github.com");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = GitHubClient::with_client("http://localhost:8080", "token", http_client);
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_debug_hides_token() {
        let client = GitHubClient::new(GITHUB_API_URL, "gho_secret");
        assert!(!format!("{:?}", client).contains("gho_secret"));
    }
}
