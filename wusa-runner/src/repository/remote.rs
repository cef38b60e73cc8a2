//! Remote runner repository
//!
//! Access to the runner endpoints of the GitHub API:
//! - Registration tokens for new runners
//! - Removal tokens for deregistering runners
//! - The list of runners GitHub knows for a repository

use async_trait::async_trait;
use wusa_client::{ClientError, GitHubClient, RunnerToken, TokenStore};
use wusa_core::domain::runner::Runner;

/// Repository trait for runner-related GitHub operations
#[async_trait]
pub trait RunnerApi: Send + Sync {
    /// Requests a token that lets a new runner join `repo`
    async fn registration_token(&self, repo: &str) -> Result<RunnerToken, ClientError>;

    /// Requests a token that lets a runner leave `repo`
    async fn removal_token(&self, repo: &str) -> Result<RunnerToken, ClientError>;

    /// Lists the runners registered for `repo`, with their remote status
    async fn list_runners(&self, repo: &str) -> Result<Vec<Runner>, ClientError>;
}

/// GitHub implementation of [`RunnerApi`]
///
/// The access token is read from the token store on every call, so commands
/// that never reach GitHub work without credentials.
#[derive(Debug, Clone)]
pub struct GitHubRunnerApi {
    api_url: String,
    tokens: TokenStore,
}

impl GitHubRunnerApi {
    /// Creates a GitHub runner repository
    ///
    /// # Arguments
    /// * `api_url` - Base URL of the GitHub REST API
    /// * `tokens` - Store holding the access token
    pub fn new(api_url: impl Into<String>, tokens: TokenStore) -> Self {
        Self {
            api_url: api_url.into(),
            tokens,
        }
    }

    fn client(&self) -> Result<GitHubClient, ClientError> {
        Ok(GitHubClient::new(&self.api_url, self.tokens.load()?))
    }
}

#[async_trait]
impl RunnerApi for GitHubRunnerApi {
    async fn registration_token(&self, repo: &str) -> Result<RunnerToken, ClientError> {
        self.client()?.create_registration_token(repo).await
    }

    async fn removal_token(&self, repo: &str) -> Result<RunnerToken, ClientError> {
        self.client()?.create_removal_token(repo).await
    }

    async fn list_runners(&self, repo: &str) -> Result<Vec<Runner>, ClientError> {
        let list = self.client()?.list_runners(repo).await?;

        Ok(list
            .runners
            .into_iter()
            .map(|remote| remote.into_runner(repo))
            .collect())
    }
}
