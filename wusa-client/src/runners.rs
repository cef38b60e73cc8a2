//! Runner-related API endpoints

use crate::GitHubClient;
use crate::error::Result;
use tracing::debug;
use wusa_core::dto::runner::{RunnerList, RunnerToken};

/// Endpoint for obtaining a runner registration token
pub fn registration_token_path(repo: &str) -> String {
    format!("/repos/{}/actions/runners/registration-token", repo)
}

/// Endpoint for obtaining a runner removal token
pub fn removal_token_path(repo: &str) -> String {
    format!("/repos/{}/actions/runners/remove-token", repo)
}

/// Endpoint listing the self-hosted runners of a repository
pub fn runners_path(repo: &str) -> String {
    format!("/repos/{}/actions/runners", repo)
}

impl GitHubClient {
    // =============================================================================
    // Runner Tokens
    // =============================================================================

    /// Request a token that lets a new runner join `repo`
    ///
    /// # Arguments
    /// * `repo` - Repository in `owner/name` form
    ///
    /// # Example
    /// ```no_run
    /// # use wusa_client::GitHubClient;
    /// # async fn example() -> wusa_client::Result<()> {
    /// let client = GitHubClient::new("https://api.github.com", "gho_...");
    /// let token = client.create_registration_token("octo/repo").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create_registration_token(&self, repo: &str) -> Result<RunnerToken> {
        let url = format!("{}{}", self.base_url, registration_token_path(repo));
        debug!("Requesting registration token for {}", repo);
        let response = self.authorized(self.client.post(&url)).send().await?;

        self.handle_response(response).await
    }

    /// Request a token that lets a runner leave `repo`
    ///
    /// # Arguments
    /// * `repo` - Repository in `owner/name` form
    pub async fn create_removal_token(&self, repo: &str) -> Result<RunnerToken> {
        let url = format!("{}{}", self.base_url, removal_token_path(repo));
        debug!("Requesting removal token for {}", repo);
        let response = self.authorized(self.client.post(&url)).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Runner Query
    // =============================================================================

    /// List the self-hosted runners registered for `repo`
    pub async fn list_runners(&self, repo: &str) -> Result<RunnerList> {
        let url = format!("{}{}", self.base_url, runners_path(repo));
        let response = self.authorized(self.client.get(&url)).send().await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(
            registration_token_path("octo/repo"),
            "/repos/octo/repo/actions/runners/registration-token"
        );
        assert_eq!(
            removal_token_path("octo/repo"),
            "/repos/octo/repo/actions/runners/remove-token"
        );
        assert_eq!(runners_path("octo/repo"), "/repos/octo/repo/actions/runners");
    }
}
