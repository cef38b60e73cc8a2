//! OAuth device flow
//!
//! `wusa auth` authorizes the CLI through GitHub's device flow:
//! 1. [`DeviceFlowClient::request_device_codes`] hands out a user code
//! 2. the user enters it at the verification URI
//! 3. the caller polls [`DeviceFlowClient::poll_access_token`] until it
//!    returns something other than [`PollStatus::Pending`]
//!
//! The client performs a single request per call. Pacing and the attempt bound
//! belong to the caller.

use reqwest::Client;
use tracing::debug;
use wusa_core::dto::auth::{AccessTokenResponse, DEVICE_CODE_GRANT_TYPE, DeviceCodes};

pub use wusa_core::dto::auth::PollStatus;

use crate::USER_AGENT;
use crate::error::{ClientError, Result};

/// Default base URL of the GitHub login endpoints
pub const GITHUB_LOGIN_URL: &str = "https://github.com";

/// Client ID of the wusa OAuth app
pub const WUSA_CLIENT_ID: &str = "070dcc7e8ff3a7c087d5";

/// Scope requested for the access token
pub const ACCESS_SCOPE: &str = "repo";

/// Client for the OAuth device flow endpoints
#[derive(Debug, Clone)]
pub struct DeviceFlowClient {
    base_url: String,
    client_id: String,
    client: Client,
}

impl DeviceFlowClient {
    /// Creates a device flow client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the login endpoints (e.g., "https://github.com")
    /// * `client_id` - OAuth app client ID
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client: Client::new(),
        }
    }

    /// Starts the device flow
    pub async fn request_device_codes(&self) -> Result<DeviceCodes> {
        let url = format!("{}/login/device/code", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("scope", ACCESS_SCOPE),
            ])
            .send()
            .await?;

        parse_json(response).await
    }

    /// Polls once for the access token belonging to `device_code`
    pub async fn poll_access_token(&self, device_code: &str) -> Result<PollStatus> {
        let url = format!("{}/login/oauth/access_token", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("device_code", device_code),
                ("grant_type", DEVICE_CODE_GRANT_TYPE),
            ])
            .send()
            .await?;

        let body: AccessTokenResponse = parse_json(response).await?;
        let status = PollStatus::from(body);
        debug!("Access token poll: {:?}", status);

        Ok(status)
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(ClientError::bad_request(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_flow_client_trims_slash() {
        let client = DeviceFlowClient::new("https://github.com/", WUSA_CLIENT_ID);
        assert_eq!(client.base_url, "https://github.com");
        assert_eq!(client.client_id, WUSA_CLIENT_ID);
    }
}
