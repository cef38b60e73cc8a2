//! Auth command handlers
//!
//! Runs the OAuth device flow and guards commands that need an access token.

use anyhow::Result;
use colored::*;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use wusa_client::auth::PollStatus;
use wusa_client::{ClientError, DeviceFlowClient, TokenStore};
use wusa_runner::Config;

/// The device flow ended without an access token
#[derive(Debug, Error)]
pub enum DeviceFlowError {
    #[error("Authorization failed: {0}")]
    Failed(String),

    #[error("The device code expired before the authorization was completed")]
    Expired,
}

/// Authorizes wusa and saves the access token
pub async fn authorize(config: &Config) -> Result<()> {
    let store = TokenStore::new(&config.base_dir);
    let client = DeviceFlowClient::new(&config.github_url, &config.client_id);

    let codes = client.request_device_codes().await?;
    println!(
        "Open {} and enter the code {}",
        codes.verification_uri.cyan(),
        codes.user_code.bold()
    );

    let interval = codes.interval.max(1);
    let attempts = max_attempts(codes.expires_in, interval);

    for attempt in 1..=attempts {
        tokio::time::sleep(Duration::from_secs(interval)).await;

        match client.poll_access_token(&codes.device_code).await? {
            PollStatus::Ready(token) => {
                store.save(&token)?;
                println!("{}", "Authorization successful.".green());
                return Ok(());
            }
            PollStatus::Pending => {
                debug!("Authorization pending ({}/{})", attempt, attempts);
            }
            PollStatus::Failed(reason) => return Err(DeviceFlowError::Failed(reason).into()),
        }
    }

    Err(DeviceFlowError::Expired.into())
}

/// Fails with [`ClientError::NoAccessToken`] unless a token was saved
pub fn require_access_token(store: &TokenStore) -> Result<(), ClientError> {
    store.load().map(|_| ())
}

fn max_attempts(expires_in: u64, interval: u64) -> u64 {
    (expires_in / interval.max(1)).max(1)
}
