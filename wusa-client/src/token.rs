//! Local access token store
//!
//! The token obtained through the device flow is kept as plain text in
//! `<base_dir>/.access_token`. It is not encrypted.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ClientError, Result};

/// File name of the stored access token
pub const ACCESS_TOKEN_FILE: &str = ".access_token";

/// File-backed store for the GitHub access token
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Creates a store for the token file inside `base_dir`
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            path: base_dir.as_ref().join(ACCESS_TOKEN_FILE),
        }
    }

    /// Path of the token file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved token
    ///
    /// Returns [`ClientError::NoAccessToken`] if no token was saved.
    pub fn load(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    return Err(ClientError::NoAccessToken);
                }
                Ok(token.to_string())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ClientError::NoAccessToken),
            Err(e) => Err(ClientError::TokenStore(e)),
        }
    }

    /// Saves `token`, replacing any previous one
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        debug!("Access token saved to {}", self.path.display());
        Ok(())
    }
}
