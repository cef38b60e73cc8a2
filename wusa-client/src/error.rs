//! Error types for the wusa client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to GitHub
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// GitHub answered with a non-success status code
    #[error("GitHub rejected the request (status {status}): {message}")]
    BadRequest {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// No access token has been saved locally
    #[error("No access token found, run 'wusa auth' first")]
    NoAccessToken,

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Reading or writing the local token store failed
    #[error("Token store error: {0}")]
    TokenStore(#[from] std::io::Error),
}

impl ClientError {
    /// Create a bad request error from status code and message
    pub fn bad_request(status: u16, message: impl Into<String>) -> Self {
        Self::BadRequest {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_message() {
        let err = ClientError::bad_request(422, "Validation Failed");
        assert_eq!(
            err.to_string(),
            "GitHub rejected the request (status 422): Validation Failed"
        );
    }
}
