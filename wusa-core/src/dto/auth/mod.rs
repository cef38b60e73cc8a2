//! OAuth device flow DTOs
//!
//! Payloads of `https://github.com/login/device/code` and
//! `https://github.com/login/oauth/access_token` (requested as JSON).

use serde::{Deserialize, Serialize};

/// Grant type sent while polling for the access token
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Codes handed out at the start of the device flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCodes {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    /// Seconds until `device_code` expires
    pub expires_in: u64,
    /// Minimum number of seconds between two polls
    pub interval: u64,
}

/// Raw body of the access token endpoint
///
/// GitHub answers `200 OK` both for success and for pending/failed
/// authorizations, so the presence of `error` decides the outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Outcome of a single access token poll
#[derive(Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// The user authorized the device
    Ready(String),

    /// Authorization not granted yet; poll again after the interval
    Pending,

    /// The flow cannot complete (expired, denied, ...)
    Failed(String),
}

impl std::fmt::Debug for PollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollStatus::Ready(_) => write!(f, "Ready(<redacted>)"),
            PollStatus::Pending => write!(f, "Pending"),
            PollStatus::Failed(reason) => write!(f, "Failed({:?})", reason),
        }
    }
}

impl From<AccessTokenResponse> for PollStatus {
    fn from(response: AccessTokenResponse) -> Self {
        match (response.access_token, response.error) {
            (_, Some(error)) if error == "authorization_pending" || error == "slow_down" => {
                PollStatus::Pending
            }
            (_, Some(error)) => PollStatus::Failed(response.error_description.unwrap_or(error)),
            (Some(token), None) if !token.is_empty() => PollStatus::Ready(token),
            _ => PollStatus::Failed("response contained no access token".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> PollStatus {
        serde_json::from_str::<AccessTokenResponse>(body)
            .unwrap()
            .into()
    }

    #[test]
    fn test_poll_ready() {
        let status = parse(r#"{"access_token":"gho_abc","token_type":"bearer","scope":"repo"}"#);
        assert_eq!(status, PollStatus::Ready("gho_abc".to_string()));
        assert_eq!(format!("{:?}", status), "Ready(<redacted>)");
    }

    #[test]
    fn test_poll_pending() {
        assert_eq!(parse(r#"{"error":"authorization_pending"}"#), PollStatus::Pending);
        assert_eq!(parse(r#"{"error":"slow_down","interval":10}"#), PollStatus::Pending);
    }

    #[test]
    fn test_poll_failed() {
        assert_eq!(
            parse(r#"{"error":"expired_token","error_description":"The device code has expired."}"#),
            PollStatus::Failed("The device code has expired.".to_string())
        );
        assert_eq!(
            parse(r#"{"error":"access_denied"}"#),
            PollStatus::Failed("access_denied".to_string())
        );
        assert!(matches!(parse("{}"), PollStatus::Failed(_)));
    }

    #[test]
    fn test_parse_device_codes() {
        let codes: DeviceCodes = serde_json::from_str(
            r#"{
                "device_code": "abc123",
                "user_code": "BCDE-DCEF",
                "verification_uri": "https://github.com/login/device",
                "expires_in": 900,
                "interval": 5
            }"#,
        )
        .unwrap();

        assert_eq!(codes.user_code, "BCDE-DCEF");
        assert_eq!(codes.expires_in, 900);
        assert_eq!(codes.interval, 5);
    }
}
