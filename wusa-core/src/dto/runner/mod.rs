//! Runner DTOs
//!
//! Payloads of the `/repos/{repo}/actions/runners` endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::runner::{Runner, RunnerStatus};

/// Token returned by the registration-token and remove-token endpoints
///
/// The `Debug` implementation never prints the token itself.
#[derive(Clone, Serialize, Deserialize)]
pub struct RunnerToken {
    /// Short-lived token passed to `config.sh`
    pub token: String,

    /// Expiry timestamp as reported by GitHub
    #[serde(default)]
    pub expires_at: Option<String>,
}

impl std::fmt::Debug for RunnerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Response of `GET /repos/{repo}/actions/runners`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerList {
    pub total_count: usize,
    pub runners: Vec<RemoteRunner>,
}

/// A self-hosted runner as reported by GitHub
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRunner {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub os: String,
    pub status: String,
    #[serde(default)]
    pub busy: bool,
    #[serde(default)]
    pub labels: Vec<RemoteLabel>,
}

/// Label attached to a remote runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLabel {
    pub name: String,
}

impl RemoteRunner {
    /// Converts the remote description into a runner record for `repo`
    pub fn into_runner(self, repo: &str) -> Runner {
        let status = RunnerStatus::from_remote(&self.status, self.busy);
        Runner::new(self.name, repo, self.labels.into_iter().map(|label| label.name))
            .with_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_RESPONSE: &str = r#"{
        "total_count": 2,
        "runners": [
            {
                "id": 23,
                "name": "wusa-abcdefgh",
                "os": "linux",
                "status": "online",
                "busy": false,
                "labels": [
                    { "id": 5, "name": "self-hosted", "type": "read-only" },
                    { "id": 7, "name": "X64", "type": "read-only" }
                ]
            },
            {
                "id": 24,
                "name": "wusa-zyxwvuts",
                "os": "linux",
                "status": "offline",
                "busy": false,
                "labels": []
            }
        ]
    }"#;

    #[test]
    fn test_parse_runner_list() {
        let list: RunnerList = serde_json::from_str(LIST_RESPONSE).unwrap();
        assert_eq!(list.total_count, 2);

        let runners: Vec<Runner> = list
            .runners
            .into_iter()
            .map(|remote| remote.into_runner("octo/repo"))
            .collect();

        assert_eq!(runners[0].name, "wusa-abcdefgh");
        assert_eq!(runners[0].repo, "octo/repo");
        assert_eq!(runners[0].status, RunnerStatus::Idle);
        assert_eq!(runners[0].labels_csv(), "X64,self-hosted");
        assert_eq!(runners[1].status, RunnerStatus::Offline);
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token: RunnerToken = serde_json::from_str(
            r#"{"token": "AABBCCDD", "expires_at": "2026-01-22T12:13:35.123-08:00"}"#,
        )
        .unwrap();

        let debug = format!("{:?}", token);
        assert!(!debug.contains("AABBCCDD"));
        assert!(debug.contains("<redacted>"));
    }
}
