//! Runner domain model
//!
//! Represents a self-hosted runner managed by wusa. The same record is used for
//! entries of the local registry file and for runners reported by GitHub.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Prefix of every generated runner name
pub const RUNNER_NAME_PREFIX: &str = "wusa-";

/// Number of random lowercase letters after the prefix
pub const RUNNER_NAME_SUFFIX_LEN: usize = 8;

/// Base URL of the hosting service the runners register against
pub const GITHUB_URL: &str = "https://github.com";

/// A runner known to wusa
///
/// Only `name`, `repo` and `labels` are persisted. `status` is filled in when the
/// runner is hydrated from the remote API and stays `Unknown` for local records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runner {
    /// Unique runner name (`wusa-` followed by 8 lowercase letters)
    pub name: String,

    /// Repository the runner serves, in `owner/name` form
    pub repo: String,

    /// Runner labels, kept sorted and de-duplicated
    #[serde(default)]
    pub labels: BTreeSet<String>,

    /// Status as reported by the remote API
    #[serde(skip)]
    pub status: RunnerStatus,
}

impl Runner {
    /// Creates a runner record with an explicit name
    pub fn new<I, S>(name: impl Into<String>, repo: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            repo: repo.into(),
            labels: labels.into_iter().map(Into::into).collect(),
            status: RunnerStatus::Unknown,
        }
    }

    /// Creates a runner record with a freshly generated name
    pub fn generate<I, S>(repo: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(generate_runner_name(), repo, labels)
    }

    /// Sets the remote status
    pub fn with_status(mut self, status: RunnerStatus) -> Self {
        self.status = status;
        self
    }

    /// URL of the repository this runner registers against on github.com
    pub fn url(&self) -> String {
        self.url_on(GITHUB_URL)
    }

    /// URL of the repository on the GitHub host at `host`
    pub fn url_on(&self, host: &str) -> String {
        format!("{}/{}", host.trim_end_matches('/'), self.repo)
    }

    /// Name of the image the configured runner is committed to
    pub fn image(&self) -> String {
        format!("{}:latest", self.name)
    }

    /// Labels joined by commas, as passed to `config.sh --labels`
    pub fn labels_csv(&self) -> String {
        self.labels
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Status of a runner as reported by GitHub
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunnerStatus {
    /// Connected and currently executing a job
    Online,

    /// Connected and waiting for jobs
    Idle,

    /// Not connected
    Offline,

    /// Not reported (local records)
    #[default]
    Unknown,
}

impl RunnerStatus {
    /// Maps GitHub's `status`/`busy` pair onto a runner status
    pub fn from_remote(status: &str, busy: bool) -> Self {
        match (status, busy) {
            ("online", true) => RunnerStatus::Online,
            ("online", false) | ("idle", _) => RunnerStatus::Idle,
            ("offline", _) => RunnerStatus::Offline,
            _ => RunnerStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunnerStatus::Online => "online",
            RunnerStatus::Idle => "idle",
            RunnerStatus::Offline => "offline",
            RunnerStatus::Unknown => "",
        }
    }
}

impl std::fmt::Display for RunnerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const UUID_FIXED_BYTES: [usize; 2] = [6, 8];

/// Generates a runner name of the form `wusa-xxxxxxxx`
///
/// The suffix is drawn from the random bytes of a v4 UUID, each mapped onto
/// `a..=z`. Bytes 6 and 8 hold the version and variant bits and are skipped.
pub fn generate_runner_name() -> String {
    let uuid = Uuid::new_v4();
    let suffix: String = uuid
        .as_bytes()
        .iter()
        .enumerate()
        .filter(|(index, _)| !UUID_FIXED_BYTES.contains(index))
        .take(RUNNER_NAME_SUFFIX_LEN)
        .map(|(_, byte)| char::from(b'a' + byte % 26))
        .collect();

    format!("{}{}", RUNNER_NAME_PREFIX, suffix)
}

/// Validates a repository slug of the form `owner/name`
pub fn validate_repo(repo: &str) -> Result<(), String> {
    let mut parts = repo.split('/');
    let (owner, name) = match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) => (owner, name),
        _ => return Err(format!("'{}' is not of the form 'owner/name'", repo)),
    };

    let valid_part = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };

    if !valid_part(owner) || !valid_part(name) {
        return Err(format!("'{}' contains an invalid owner or repository name", repo));
    }

    Ok(())
}

/// Validates a runner label
///
/// Labels end up on the command line of the registration script, so only
/// characters GitHub accepts in labels without quoting are allowed.
pub fn validate_label(label: &str) -> Result<(), String> {
    if label.is_empty() {
        return Err("Labels cannot be empty".to_string());
    }

    if !label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(format!("'{}' is not a valid label", label));
    }

    Ok(())
}
