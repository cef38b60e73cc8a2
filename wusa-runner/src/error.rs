//! Error types for the wusa runner library
//!
//! Leaf components return the most specific [`Error`] they can. The lifecycle
//! service wraps it in a [`LifecycleError`] naming the step that failed, leaving
//! the underlying condition untouched.

use thiserror::Error;
use wusa_client::ClientError;

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Faults reported by the container driver
#[derive(Debug, Error)]
pub enum DockerError {
    /// The requested image does not exist locally or in the registry
    #[error("Image '{0}' not found")]
    ImageNotFound(String),

    /// No container with that name or id exists
    #[error("Did not find container '{0}'")]
    ContainerNotFound(String),

    /// The container exists but was not created by wusa
    #[error("No valid wusa container '{0}' found")]
    InvalidContainer(String),

    /// More than one container carries the label of a single runner
    #[error("Found {count} containers for runner '{runner}', expected at most one")]
    AmbiguousContainer { runner: String, count: usize },

    /// Any other failure reported by the runtime
    #[error("Error during '{operation}' encountered: {message}")]
    Api { operation: String, message: String },

    /// The runtime binary could not be executed or its output not read
    #[error("Failed to execute '{runtime}': {source}")]
    Io {
        runtime: String,
        #[source]
        source: std::io::Error,
    },
}

impl DockerError {
    pub fn api(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the runner library
#[derive(Debug, Error)]
pub enum Error {
    /// The container runtime daemon is not reachable
    #[error("wusa failed to connect to the container runtime: {0}")]
    NoDockerServerFound(String),

    /// A container runtime operation failed
    #[error(transparent)]
    Docker(#[from] DockerError),

    /// A GitHub API call failed (includes missing credentials)
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The registry file is corrupt or cannot be written
    #[error("Runner file error: {0}")]
    RegistryIo(String),

    /// No runner with that name exists in the registry
    #[error("No runner with name '{0}' found")]
    InvalidRunnerName(String),

    /// The configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A repository or label can not be passed to the registration script
    #[error("Invalid runner request: {0}")]
    InvalidRequest(String),
}

/// Step of a lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ValidatingRequest,
    RequestingRegistrationToken,
    GeneratingIdentity,
    LaunchingContainer,
    CommittingImage,
    RemovingScaffoldContainer,
    PersistingRecord,
    LookingUpRunner,
    StartingContainer,
    StreamingLogs,
    LocatingRuntimeContainer,
    StoppingContainer,
    RevokingRemoteRegistration,
    RemovingImage,
    UpdatingRegistry,
    ListingRunners,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::ValidatingRequest => "validating runner request",
            Step::RequestingRegistrationToken => "requesting registration token",
            Step::GeneratingIdentity => "generating runner identity",
            Step::LaunchingContainer => "launching registration container",
            Step::CommittingImage => "committing runner image",
            Step::RemovingScaffoldContainer => "removing registration container",
            Step::PersistingRecord => "persisting runner record",
            Step::LookingUpRunner => "looking up runner",
            Step::StartingContainer => "starting runner container",
            Step::StreamingLogs => "streaming runner logs",
            Step::LocatingRuntimeContainer => "locating runner container",
            Step::StoppingContainer => "stopping runner container",
            Step::RevokingRemoteRegistration => "revoking remote registration",
            Step::RemovingImage => "removing runner image",
            Step::UpdatingRegistry => "updating runner registry",
            Step::ListingRunners => "listing runners",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure of a lifecycle operation, annotated with the step that failed
#[derive(Debug, Error)]
#[error("Failed while {step}: {source}")]
pub struct LifecycleError {
    pub step: Step,
    #[source]
    pub source: Error,
}

impl LifecycleError {
    pub fn new(step: Step, source: impl Into<Error>) -> Self {
        Self {
            step,
            source: source.into(),
        }
    }
}

/// Attaches a lifecycle step to a failing result
pub(crate) trait StepContext<T> {
    fn step(self, step: Step) -> std::result::Result<T, LifecycleError>;
}

impl<T, E: Into<Error>> StepContext<T> for std::result::Result<T, E> {
    fn step(self, step: Step) -> std::result::Result<T, LifecycleError> {
        self.map_err(|e| LifecycleError::new(step, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_error_keeps_source() {
        let err: std::result::Result<(), DockerError> =
            Err(DockerError::ImageNotFound("wusarunner/base-linux:latest".to_string()));
        let err = err.step(Step::LaunchingContainer).unwrap_err();

        assert_eq!(err.step, Step::LaunchingContainer);
        assert!(matches!(
            err.source,
            Error::Docker(DockerError::ImageNotFound(ref image)) if image == "wusarunner/base-linux:latest"
        ));
        assert_eq!(
            err.to_string(),
            "Failed while launching registration container: Image 'wusarunner/base-linux:latest' not found"
        );
    }
}
