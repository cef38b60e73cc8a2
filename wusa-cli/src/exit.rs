//! Exit codes
//!
//! Maps the error that ended a command to the process exit code. Usage errors
//! exit with 2 from clap before any command runs.

use wusa_client::ClientError;
use wusa_runner::{DockerError, Error, LifecycleError};

use crate::commands::DeviceFlowError;

pub const UNCLASSIFIED: u8 = 1;
pub const AUTHENTICATION: u8 = 3;
pub const REMOTE_API: u8 = 4;
pub const CONTAINER_DRIVER: u8 = 5;
pub const REGISTRY: u8 = 6;
pub const INVALID_RUNNER_NAME: u8 = 7;

/// Picks the exit code for `err` from the first typed error in its chain
pub fn code_for(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<LifecycleError>() {
            return runner_code(&e.source);
        }
        if let Some(e) = cause.downcast_ref::<Error>() {
            return runner_code(e);
        }
        if let Some(e) = cause.downcast_ref::<ClientError>() {
            return client_code(e);
        }
        if cause.downcast_ref::<DockerError>().is_some() {
            return CONTAINER_DRIVER;
        }
        if cause.downcast_ref::<DeviceFlowError>().is_some() {
            return AUTHENTICATION;
        }
    }

    UNCLASSIFIED
}

fn runner_code(err: &Error) -> u8 {
    match err {
        Error::NoDockerServerFound(_) | Error::Docker(_) => CONTAINER_DRIVER,
        Error::Client(e) => client_code(e),
        Error::RegistryIo(_) => REGISTRY,
        Error::InvalidRunnerName(_) => INVALID_RUNNER_NAME,
        Error::InvalidConfig(_) | Error::InvalidRequest(_) => UNCLASSIFIED,
    }
}

fn client_code(err: &ClientError) -> u8 {
    match err {
        ClientError::NoAccessToken => AUTHENTICATION,
        ClientError::TokenStore(_) => UNCLASSIFIED,
        ClientError::RequestFailed(_)
        | ClientError::BadRequest { .. }
        | ClientError::ParseError(_) => REMOTE_API,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wusa_runner::Step;

    #[test]
    fn test_lifecycle_errors_use_their_source() {
        let err = anyhow::Error::new(LifecycleError::new(
            Step::LaunchingContainer,
            DockerError::ImageNotFound("wusarunner/base-linux:latest".to_string()),
        ));
        assert_eq!(code_for(&err), CONTAINER_DRIVER);

        let err = anyhow::Error::new(LifecycleError::new(
            Step::LookingUpRunner,
            Error::InvalidRunnerName("wusa-abcdefgh".to_string()),
        ));
        assert_eq!(code_for(&err), INVALID_RUNNER_NAME);

        let err = anyhow::Error::new(LifecycleError::new(
            Step::RequestingRegistrationToken,
            ClientError::NoAccessToken,
        ));
        assert_eq!(code_for(&err), AUTHENTICATION);
    }

    #[test]
    fn test_client_errors() {
        let err = anyhow::Error::new(ClientError::bad_request(404, "Not Found"));
        assert_eq!(code_for(&err), REMOTE_API);

        let err = anyhow::Error::new(ClientError::bad_request(401, "Bad credentials"));
        assert_eq!(code_for(&err), REMOTE_API);

        let err = anyhow::Error::new(ClientError::NoAccessToken);
        assert_eq!(code_for(&err), AUTHENTICATION);

        let err = anyhow::Error::new(ClientError::ParseError("eof".to_string()));
        assert_eq!(code_for(&err), REMOTE_API);
    }

    #[test]
    fn test_context_does_not_hide_typed_errors() {
        let err = anyhow::Error::new(Error::RegistryIo("broken".to_string()))
            .context("Can not list runners");
        assert_eq!(code_for(&err), REGISTRY);
    }

    #[test]
    fn test_other_errors() {
        let err = anyhow::Error::new(DeviceFlowError::Expired);
        assert_eq!(code_for(&err), AUTHENTICATION);

        let err = anyhow::Error::new(Error::InvalidRequest("'a b' is not a valid label".to_string()));
        assert_eq!(code_for(&err), UNCLASSIFIED);

        assert_eq!(code_for(&anyhow::anyhow!("something else")), UNCLASSIFIED);
    }
}
