//! Wusa Runner
//!
//! Lifecycle engine for containerized GitHub Actions runners.
//!
//! Architecture:
//! - Configuration: Base directory, container runtime and GitHub endpoints
//! - Docker: Container driver shelling out to the runtime CLI
//! - Repositories: Local runner registry and the GitHub runner endpoints
//! - Services: create, up and remove built on top of the above

pub mod config;
pub mod docker;
pub mod error;
pub mod repository;
pub mod service;

pub use config::Config;
pub use docker::{CliContainerDriver, ContainerDriver, ContainerHandle};
pub use error::{DockerError, Error, LifecycleError, Result, Step};
pub use service::{LifecycleService, OutputSink, UpOutcome};
