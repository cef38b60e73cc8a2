//! Repository layer
//!
//! Repositories give the lifecycle service access to state it does not own:
//! - The local runner registry file
//! - The runner endpoints of the GitHub API
//!
//! The remote side is trait-based so the lifecycle service can be tested
//! against stubs.

mod registry;
mod remote;

pub use registry::RunnerRegistry;
pub use remote::{GitHubRunnerApi, RunnerApi};
