//! Lifecycle service
//!
//! Drives the runner lifecycle:
//! - `create`: registration token, scaffold container running `config.sh`,
//!   commit to an image named after the runner, registry record
//! - `up`: container from the runner image running `run.sh`, logs followed
//!   until the agent listens for jobs
//! - `remove`: runtime container stopped, runner deregistered from a helper
//!   container, image and registry record removed
//!
//! Steps run strictly in order and the first failure aborts the operation.
//! Nothing already done is rolled back: a failure after the scaffold container
//! was started leaves the container (or the committed image) behind for manual
//! cleanup, and an interrupted `remove` can leave a record whose container and
//! image are gone.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use wusa_core::domain::runner::{GITHUB_URL, Runner, validate_label, validate_repo};

use crate::docker::{ContainerDriver, ContainerHandle};
use crate::error::{DockerError, Error, LifecycleError, Step, StepContext};
use crate::repository::{RunnerApi, RunnerRegistry};
use crate::service::sink::{LogLine, OutputSink};

/// Output line marking a runner that is connected and waiting for jobs
pub const LISTENING_SENTINEL: &str = "Listening for Jobs";

/// Output line marking a runner that lost its connection
pub const RECONNECTING_MARKER: &str = "Retrying until reconnected";

/// Tag of committed runner images
pub const IMAGE_TAG: &str = "latest";

const MAX_NAME_ATTEMPTS: usize = 5;

/// Result of starting a runner
#[derive(Debug, Clone)]
pub struct UpOutcome {
    /// The long-running runner container
    pub container: ContainerHandle,

    /// Whether the listening sentinel was seen before the output ended
    pub listening: bool,
}

/// Runner lifecycle engine
pub struct LifecycleService {
    driver: Arc<dyn ContainerDriver>,
    api: Arc<dyn RunnerApi>,
    registry: RunnerRegistry,
    base_image: String,
    github_url: String,
}

impl LifecycleService {
    /// Creates a lifecycle service
    ///
    /// # Arguments
    /// * `driver` - Container runtime driver
    /// * `api` - GitHub runner endpoints
    /// * `registry` - Local runner registry
    /// * `base_image` - Image the scaffold container is started from
    pub fn new(
        driver: Arc<dyn ContainerDriver>,
        api: Arc<dyn RunnerApi>,
        registry: RunnerRegistry,
        base_image: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            api,
            registry,
            base_image: base_image.into(),
            github_url: GITHUB_URL.to_string(),
        }
    }

    /// Registers runners against the GitHub host at `github_url`
    pub fn with_github_url(mut self, github_url: impl Into<String>) -> Self {
        self.github_url = github_url.into();
        self
    }

    pub fn registry(&self) -> &RunnerRegistry {
        &self.registry
    }

    /// Registers a new runner for `repo` and commits it to an image
    ///
    /// The registry only learns about the runner once every container step
    /// succeeded.
    pub async fn create(
        &self,
        repo: &str,
        labels: &[String],
        sink: &mut dyn OutputSink,
    ) -> Result<Runner, LifecycleError> {
        validate_request(repo, labels).step(Step::ValidatingRequest)?;

        sink.step(&format!("Requesting registration token for {}", repo));
        let token = self
            .api
            .registration_token(repo)
            .await
            .step(Step::RequestingRegistrationToken)?;

        let runner = self
            .generate_identity(repo, labels)
            .step(Step::GeneratingIdentity)?;
        info!("Creating runner {} for {}", runner.name, repo);

        sink.step(&format!("Registering runner '{}'", runner.name));
        let command = registration_command(&runner.url_on(&self.github_url), &runner, &token.token);
        let scaffold = self
            .driver
            .run(&self.base_image, &command, &runner.name, &BTreeMap::new())
            .step(Step::LaunchingContainer)?;

        // The registration script has finished once its output ends
        self.follow(&scaffold, sink, false)
            .step(Step::LaunchingContainer)?;

        sink.step(&format!("Committing image {}", runner.image()));
        self.driver
            .commit(&scaffold, &runner.name, IMAGE_TAG)
            .step(Step::CommittingImage)?;

        self.driver
            .remove(&scaffold)
            .step(Step::RemovingScaffoldContainer)?;

        self.registry
            .append(runner.clone())
            .step(Step::PersistingRecord)?;

        info!("Runner {} created", runner.name);
        Ok(runner)
    }

    /// Starts a previously created runner
    ///
    /// Returns once the runner reports that it listens for jobs or its output
    /// ends. There is no timeout.
    pub fn up(&self, name: &str, sink: &mut dyn OutputSink) -> Result<UpOutcome, LifecycleError> {
        let runner = self.registry.get(name).step(Step::LookingUpRunner)?;

        sink.step(&format!("Starting runner '{}'", runner.name));
        let container = self
            .driver
            .run(&runner.image(), &start_command(), &runner.name, &BTreeMap::new())
            .step(Step::StartingContainer)?;

        let listening = self
            .follow(&container, sink, true)
            .step(Step::StreamingLogs)?;

        if listening {
            info!("Runner {} is listening for jobs", runner.name);
        } else {
            warn!("Output of runner {} ended before it listened for jobs", runner.name);
        }

        Ok(UpOutcome {
            container,
            listening,
        })
    }

    /// Tears a runner down and deregisters it
    ///
    /// Returns the removed registry record.
    pub async fn remove(
        &self,
        name: &str,
        sink: &mut dyn OutputSink,
    ) -> Result<Runner, LifecycleError> {
        let runner = self.registry.get(name).step(Step::LookingUpRunner)?;

        sink.step(&format!("Stopping runner '{}'", runner.name));
        let containers = self
            .driver
            .list(&runner.name, None)
            .step(Step::LocatingRuntimeContainer)?;

        match containers.as_slice() {
            [] => debug!("No container found for runner {}", runner.name),
            [container] => self
                .dispose(container)
                .step(Step::StoppingContainer)?,
            _ => {
                return Err(LifecycleError::new(
                    Step::LocatingRuntimeContainer,
                    DockerError::AmbiguousContainer {
                        runner: runner.name.clone(),
                        count: containers.len(),
                    },
                ));
            }
        }

        sink.step(&format!(
            "Deregistering runner from {}",
            runner.url_on(&self.github_url)
        ));
        let token = self
            .api
            .removal_token(&runner.repo)
            .await
            .step(Step::RevokingRemoteRegistration)?;

        let helper = self
            .driver
            .run(
                &runner.image(),
                &removal_command(&token.token),
                &runner.name,
                &BTreeMap::new(),
            )
            .step(Step::RevokingRemoteRegistration)?;

        self.follow(&helper, sink, false)
            .step(Step::RevokingRemoteRegistration)?;
        self.dispose(&helper)
            .step(Step::RevokingRemoteRegistration)?;

        sink.step(&format!("Removing image {}", runner.image()));
        self.driver
            .remove_image(&runner.image())
            .step(Step::RemovingImage)?;

        let removed = self
            .registry
            .remove(&runner.name)
            .step(Step::UpdatingRegistry)?;

        info!("Runner {} removed", removed.name);
        Ok(removed)
    }

    /// Runners in the local registry
    pub fn list_local(&self) -> Result<Vec<Runner>, LifecycleError> {
        self.registry.load().step(Step::ListingRunners)
    }

    /// Runners GitHub knows for `repo`, with their status
    pub async fn list_remote(&self, repo: &str) -> Result<Vec<Runner>, LifecycleError> {
        self.api.list_runners(repo).await.step(Step::ListingRunners)
    }

    /// Builds a record for a new runner with a name not yet in the registry
    fn generate_identity(&self, repo: &str, labels: &[String]) -> Result<Runner, Error> {
        let existing = self.registry.load()?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let runner = Runner::generate(repo, labels.iter().cloned());
            if !existing.iter().any(|known| known.name == runner.name) {
                return Ok(runner);
            }
            warn!("Generated runner name {} is already taken", runner.name);
        }

        Err(Error::RegistryIo(format!(
            "Could not generate an unused runner name after {} attempts",
            MAX_NAME_ATTEMPTS
        )))
    }

    /// Forwards a container's output to `sink`
    fn follow(
        &self,
        container: &ContainerHandle,
        sink: &mut dyn OutputSink,
        stop_at_sentinel: bool,
    ) -> Result<bool, DockerError> {
        let logs = self.driver.stream_logs(container)?;
        forward_lines(logs, sink, stop_at_sentinel)
    }

    /// Stops (if running) and removes a container that may already be gone
    fn dispose(&self, container: &ContainerHandle) -> Result<(), DockerError> {
        if container.running {
            match self.driver.stop(container) {
                Ok(()) => {}
                Err(DockerError::ContainerNotFound(id)) => {
                    debug!("Container {} is already gone", id);
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        match self.driver.remove(container) {
            Ok(()) | Err(DockerError::ContainerNotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Forwards non-empty lines to `sink`
///
/// With `stop_at_sentinel` set, a line containing [`LISTENING_SENTINEL`] is
/// forwarded and ends the loop; no further line is pulled. Returns whether the
/// sentinel was seen.
pub fn forward_lines<I>(
    lines: I,
    sink: &mut dyn OutputSink,
    stop_at_sentinel: bool,
) -> Result<bool, DockerError>
where
    I: IntoIterator<Item = Result<String, DockerError>>,
{
    for line in lines {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        if stop_at_sentinel && text.contains(LISTENING_SENTINEL) {
            sink.line(LogLine::Listening(text));
            return Ok(true);
        }

        if text.contains(RECONNECTING_MARKER) {
            sink.line(LogLine::Reconnecting(text));
        } else {
            sink.line(LogLine::Output(text));
        }
    }

    Ok(false)
}

/// Checks that `repo` and `labels` can be spliced into the registration script
pub fn validate_request(repo: &str, labels: &[String]) -> Result<(), Error> {
    validate_repo(repo).map_err(Error::InvalidRequest)?;
    for label in labels {
        validate_label(label).map_err(Error::InvalidRequest)?;
    }
    Ok(())
}

/// Command configuring the runner agent inside the scaffold container
///
/// `url` is the repository URL on the GitHub host the runner registers with.
pub fn registration_command(url: &str, runner: &Runner, token: &str) -> Vec<String> {
    let mut script = format!(
        "./config.sh --unattended --url {} --name {} --replace --token {}",
        url,
        runner.name,
        token
    );
    if !runner.labels.is_empty() {
        script.push_str(&format!(" --labels {}", runner.labels_csv()));
    }

    bash(script)
}

/// Command starting the configured runner agent
pub fn start_command() -> Vec<String> {
    bash("./run.sh".to_string())
}

/// Command deregistering the runner agent
pub fn removal_command(token: &str) -> Vec<String> {
    bash(format!("./config.sh remove --token {}", token))
}

fn bash(script: String) -> Vec<String> {
    vec!["bash".to_string(), "-c".to_string(), script]
}
