//! Container runtime driver
//!
//! Handles the container operations the runner lifecycle needs:
//! - Checking that the runtime daemon is reachable
//! - Running labelled containers from an image
//! - Committing configured containers to images
//! - Stopping and removing containers and images
//! - Following container logs line by line
//!
//! The runtime is driven through its CLI (`docker` by default, `podman` works
//! the same way). Failures are classified from the runtime's stderr.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{DockerError, Error};

/// Label carrying the runner name on every container wusa creates
pub const CONTAINER_NAME_LABEL: &str = "org.wusa.container-name";

// Docker prints "Unable to find image" before every auto-pull, successful or
// not, so it is not a failure marker.
const IMAGE_NOT_FOUND_MARKERS: &[&str] = &[
    "no such image",
    "pull access denied",
    "manifest unknown",
    "image not known",
];

const CONTAINER_NOT_FOUND_MARKERS: &[&str] = &[
    "no such container",
    "no such object",
    "no container with name or id",
];

/// Arguments of the reachability check; plain `info` works on docker and podman
const CONNECT_ARGS: &[&str] = &["info"];

/// Reference to a container created by wusa
///
/// Handles are owned by the lifecycle operation that obtained them and are
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    /// Container id as reported by the runtime
    pub id: String,

    /// Runner name from the container's label
    pub runner: String,

    /// Whether the container was running when the handle was obtained
    pub running: bool,
}

/// Lazy sequence of log lines
///
/// Ends when the container's process exits. Dropping it stops following.
pub type LogStream = Box<dyn Iterator<Item = Result<String, DockerError>> + Send>;

/// Operations the lifecycle service needs from a container runtime
pub trait ContainerDriver: Send + Sync {
    /// Starts a detached container from `image` running `command`
    ///
    /// The container is labelled with [`CONTAINER_NAME_LABEL`]`=<runner_name>`
    /// plus any extra `labels`.
    fn run(
        &self,
        image: &str,
        command: &[String],
        runner_name: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<ContainerHandle, DockerError>;

    /// Looks up a single wusa container by name or id
    fn get(&self, name: &str) -> Result<ContainerHandle, DockerError>;

    /// Lists all containers (running or not) labelled with `runner_name`
    fn list(
        &self,
        runner_name: &str,
        name_filter: Option<&str>,
    ) -> Result<Vec<ContainerHandle>, DockerError>;

    /// Commits the container's filesystem to `repository:tag`
    fn commit(
        &self,
        handle: &ContainerHandle,
        repository: &str,
        tag: &str,
    ) -> Result<(), DockerError>;

    /// Removes a stopped container
    fn remove(&self, handle: &ContainerHandle) -> Result<(), DockerError>;

    /// Stops a running container
    fn stop(&self, handle: &ContainerHandle) -> Result<(), DockerError>;

    /// Removes an image; a missing image is not an error
    fn remove_image(&self, name: &str) -> Result<(), DockerError>;

    /// Follows the combined stdout/stderr of a container
    fn stream_logs(&self, handle: &ContainerHandle) -> Result<LogStream, DockerError>;
}

/// Maps a failed runtime invocation onto a [`DockerError`]
///
/// Image-not-found is a special case of the runtime's generic API error, so
/// it has to be checked before anything else.
pub fn classify_failure(operation: &str, subject: &str, stderr: &str) -> DockerError {
    let lowered = stderr.to_lowercase();

    if IMAGE_NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m)) {
        return DockerError::ImageNotFound(subject.to_string());
    }

    if CONTAINER_NOT_FOUND_MARKERS.iter().any(|m| lowered.contains(m)) {
        return DockerError::ContainerNotFound(subject.to_string());
    }

    DockerError::api(operation, stderr.trim())
}

/// Container driver backed by the runtime CLI
#[derive(Debug, Clone)]
pub struct CliContainerDriver {
    runtime: String,
}

impl CliContainerDriver {
    /// Connects to the runtime daemon
    ///
    /// Fails with [`Error::NoDockerServerFound`] if the runtime binary cannot
    /// be executed or the daemon does not answer. Call this before any other
    /// driver operation.
    pub fn connect(runtime: impl Into<String>) -> Result<Self, Error> {
        let runtime = runtime.into();

        let output = Command::new(&runtime)
            .args(CONNECT_ARGS)
            .stdout(Stdio::null())
            .output()
            .map_err(|e| {
                Error::NoDockerServerFound(format!(
                    "failed to execute '{} info': {}. Is {} installed?",
                    runtime, e, runtime
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::NoDockerServerFound(format!(
                "'{} info' failed: {}",
                runtime,
                stderr.trim()
            )));
        }

        info!("Container runtime {} is available", runtime);

        Ok(Self { runtime })
    }

    /// Runs the runtime CLI and returns its trimmed stdout
    ///
    /// `subject` names the image or container the call is about. Arguments are
    /// not logged because `run` carries registration tokens.
    fn exec(&self, operation: &str, subject: &str, args: &[&str]) -> Result<String, DockerError> {
        debug!("{} {} ({})", self.runtime, operation, subject);

        let output = Command::new(&self.runtime)
            .args(args)
            .output()
            .map_err(|source| DockerError::Io {
                runtime: self.runtime.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !stderr.trim().is_empty() {
            debug!("{} {} stderr: {}", self.runtime, operation, stderr.trim());
        }

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            debug!(
                "{} {} failed for {}: exit_code={}",
                self.runtime, operation, subject, exit_code
            );
            return Err(classify_failure(operation, subject, &stderr));
        }

        Ok(stdout.trim().to_string())
    }
}

impl ContainerDriver for CliContainerDriver {
    fn run(
        &self,
        image: &str,
        command: &[String],
        runner_name: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<ContainerHandle, DockerError> {
        info!("Starting container for runner {} from image {}", runner_name, image);

        let mut label_args = vec![format!("{}={}", CONTAINER_NAME_LABEL, runner_name)];
        label_args.extend(labels.iter().map(|(key, value)| format!("{}={}", key, value)));

        let mut args = vec!["run", "--detach"];
        for label in &label_args {
            args.push("--label");
            args.push(label.as_str());
        }
        args.push(image);
        args.extend(command.iter().map(String::as_str));

        let id = self.exec("run", image, &args)?;
        if id.is_empty() {
            return Err(DockerError::api("run", "runtime did not report a container id"));
        }

        info!("Container {} started for runner {}", short_id(&id), runner_name);

        Ok(ContainerHandle {
            id,
            runner: runner_name.to_string(),
            running: true,
        })
    }

    fn get(&self, name: &str) -> Result<ContainerHandle, DockerError> {
        let stdout = self.exec(
            "inspect",
            name,
            &["inspect", "--type", "container", "--format", "{{json .}}", name],
        )?;

        let value: Value = serde_json::from_str(&stdout).map_err(|e| {
            DockerError::api("inspect", format!("unexpected inspect output: {}", e))
        })?;

        parse_inspect(&value).ok_or_else(|| DockerError::InvalidContainer(name.to_string()))
    }

    fn list(
        &self,
        runner_name: &str,
        name_filter: Option<&str>,
    ) -> Result<Vec<ContainerHandle>, DockerError> {
        let label_filter = format!("label={}={}", CONTAINER_NAME_LABEL, runner_name);
        let name_filter = name_filter.map(|name| format!("name={}", name));

        let mut args = vec![
            "ps",
            "--all",
            "--no-trunc",
            "--filter",
            label_filter.as_str(),
        ];
        if let Some(filter) = &name_filter {
            args.push("--filter");
            args.push(filter.as_str());
        }
        args.push("--format");
        args.push("{{json .}}");

        let stdout = self.exec("ps", runner_name, &args)?;

        let containers = stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                parse_ps_line(line, runner_name).ok_or_else(|| {
                    DockerError::api("ps", format!("unexpected ps output: {}", line))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Found {} container(s) for runner {}",
            containers.len(),
            runner_name
        );
        Ok(containers)
    }

    fn commit(
        &self,
        handle: &ContainerHandle,
        repository: &str,
        tag: &str,
    ) -> Result<(), DockerError> {
        let reference = format!("{}:{}", repository, tag);
        info!("Committing container {} to {}", short_id(&handle.id), reference);

        self.exec("commit", &handle.id, &["commit", handle.id.as_str(), reference.as_str()])?;
        Ok(())
    }

    fn remove(&self, handle: &ContainerHandle) -> Result<(), DockerError> {
        debug!("Removing container {}", short_id(&handle.id));
        self.exec("rm", &handle.id, &["rm", handle.id.as_str()])?;
        Ok(())
    }

    fn stop(&self, handle: &ContainerHandle) -> Result<(), DockerError> {
        debug!("Stopping container {}", short_id(&handle.id));
        self.exec("stop", &handle.id, &["stop", handle.id.as_str()])?;
        Ok(())
    }

    fn remove_image(&self, name: &str) -> Result<(), DockerError> {
        match self.exec("rmi", name, &["rmi", name]) {
            Ok(_) => {
                info!("Removed image {}", name);
                Ok(())
            }
            Err(DockerError::ImageNotFound(_)) => {
                warn!("Image {} was already removed", name);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn stream_logs(&self, handle: &ContainerHandle) -> Result<LogStream, DockerError> {
        let mut child = Command::new(&self.runtime)
            .arg("logs")
            .arg("--follow")
            .arg(&handle.id)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DockerError::Io {
                runtime: self.runtime.clone(),
                source,
            })?;

        let (sender, receiver) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, sender.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, sender);
        }

        Ok(Box::new(FollowedLogs {
            runtime: self.runtime.clone(),
            child,
            lines: receiver,
            finished: false,
        }))
    }
}

/// Pushes every line read from `pipe` into `sender` on a background thread
fn forward_lines<R: Read + Send + 'static>(pipe: R, sender: mpsc::Sender<std::io::Result<String>>) {
    thread::spawn(move || {
        for line in BufReader::new(pipe).lines() {
            if sender.send(line).is_err() {
                break;
            }
        }
    });
}

/// Log lines of a `logs --follow` child process
struct FollowedLogs {
    runtime: String,
    child: Child,
    lines: Receiver<std::io::Result<String>>,
    finished: bool,
}

impl Iterator for FollowedLogs {
    type Item = Result<String, DockerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.lines.recv() {
            Ok(Ok(line)) => Some(Ok(line)),
            Ok(Err(source)) => {
                self.finished = true;
                Some(Err(DockerError::Io {
                    runtime: self.runtime.clone(),
                    source,
                }))
            }
            Err(_) => {
                // Both pipes closed: the follower has exited
                self.finished = true;
                match self.child.wait() {
                    Ok(status) if status.success() => None,
                    Ok(status) => Some(Err(DockerError::api(
                        "logs",
                        format!("log follower exited with {}", status),
                    ))),
                    Err(source) => Some(Err(DockerError::Io {
                        runtime: self.runtime.clone(),
                        source,
                    })),
                }
            }
        }
    }
}

impl Drop for FollowedLogs {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Stops following; the container itself keeps running
        if let Err(e) = self.child.kill() {
            debug!("Log follower already exited: {}", e);
        }
        let _ = self.child.wait();
    }
}

/// Builds a handle from `inspect --format '{{json .}}'` output
///
/// Returns `None` if the container does not carry the wusa label.
fn parse_inspect(value: &Value) -> Option<ContainerHandle> {
    let id = value.get("Id")?.as_str()?.to_string();
    let runner = value
        .get("Config")?
        .get("Labels")?
        .get(CONTAINER_NAME_LABEL)?
        .as_str()?
        .to_string();
    let running = value
        .get("State")
        .and_then(|state| state.get("Running"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    Some(ContainerHandle { id, runner, running })
}

/// Builds a handle from one line of `ps --format '{{json .}}'` output
///
/// Docker reports `ID` and labels as a `k=v,k=v` string; podman reports `Id`
/// and labels as a map. Both are accepted.
fn parse_ps_line(line: &str, runner_name: &str) -> Option<ContainerHandle> {
    let value: Value = serde_json::from_str(line).ok()?;

    let id = value
        .get("ID")
        .or_else(|| value.get("Id"))?
        .as_str()?
        .to_string();

    let runner = match value.get("Labels") {
        Some(Value::String(labels)) => labels.split(',').find_map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| *key == CONTAINER_NAME_LABEL)
                .map(|(_, value)| value.to_string())
        }),
        Some(Value::Object(labels)) => labels
            .get(CONTAINER_NAME_LABEL)
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
    .unwrap_or_else(|| runner_name.to_string());

    let running = value
        .get("State")
        .and_then(Value::as_str)
        .map(|state| state.eq_ignore_ascii_case("running"))
        .unwrap_or(false);

    Some(ContainerHandle { id, runner, running })
}

fn short_id(id: &str) -> &str {
    &id[..id.len().min(12)]
}
