//! Runner registry
//!
//! The registry is a JSON array of runner records kept in a single file.
//! Every mutation loads the whole file, changes it in memory and writes it back
//! through a temporary sibling and a rename, so the file is never left half
//! written.
//!
//! There is no locking: two wusa processes mutating the registry at the same
//! time can lose an update.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use wusa_core::domain::runner::Runner;

use crate::error::{Error, Result};

/// File-backed list of known runners
#[derive(Debug, Clone)]
pub struct RunnerRegistry {
    path: PathBuf,
}

impl RunnerRegistry {
    /// Creates a registry stored at `path`
    ///
    /// Nothing is touched on disk until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the registry file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all runner records
    ///
    /// A missing file is created holding an empty list. An empty file counts as
    /// an empty list. Content that is not a valid runner list is an error.
    pub fn load(&self) -> Result<Vec<Runner>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Creating empty runner file {}", self.path.display());
                self.save(&[])?;
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(Error::RegistryIo(format!(
                    "Can not read runner file {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            Error::RegistryIo(format!(
                "Can not decode runner file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Replaces the registry content with `runners`
    pub fn save(&self, runners: &[Runner]) -> Result<()> {
        let write_error = |e: std::io::Error| {
            Error::RegistryIo(format!(
                "Can not write runner file {}: {}",
                self.path.display(),
                e
            ))
        };

        let mut content = serde_json::to_string_pretty(runners)
            .map_err(|e| Error::RegistryIo(format!("Can not encode runners: {}", e)))?;
        content.push('\n');

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).map_err(write_error)?;
        fs::rename(&tmp_path, &self.path).map_err(write_error)?;

        debug!("Saved {} runner(s) to {}", runners.len(), self.path.display());
        Ok(())
    }

    /// Finds the runner called `name`
    pub fn find(&self, name: &str) -> Result<Option<Runner>> {
        Ok(self.load()?.into_iter().find(|runner| runner.name == name))
    }

    /// Like [`find`](Self::find), but a missing runner is an error
    pub fn get(&self, name: &str) -> Result<Runner> {
        self.find(name)?
            .ok_or_else(|| Error::InvalidRunnerName(name.to_string()))
    }

    /// Appends `runner` to the registry
    pub fn append(&self, runner: Runner) -> Result<()> {
        let mut runners = self.load()?;
        runners.push(runner);
        self.save(&runners)
    }

    /// Removes the runner called `name` and returns it
    ///
    /// Fails with [`Error::InvalidRunnerName`] without rewriting the file if
    /// there is no such runner.
    pub fn remove(&self, name: &str) -> Result<Runner> {
        let mut runners = self.load()?;
        let index = runners
            .iter()
            .position(|runner| runner.name == name)
            .ok_or_else(|| Error::InvalidRunnerName(name.to_string()))?;

        let removed = runners.remove(index);
        self.save(&runners)?;

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (tempfile::TempDir, RunnerRegistry) {
        let dir = tempfile::tempdir().unwrap();
        let registry = RunnerRegistry::new(dir.path().join("runners.json"));
        (dir, registry)
    }

    #[test]
    fn test_load_creates_missing_file() {
        let (_dir, registry) = registry();

        assert!(registry.load().unwrap().is_empty());
        assert!(registry.path().exists());
        assert_eq!(fs::read_to_string(registry.path()).unwrap(), "[]\n");
    }

    #[test]
    fn test_load_empty_file() {
        let (_dir, registry) = registry();
        fs::write(registry.path(), "").unwrap();

        assert!(registry.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_corrupt_file() {
        let (_dir, registry) = registry();
        fs::write(registry.path(), "{ not json").unwrap();

        assert!(matches!(registry.load(), Err(Error::RegistryIo(_))));
    }

    #[test]
    fn test_append_and_find() {
        let (_dir, registry) = registry();
        registry
            .append(Runner::new("wusa-abcdefgh", "octo/repo", ["b", "a"]))
            .unwrap();
        registry
            .append(Runner::new("wusa-zyxwvuts", "octo/other", Vec::<String>::new()))
            .unwrap();

        let runners = registry.load().unwrap();
        assert_eq!(runners.len(), 2);
        assert_eq!(runners[0].name, "wusa-abcdefgh");
        assert_eq!(runners[1].name, "wusa-zyxwvuts");

        let found = registry.find("wusa-zyxwvuts").unwrap().unwrap();
        assert_eq!(found.repo, "octo/other");
        assert!(registry.find("wusa-zyxwvut").unwrap().is_none());
        assert!(matches!(
            registry.get("missing"),
            Err(Error::InvalidRunnerName(ref name)) if name == "missing"
        ));
    }

    #[test]
    fn test_save_load_is_stable() {
        let (_dir, registry) = registry();
        registry
            .save(&[
                Runner::new("wusa-abcdefgh", "octo/repo", ["x", "gpu", "a"]),
                Runner::new("wusa-qwertyui", "octo/repo", Vec::<String>::new()),
            ])
            .unwrap();
        let before = fs::read(registry.path()).unwrap();

        let runners = registry.load().unwrap();
        registry.save(&runners).unwrap();

        assert_eq!(fs::read(registry.path()).unwrap(), before);
    }

    #[test]
    fn test_remove_only_runner() {
        let (_dir, registry) = registry();
        registry
            .append(Runner::new("wusa-abcdefgh", "octo/repo", ["a"]))
            .unwrap();

        let removed = registry.remove("wusa-abcdefgh").unwrap();
        assert_eq!(removed.repo, "octo/repo");
        assert!(registry.load().unwrap().is_empty());
    }

    #[test]
    fn test_remove_missing_runner_leaves_file_untouched() {
        let (_dir, registry) = registry();
        registry
            .append(Runner::new("wusa-abcdefgh", "octo/repo", ["a"]))
            .unwrap();
        let before = fs::read(registry.path()).unwrap();

        assert!(matches!(
            registry.remove("wusa-missing1"),
            Err(Error::InvalidRunnerName(_))
        ));
        assert_eq!(fs::read(registry.path()).unwrap(), before);
    }

    #[test]
    fn test_save_leaves_no_temporary_file() {
        let (dir, registry) = registry();
        registry.save(&[]).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
