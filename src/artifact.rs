//! Locating the executable a build produced.

use std::env::consts::EXE_SUFFIX;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::env::Environment;
use crate::error::RunError;

/// Variable Cargo reads to relocate its output directory.
pub const TARGET_DIR_VAR: &str = "CARGO_TARGET_DIR";

/// How the produced executable is found after the compile step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactStrategy {
    /// Build in release mode and take `<target>/release/<name>`.
    TargetDir,
    /// Install the project and resolve `<name>` on the search path.
    Installed,
    /// Build in release mode, try the target directory, then the search path.
    #[default]
    Auto,
}

impl ArtifactStrategy {
    /// Every strategy, in the order they are documented.
    pub const ALL: [Self; 3] = [Self::TargetDir, Self::Installed, Self::Auto];

    const fn as_str(self) -> &'static str {
        match self {
            Self::TargetDir => "target-dir",
            Self::Installed => "installed",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for ArtifactStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown artifact strategy `{0}` (expected target-dir, installed or auto)")]
pub struct UnknownStrategy(pub String);

impl FromStr for ArtifactStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| UnknownStrategy(s.to_owned()))
    }
}

/// Location a resolved executable was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    /// `<target>/release/<name>`.
    TargetDir,
    /// The `PATH` held by the environment snapshot.
    SearchPath,
}

/// Resolves artifact locations for a project directory and environment.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactLocator<'a> {
    project_dir: &'a Path,
    env: &'a Environment,
}

impl<'a> ArtifactLocator<'a> {
    /// Create a locator for `project_dir` using the variables in `env`.
    #[must_use]
    pub const fn new(project_dir: &'a Path, env: &'a Environment) -> Self {
        Self { project_dir, env }
    }

    /// Cargo's output directory: `CARGO_TARGET_DIR` when set, relative values
    /// being taken from the project directory, else `<project>/target`.
    #[must_use]
    pub fn target_dir(&self) -> PathBuf {
        self.env
            .get(TARGET_DIR_VAR)
            .filter(|dir| !dir.is_empty())
            .map_or_else(
                || self.project_dir.join("target"),
                |dir| self.project_dir.join(dir),
            )
    }

    /// Path a release build of `name` is written to.
    #[must_use]
    pub fn release_path(&self, name: &str) -> PathBuf {
        self.target_dir()
            .join("release")
            .join(format!("{name}{EXE_SUFFIX}"))
    }

    /// Resolve `name` on the `PATH` held by the environment snapshot.
    #[must_use]
    pub fn search_path(&self, name: &str) -> Option<PathBuf> {
        let paths = self.env.get("PATH")?;
        which::which_in(name, Some(paths), self.project_dir).ok()
    }

    /// Find `name` for `strategy` and report which location supplied it.
    #[must_use]
    pub fn locate(
        &self,
        strategy: ArtifactStrategy,
        name: &str,
    ) -> Option<(PathBuf, ArtifactSource)> {
        let release = self.release_path(name);
        let from_target = || {
            release
                .is_file()
                .then(|| (release.clone(), ArtifactSource::TargetDir))
        };
        let from_path = || {
            self.search_path(name)
                .map(|path| (path, ArtifactSource::SearchPath))
        };
        match strategy {
            ArtifactStrategy::TargetDir => from_target(),
            ArtifactStrategy::Installed => from_path(),
            ArtifactStrategy::Auto => from_target().or_else(from_path),
        }
    }

    /// Locate `name` according to `strategy`.
    ///
    /// # Errors
    /// Returns [`RunError::ArtifactNotFound`] listing every location tried.
    pub fn resolve(&self, strategy: ArtifactStrategy, name: &str) -> Result<PathBuf, RunError> {
        let release = self.release_path(name);
        self.locate(strategy, name).map_or_else(
            || {
                let searched = match strategy {
                    ArtifactStrategy::TargetDir => release.display().to_string(),
                    ArtifactStrategy::Installed => "PATH".to_owned(),
                    ArtifactStrategy::Auto => format!("{}, PATH", release.display()),
                };
                Err(RunError::ArtifactNotFound {
                    name: name.to_owned(),
                    searched,
                })
            },
            |(path, source)| {
                if strategy == ArtifactStrategy::Auto && source == ArtifactSource::SearchPath {
                    warn!(
                        "{} missing; extracting `{name}` from the search path at {}",
                        release.display(),
                        path.display()
                    );
                } else {
                    debug!("resolved `{name}` to {} via {strategy}", path.display());
                }
                Ok(path)
            },
        )
    }
}
