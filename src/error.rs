//! Error types surfaced by a build run.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::step::Step;

/// Exit code used when the toolchain program cannot be launched, matching
/// the shell convention for "command not found".
pub const SPAWN_FAILURE_EXIT_CODE: u8 = 127;

/// Failure of a build run. The first failing step ends the run; nothing is
/// rolled back or retried.
#[derive(Debug, Error)]
pub enum RunError {
    /// The toolchain program could not be started.
    #[error("failed to launch `{invocation}`: {source}")]
    Spawn {
        /// Rendered command line.
        invocation: String,
        /// Underlying spawn error.
        #[source]
        source: io::Error,
    },
    /// A toolchain step exited unsuccessfully.
    #[error("{step} step failed: `{invocation}` exited with {status}")]
    Process {
        /// Step that failed.
        step: Step,
        /// Rendered command line.
        invocation: String,
        /// Exit status of the child.
        status: ExitStatus,
    },
    /// The built executable could not be located.
    #[error("built executable `{name}` not found (searched {searched})")]
    ArtifactNotFound {
        /// Executable name looked up.
        name: String,
        /// Human readable list of the locations tried.
        searched: String,
    },
    /// The project manifest could not provide an executable name.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    /// The destination override is not a plain file name.
    #[error("destination `{dest}` must be a file name inside the working directory")]
    InvalidDest {
        /// Rejected destination.
        dest: String,
    },
    /// Copying the executable into the working directory failed.
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        /// Resolved artifact path.
        from: PathBuf,
        /// Destination in the working directory.
        to: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl RunError {
    /// Process exit code reported for this failure.
    ///
    /// A failing toolchain step propagates its own non-zero code. Signals and
    /// codes outside `1..=255` collapse to `1`.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Spawn { .. } => SPAWN_FAILURE_EXIT_CODE,
            Self::Process { status, .. } => status
                .code()
                .and_then(|code| u8::try_from(code).ok())
                .filter(|code| *code != 0)
                .unwrap_or(1),
            Self::ArtifactNotFound { .. }
            | Self::InvalidDest { .. }
            | Self::Manifest(_)
            | Self::Copy { .. } => 1,
        }
    }
}

/// Failure reading the executable name from `Cargo.toml`.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The manifest is not valid TOML.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        /// Manifest path.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: toml::de::Error,
    },
    /// Neither a `[[bin]]` target nor `[package].name` is declared.
    #[error("{} declares no binary or package name", path.display())]
    MissingName {
        /// Manifest path.
        path: PathBuf,
    },
}

/// Failure loading [`crate::RunnerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("configuration file {} does not exist", .0.display())]
    MissingFile(PathBuf),
    /// A configuration layer held invalid values.
    #[error(transparent)]
    Invalid(#[from] Box<figment::Error>),
}
