//! Library crate behind the `relbin` tool.
//!
//! `relbin` cleans a Cargo project, builds it in release mode, copies the
//! produced executable into the project directory and cleans again, leaving
//! only the executable behind. Every toolchain call receives an explicit
//! [`Environment`] snapshot and the first failing step ends the run.
pub mod artifact;
pub mod config;
pub mod env;
pub mod error;
pub mod executor;
pub mod extract;
pub mod logging;
pub mod manifest;
pub mod runner;
pub mod sequence;
pub mod step;

pub use artifact::{ArtifactLocator, ArtifactSource, ArtifactStrategy};
pub use config::{CliOverrides, RunnerConfig};
pub use env::Environment;
pub use error::{ConfigError, ManifestError, RunError};
pub use executor::{Executor, SystemExecutor};
pub use logging::init as init_logging;
pub use runner::BuildRunner;
pub use sequence::CommandSequence;
pub use step::{Invocation, Step};
