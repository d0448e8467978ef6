//! Spawning toolchain processes.

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus};

use log::debug;

use crate::env::Environment;
use crate::step::Invocation;

/// Runs a toolchain invocation to completion.
#[cfg_attr(test, mockall::automock)]
pub trait Executor {
    /// Run `invocation` in `cwd` with exactly the variables in `env` and
    /// wait for it to exit.
    ///
    /// # Errors
    /// Returns an error when the process cannot be spawned.
    fn execute(
        &self,
        invocation: &Invocation,
        cwd: &Path,
        env: &Environment,
    ) -> io::Result<ExitStatus>;
}

/// [`Executor`] backed by [`std::process::Command`]. Standard streams are
/// inherited so toolchain diagnostics reach the caller unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn execute(
        &self,
        invocation: &Invocation,
        cwd: &Path,
        env: &Environment,
    ) -> io::Result<ExitStatus> {
        debug!(
            "spawning `{invocation}` in {} with {} environment variables",
            cwd.display(),
            env.len()
        );
        Command::new(invocation.program())
            .args(invocation.args())
            .current_dir(cwd)
            .env_clear()
            .envs(env.iter())
            .status()
    }
}
