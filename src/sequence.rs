//! Ordered command sequence with short-circuit execution.

use log::info;

use crate::artifact::ArtifactStrategy;
use crate::step::Step;

/// The ordered list of steps a run performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSequence {
    steps: Vec<Step>,
}

impl CommandSequence {
    /// Build the sequence for an artifact strategy.
    ///
    /// Every sequence starts and ends with a clean so only the extracted
    /// executable survives a successful run.
    #[must_use]
    pub fn for_strategy(strategy: ArtifactStrategy) -> Self {
        let compile = match strategy {
            ArtifactStrategy::TargetDir | ArtifactStrategy::Auto => Step::Build,
            ArtifactStrategy::Installed => Step::Install,
        };
        Self {
            steps: vec![Step::Clean, compile, Step::Extract, Step::Clean],
        }
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Execute `run_step` for every step in order, stopping at the first
    /// error. Steps after a failure never run.
    ///
    /// # Errors
    /// Returns the first error produced by `run_step`.
    pub fn run<E, F>(&self, mut run_step: F) -> Result<(), E>
    where
        F: FnMut(Step) -> Result<(), E>,
    {
        let total = self.steps.len();
        self.steps
            .iter()
            .copied()
            .enumerate()
            .try_for_each(|(index, step)| {
                info!("[{}/{total}] {step}", index + 1);
                run_step(step)
            })
    }
}
