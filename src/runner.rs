//! The build runner: clean, compile, extract, clean.

use std::env::consts::EXE_SUFFIX;
use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path, PathBuf};

use log::{debug, info};

use crate::artifact::ArtifactLocator;
use crate::config::RunnerConfig;
use crate::env::Environment;
use crate::error::RunError;
use crate::executor::{Executor, SystemExecutor};
use crate::extract::copy_artifact;
use crate::manifest::executable_name;
use crate::sequence::CommandSequence;
use crate::step::{Invocation, Step};

/// Compiler flags appended to `RUSTFLAGS` when a static C runtime is
/// requested.
pub const STATIC_CRT_FLAGS: &str = "-C target-feature=+crt-static";

/// Builds the project in a working directory and extracts its executable.
///
/// # Examples
/// ```rust,no_run
/// use relbin::{BuildRunner, RunnerConfig};
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     BuildRunner::from_current_dir(RunnerConfig::default())?.run()?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BuildRunner {
    config: RunnerConfig,
    project_dir: PathBuf,
    env: Environment,
}

impl BuildRunner {
    /// Create a runner for `project_dir` whose children receive `env`.
    #[must_use]
    pub fn new(config: RunnerConfig, project_dir: impl Into<PathBuf>, env: Environment) -> Self {
        Self {
            config,
            project_dir: project_dir.into(),
            env,
        }
    }

    /// Create a runner for the current directory and environment.
    ///
    /// # Errors
    /// Returns an error if the current directory cannot be determined.
    pub fn from_current_dir(config: RunnerConfig) -> io::Result<Self> {
        Ok(Self::new(
            config,
            std::env::current_dir()?,
            Environment::capture(),
        ))
    }

    /// The configuration this runner uses.
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Directory the runner builds in.
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// The steps [`Self::run`] would execute.
    #[must_use]
    pub fn plan(&self) -> CommandSequence {
        CommandSequence::for_strategy(self.config.strategy)
    }

    /// Describe each planned step as a command line.
    #[must_use]
    pub fn describe_plan(&self) -> Vec<String> {
        self.plan()
            .steps()
            .iter()
            .map(|step| {
                step.invocation(self.toolchain()).map_or_else(
                    || {
                        format!(
                            "copy {} artifact into {}",
                            self.config.strategy,
                            self.project_dir.display()
                        )
                    },
                    |invocation| invocation.to_string(),
                )
            })
            .collect()
    }

    /// Run the full sequence with real processes.
    ///
    /// # Errors
    /// Returns the first failure. Earlier steps are not undone.
    pub fn run(&self) -> Result<(), RunError> {
        self.run_with(&SystemExecutor)
    }

    /// Run the full sequence through `executor`.
    ///
    /// A `dest` override that is not a plain file name is rejected before
    /// any step runs.
    ///
    /// # Errors
    /// Returns the first failure. Earlier steps are not undone.
    pub fn run_with(&self, executor: &dyn Executor) -> Result<(), RunError> {
        if let Some(dest) = &self.config.dest {
            check_dest(dest)?;
        }
        self.plan().run(|step| {
            step.invocation(self.toolchain()).map_or_else(
                || {
                    self.extract().map(|dest| {
                        info!("extracted executable to {}", dest.display());
                    })
                },
                |invocation| self.invoke(executor, step, &invocation),
            )
        })
    }

    fn toolchain(&self) -> &OsStr {
        OsStr::new(&self.config.toolchain)
    }

    fn step_env(&self, step: Step) -> Environment {
        if self.config.static_crt && step.compiles() {
            self.env.with_appended_flag("RUSTFLAGS", STATIC_CRT_FLAGS)
        } else {
            self.env.clone()
        }
    }

    fn invoke(
        &self,
        executor: &dyn Executor,
        step: Step,
        invocation: &Invocation,
    ) -> Result<(), RunError> {
        let env = self.step_env(step);
        let status = executor
            .execute(invocation, &self.project_dir, &env)
            .map_err(|source| RunError::Spawn {
                invocation: invocation.to_string(),
                source,
            })?;
        if status.success() {
            debug!("`{invocation}` finished");
            Ok(())
        } else {
            Err(RunError::Process {
                step,
                invocation: invocation.to_string(),
                status,
            })
        }
    }

    fn extract(&self) -> Result<PathBuf, RunError> {
        let name = executable_name(&self.project_dir)?;
        let source = ArtifactLocator::new(&self.project_dir, &self.env)
            .resolve(self.config.strategy, &name)?;
        let dest = self.destination(&name);
        copy_artifact(&source, &dest)?;
        Ok(dest)
    }

    fn destination(&self, name: &str) -> PathBuf {
        let file = self
            .config
            .dest
            .clone()
            .unwrap_or_else(|| format!("{name}{EXE_SUFFIX}"));
        self.project_dir.join(file)
    }
}

/// Accept only a single normal path component so the executable always lands
/// inside the project directory.
fn check_dest(dest: &str) -> Result<(), RunError> {
    let mut components = Path::new(dest).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(RunError::InvalidDest {
            dest: dest.to_owned(),
        }),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::artifact::ArtifactStrategy;
    use crate::executor::MockExecutor;
    use mockall::Sequence;
    use rstest::{fixture, rstest};
    use std::fs;
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;
    use tempfile::TempDir;

    fn exited(code: i32) -> ExitStatus {
        ExitStatus::from_raw(code << 8)
    }

    fn args_of(invocation: &Invocation) -> Vec<String> {
        invocation
            .args()
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[fixture]
    fn project() -> TempDir {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n",
        )
        .expect("write manifest");
        dir
    }

    fn runner(dir: &TempDir, config: RunnerConfig) -> BuildRunner {
        BuildRunner::new(config, dir.path(), Environment::from_pairs([("PATH", "")]))
    }

    fn write_release_build(dir: &Path) {
        let release = dir.join("target/release");
        fs::create_dir_all(&release).expect("create release dir");
        fs::write(release.join("demo"), b"built").expect("write artifact");
    }

    #[rstest]
    fn runs_steps_in_order(project: TempDir) {
        let mut executor = MockExecutor::new();
        let mut seq = Sequence::new();
        let dir = project.path().to_path_buf();
        executor
            .expect_execute()
            .withf(|inv, _, _| args_of(inv) == ["clean"])
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(exited(0)));
        executor
            .expect_execute()
            .withf(|inv, _, _| args_of(inv) == ["build", "--release"])
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _, _| {
                write_release_build(&dir);
                Ok(exited(0))
            });
        executor
            .expect_execute()
            .withf(|inv, _, _| args_of(inv) == ["clean"])
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(exited(0)));

        runner(&project, RunnerConfig::default())
            .run_with(&executor)
            .expect("run succeeds");
        assert_eq!(fs::read(project.path().join("demo")).unwrap(), b"built");
    }

    #[rstest]
    fn failing_build_stops_the_sequence(project: TempDir) {
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .withf(|inv, _, _| args_of(inv) == ["clean"])
            .times(1)
            .returning(|_, _, _| Ok(exited(0)));
        executor
            .expect_execute()
            .withf(|inv, _, _| args_of(inv) == ["build", "--release"])
            .times(1)
            .returning(|_, _, _| Ok(exited(101)));

        let err = runner(&project, RunnerConfig::default())
            .run_with(&executor)
            .unwrap_err();
        assert!(matches!(err, RunError::Process { step: Step::Build, .. }));
        assert_eq!(err.exit_code(), 101);
        assert!(!project.path().join("demo").exists());
    }

    #[rstest]
    fn spawn_failure_stops_before_any_write(project: TempDir) {
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .times(1)
            .returning(|_, _, _| Err(io::Error::from(io::ErrorKind::NotFound)));

        let err = runner(&project, RunnerConfig::default())
            .run_with(&executor)
            .unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
        let entries = fs::read_dir(project.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[rstest]
    fn missing_artifact_skips_final_clean(project: TempDir) {
        let mut executor = MockExecutor::new();
        executor
            .expect_execute()
            .times(2)
            .returning(|_, _, _| Ok(exited(0)));

        let config = RunnerConfig {
            strategy: ArtifactStrategy::TargetDir,
            ..RunnerConfig::default()
        };
        let err = runner(&project, config).run_with(&executor).unwrap_err();
        assert!(matches!(err, RunError::ArtifactNotFound { .. }));
    }

    #[rstest]
    #[case::enabled(true)]
    #[case::disabled(false)]
    fn static_crt_only_touches_compile_step(project: TempDir, #[case] static_crt: bool) {
        let mut executor = MockExecutor::new();
        let dir = project.path().to_path_buf();
        executor
            .expect_execute()
            .withf(|inv, _, env| args_of(inv) == ["clean"] && env.get("RUSTFLAGS").is_none())
            .times(2)
            .returning(|_, _, _| Ok(exited(0)));
        executor
            .expect_execute()
            .withf(move |inv, _, env| {
                let flags = env.get("RUSTFLAGS").and_then(OsStr::to_str);
                args_of(inv) == ["build", "--release"]
                    && (flags == Some(STATIC_CRT_FLAGS)) == static_crt
            })
            .times(1)
            .returning(move |_, _, _| {
                write_release_build(&dir);
                Ok(exited(0))
            });

        let config = RunnerConfig {
            static_crt,
            ..RunnerConfig::default()
        };
        runner(&project, config)
            .run_with(&executor)
            .expect("run succeeds");
    }

    #[rstest]
    fn children_run_in_project_dir_with_snapshot(project: TempDir) {
        let mut executor = MockExecutor::new();
        let dir = project.path().to_path_buf();
        let expected_dir = dir.clone();
        executor
            .expect_execute()
            .withf(move |_, cwd, env| {
                cwd == expected_dir && env.get("PATH") == Some(OsStr::new(""))
            })
            .returning(move |inv, _, _| {
                if args_of(inv) == ["build", "--release"] {
                    write_release_build(&dir);
                }
                Ok(exited(0))
            });

        runner(&project, RunnerConfig::default())
            .run_with(&executor)
            .expect("run succeeds");
    }

    #[rstest]
    fn dest_override_names_the_output(project: TempDir) {
        let mut executor = MockExecutor::new();
        let dir = project.path().to_path_buf();
        executor.expect_execute().returning(move |inv, _, _| {
            if args_of(inv) == ["build", "--release"] {
                write_release_build(&dir);
            }
            Ok(exited(0))
        });

        let config = RunnerConfig {
            dest: Some("renamed".into()),
            ..RunnerConfig::default()
        };
        runner(&project, config)
            .run_with(&executor)
            .expect("run succeeds");
        assert!(project.path().join("renamed").is_file());
        assert!(!project.path().join("demo").exists());
    }

    #[rstest]
    #[case::parent("../escaped")]
    #[case::absolute("/tmp/relbin-escaped")]
    #[case::nested("sub/demo")]
    #[case::current(".")]
    #[case::empty("")]
    fn dest_outside_project_is_rejected_before_any_step(
        project: TempDir,
        #[case] dest: &str,
    ) {
        let mut executor = MockExecutor::new();
        executor.expect_execute().times(0);

        let config = RunnerConfig {
            dest: Some(dest.into()),
            ..RunnerConfig::default()
        };
        let err = runner(&project, config).run_with(&executor).unwrap_err();
        assert!(
            matches!(err, RunError::InvalidDest { dest: ref rejected } if rejected == dest),
            "unexpected {err:?}"
        );
        assert_eq!(err.exit_code(), 1);
        assert_eq!(fs::read_dir(project.path()).unwrap().count(), 1);
    }

    #[rstest]
    fn describes_plan_without_running(project: TempDir) {
        let config = RunnerConfig {
            toolchain: "cargo".into(),
            strategy: ArtifactStrategy::Installed,
            ..RunnerConfig::default()
        };
        let plan = runner(&project, config).describe_plan();
        assert_eq!(plan.len(), 4);
        assert_eq!(plan[0], "cargo clean");
        assert_eq!(plan[1], "cargo install --path . --force");
        assert!(plan[2].starts_with("copy installed artifact"));
        assert_eq!(plan[3], "cargo clean");
    }
}
