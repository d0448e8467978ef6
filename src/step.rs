//! Discrete steps of a build run and the toolchain invocations they map to.

use std::ffi::{OsStr, OsString};
use std::fmt;

/// One stage of the build pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Remove build artifacts (`cargo clean`).
    Clean,
    /// Compile in release mode (`cargo build --release`).
    Build,
    /// Install the project binary (`cargo install --path . --force`).
    Install,
    /// Locate the produced executable and copy it into the working directory.
    Extract,
}

impl Step {
    /// Arguments passed to the toolchain, or `None` for steps handled
    /// in-process.
    #[must_use]
    pub const fn toolchain_args(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Clean => Some(&["clean"]),
            Self::Build => Some(&["build", "--release"]),
            Self::Install => Some(&["install", "--path", ".", "--force"]),
            Self::Extract => None,
        }
    }

    /// Render the toolchain invocation for this step.
    #[must_use]
    pub fn invocation(self, toolchain: &OsStr) -> Option<Invocation> {
        self.toolchain_args()
            .map(|args| Invocation::new(toolchain, args.iter().copied()))
    }

    /// Whether the step compiles the project and therefore takes compiler
    /// flags from the environment.
    #[must_use]
    pub const fn compiles(self) -> bool {
        matches!(self, Self::Build | Self::Install)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Clean => "clean",
            Self::Build => "build",
            Self::Install => "install",
            Self::Extract => "extract",
        };
        f.write_str(label)
    }
}

/// A program and its arguments, ready to be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
}

impl Invocation {
    /// Create an invocation of `program` with `args`.
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: AsRef<OsStr>,
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        Self {
            program: program.as_ref().to_os_string(),
            args: args.into_iter().map(|a| a.as_ref().to_os_string()).collect(),
        }
    }

    /// The program to run.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Arguments in order.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
