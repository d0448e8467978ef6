//! Utility helpers for tests.
//!
//! [`FakeToolchain`] stands in for `cargo` so the build runner can be
//! exercised end to end without compiling anything.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relbin::{Environment, RunnerConfig};
use tempfile::TempDir;

/// Exit code the fake toolchain uses for failures, matching Cargo.
pub const FAKE_FAILURE_CODE: i32 = 101;

const SCRIPT: &str = r#"#!/bin/sh
printf 'RUSTFLAGS=%s %s\n' "$RUSTFLAGS" "$*" >> "$FAKE_CARGO_LOG"
if [ "$FAKE_CARGO_FAIL" = "$1" ]; then
    echo "fake cargo: $1 failed" >&2
    exit 101
fi
if [ ! -f Cargo.toml ]; then
    echo "error: could not find Cargo.toml in $(pwd)" >&2
    exit 101
fi
target="${CARGO_TARGET_DIR:-target}"
artifact='#!/bin/sh
echo "__NAME__ says hello"
'
case "$1" in
    clean)
        rm -rf "$target"
        ;;
    build)
        mkdir -p "$target/release"
        printf '%s' "$artifact" > "$target/release/__NAME__"
        chmod 755 "$target/release/__NAME__"
        ;;
    install)
        mkdir -p "$target/release" "$FAKE_INSTALL_ROOT"
        printf '%s' "$artifact" > "$FAKE_INSTALL_ROOT/__NAME__"
        chmod 755 "$FAKE_INSTALL_ROOT/__NAME__"
        ;;
    *)
        echo "fake cargo: unsupported command $1" >&2
        exit 2
        ;;
esac
"#;

/// A scratch project plus a shell script that mimics the Cargo commands the
/// runner issues.
///
/// Layout under a private temporary root:
/// `project/` (the working directory), `toolchain/cargo`, `installed/` (the
/// install destination, placed on `PATH`) and `calls.log`.
#[derive(Debug)]
pub struct FakeToolchain {
    root: TempDir,
    name: String,
}

impl FakeToolchain {
    /// Create a project whose manifest declares package `name`.
    ///
    /// # Errors
    /// Returns an error if the scratch directories cannot be written.
    pub fn new(name: &str) -> Result<Self> {
        let fake = Self::bare(name)?;
        fs::write(
            fake.project_dir().join("Cargo.toml"),
            format!("[package]\nname = \"{name}\"\nversion = \"0.1.0\"\n"),
        )
        .context("write fake manifest")?;
        Ok(fake)
    }

    /// Create the fixture with an empty project directory.
    ///
    /// # Errors
    /// Returns an error if the scratch directories cannot be written.
    pub fn without_project(name: &str) -> Result<Self> {
        Self::bare(name)
    }

    fn bare(name: &str) -> Result<Self> {
        let root = TempDir::new().context("create fake toolchain root")?;
        let fake = Self {
            root,
            name: name.to_owned(),
        };
        fs::create_dir_all(fake.project_dir()).context("create project dir")?;
        fs::create_dir_all(fake.install_root()).context("create install root")?;
        let script_dir = fake.script().parent().map(Path::to_path_buf);
        fs::create_dir_all(script_dir.context("script has a parent")?)
            .context("create toolchain dir")?;
        fs::write(fake.script(), SCRIPT.replace("__NAME__", name)).context("write script")?;
        make_executable(&fake.script())?;
        fs::write(fake.log_path(), "").context("create call log")?;
        Ok(fake)
    }

    /// The project's executable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Working directory the runner builds in.
    pub fn project_dir(&self) -> PathBuf {
        self.root.path().join("project")
    }

    /// Path to the fake `cargo` script.
    pub fn script(&self) -> PathBuf {
        self.root.path().join("toolchain").join("cargo")
    }

    /// Directory `install` writes to.
    pub fn install_root(&self) -> PathBuf {
        self.root.path().join("installed")
    }

    fn log_path(&self) -> PathBuf {
        self.root.path().join("calls.log")
    }

    /// Environment snapshot wiring the script to this fixture. The install
    /// root and the system binary directories form `PATH`.
    pub fn env(&self) -> Environment {
        let mut path = OsString::from(self.install_root());
        path.push(":/usr/bin:/bin");
        Environment::from_pairs([
            (OsString::from("PATH"), path),
            (OsString::from("FAKE_CARGO_LOG"), self.log_path().into()),
            (
                OsString::from("FAKE_INSTALL_ROOT"),
                self.install_root().into(),
            ),
        ])
    }

    /// Environment that makes the step whose first argument is `command`
    /// fail.
    pub fn env_failing(&self, command: &str) -> Environment {
        let mut env = self.env();
        env.set("FAKE_CARGO_FAIL", command);
        env
    }

    /// Runner configuration that invokes the fake script.
    pub fn config(&self) -> RunnerConfig {
        RunnerConfig {
            toolchain: self.script().to_string_lossy().into_owned(),
            ..RunnerConfig::default()
        }
    }

    /// Every toolchain call made so far, as `RUSTFLAGS=<flags> <args>`.
    ///
    /// # Errors
    /// Returns an error if the call log cannot be read.
    pub fn calls(&self) -> Result<Vec<String>> {
        let log = fs::read_to_string(self.log_path()).context("read call log")?;
        Ok(log.lines().map(str::to_owned).collect())
    }

    /// File names currently present in the project directory, sorted.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be listed.
    pub fn project_entries(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(self.project_dir())
            .context("list project dir")?
            .map(|entry| -> Result<String> {
                Ok(entry?.file_name().to_string_lossy().into_owned())
            })
            .collect::<Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).context("chmod fake toolchain")
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
