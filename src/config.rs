//! Runner configuration layered from defaults, a TOML file, `RELBIN_*`
//! environment variables and command-line overrides.

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactStrategy;
use crate::error::ConfigError;

/// Configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "relbin.toml";
/// Prefix of environment variables that configure the runner.
pub const ENV_PREFIX: &str = "RELBIN_";
/// Toolchain used when nothing else is configured.
pub const DEFAULT_TOOLCHAIN: &str = "cargo";

/// Settings for a single build run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Toolchain program, resolved on the snapshot's `PATH`.
    pub toolchain: String,
    /// How the built executable is located.
    pub strategy: ArtifactStrategy,
    /// Destination file name in the working directory. Defaults to the
    /// project's executable name.
    pub dest: Option<String>,
    /// Link the C runtime statically via `RUSTFLAGS`.
    pub static_crt: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            toolchain: DEFAULT_TOOLCHAIN.to_owned(),
            strategy: ArtifactStrategy::default(),
            dest: None,
            static_crt: false,
        }
    }
}

/// Values supplied on the command line. Unset fields leave lower layers
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CliOverrides {
    /// Toolchain program override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<String>,
    /// Strategy override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ArtifactStrategy>,
    /// Destination override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    /// Static CRT override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_crt: Option<bool>,
}

impl RunnerConfig {
    /// Load the layered configuration for `cwd`.
    ///
    /// `file` names an explicit configuration file that must exist; without
    /// it `relbin.toml` in `cwd` is read when present.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when an explicit file is missing or a layer
    /// holds invalid values.
    pub fn load(
        cwd: &Path,
        file: Option<&Path>,
        overrides: &CliOverrides,
    ) -> Result<Self, ConfigError> {
        let config_path = match file {
            Some(requested) => {
                let resolved = cwd.join(requested);
                if !resolved.is_file() {
                    return Err(ConfigError::MissingFile(resolved));
                }
                resolved
            }
            None => cwd.join(CONFIG_FILE),
        };
        Self::figment(&config_path, overrides)
            .extract()
            .map_err(|err| ConfigError::from(Box::new(err)))
    }

    fn figment(file: &Path, overrides: &CliOverrides) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides.clone()))
    }
}
