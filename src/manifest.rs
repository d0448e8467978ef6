//! Reads the executable name from a project's `Cargo.toml`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ManifestError;

/// File name of the project manifest.
pub const MANIFEST_FILE: &str = "Cargo.toml";

#[derive(Debug, Deserialize)]
struct Manifest {
    package: Option<Package>,
    #[serde(default)]
    bin: Vec<BinTarget>,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BinTarget {
    name: Option<String>,
}

/// Name of the executable `project_dir` builds: the first named `[[bin]]`
/// target, else the package name.
///
/// # Errors
/// Returns [`ManifestError`] when the manifest is missing, malformed, or
/// names nothing.
pub fn executable_name(project_dir: &Path) -> Result<String, ManifestError> {
    let path = project_dir.join(MANIFEST_FILE);
    let raw = fs::read_to_string(&path).map_err(|source| ManifestError::Read {
        path: path.clone(),
        source,
    })?;
    let manifest: Manifest = toml::from_str(&raw).map_err(|source| ManifestError::Parse {
        path: path.clone(),
        source,
    })?;

    manifest
        .bin
        .into_iter()
        .find_map(|bin| bin.name)
        .or_else(|| manifest.package.and_then(|package| package.name))
        .ok_or(ManifestError::MissingName { path })
}
