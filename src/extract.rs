//! Copying the built executable into the working directory.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::RunError;

/// Copy `source` to `dest`, replacing any previous file.
///
/// The bytes are staged in a temporary file beside `dest` and renamed into
/// place, so a failed copy never leaves a truncated executable behind. The
/// source permissions are carried over.
///
/// # Errors
/// Returns [`RunError::Copy`] when reading, writing or renaming fails.
pub fn copy_artifact(source: &Path, dest: &Path) -> Result<(), RunError> {
    stage_and_persist(source, dest).map_err(|err| RunError::Copy {
        from: source.to_path_buf(),
        to: dest.to_path_buf(),
        source: err,
    })
}

fn stage_and_persist(source: &Path, dest: &Path) -> io::Result<()> {
    let dir = dest
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(source)?.permissions();

    let mut input = File::open(source)?;
    let mut staged = NamedTempFile::new_in(dir)?;
    io::copy(&mut input, staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    fs::set_permissions(staged.path(), permissions)?;
    staged.persist(dest).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("Failed to create temp dir")
    }

    #[rstest]
    fn copies_contents(temp_dir: TempDir) {
        let source = temp_dir.path().join("built");
        let dest = temp_dir.path().join("demo");
        fs::write(&source, b"binary").unwrap();
        copy_artifact(&source, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"binary");
        assert!(source.exists());
    }

    #[rstest]
    fn replaces_previous_artifact(temp_dir: TempDir) {
        let source = temp_dir.path().join("built");
        let dest = temp_dir.path().join("demo");
        fs::write(&dest, b"stale build with more bytes").unwrap();
        fs::write(&source, b"fresh").unwrap();
        copy_artifact(&source, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"fresh");
    }

    #[rstest]
    fn leaves_no_staging_files(temp_dir: TempDir) {
        let source_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("built");
        fs::write(&source, b"binary").unwrap();
        let dest = temp_dir.path().join("demo");
        copy_artifact(&source, &dest).unwrap();
        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("demo")]);
    }

    #[cfg(unix)]
    #[rstest]
    fn preserves_executable_bit(temp_dir: TempDir) {
        use std::os::unix::fs::PermissionsExt;

        let source = temp_dir.path().join("built");
        let dest = temp_dir.path().join("demo");
        fs::write(&source, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&source, fs::Permissions::from_mode(0o755)).unwrap();
        copy_artifact(&source, &dest).unwrap();
        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[rstest]
    fn missing_source_is_a_copy_error(temp_dir: TempDir) {
        let dest = temp_dir.path().join("demo");
        let err = copy_artifact(&temp_dir.path().join("absent"), &dest).unwrap_err();
        assert!(matches!(err, RunError::Copy { .. }));
        assert!(!dest.exists());
    }
}
