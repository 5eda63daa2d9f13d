//! File system utilities for bundling.
//!
//! Every stage recreates its output from scratch, so removal of stale paths
//! tolerates absence, and directory copies keep symlinks as symlinks.

use crate::error::{ErrorExt, ReleaseError, Result};
use std::fs;
use std::io;
use std::path::Path;

/// Removes a file, symlink or directory tree if it exists.
pub fn remove_path(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).fs_context("inspecting stale output", path),
    };

    log::debug!("Removing stale output {}", path.display());
    if metadata.is_dir() {
        fs::remove_dir_all(path).fs_context("removing stale directory", path)
    } else {
        fs::remove_file(path).fs_context("removing stale file", path)
    }
}

/// Creates all of the directories of the specified path.
pub fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).fs_context("creating directory", path)
}

/// Writes `contents` and marks the file executable.
pub fn write_executable(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).fs_context("writing executable", path)?;
    set_executable(path)
}

/// Sets mode 0755 on Unix; a no-op elsewhere.
pub fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .fs_context("setting executable permissions", path)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Makes a symbolic link.
pub fn symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).fs_context("creating symlink", link)
    }
    #[cfg(not(unix))]
    {
        let _ = target;
        Err(ReleaseError::PrerequisiteMissing {
            missing: vec![format!("symlink support for {}", link.display())],
        })
    }
}

/// Recursively copies a directory from one path to another, creating any
/// parent directories of the destination path as necessary.
///
/// Preserves symlinks. Fails if the source path is not a directory.
pub fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(ReleaseError::invalid_config(format!(
            "{} is not a directory",
            from.display()
        )));
    }
    if let Some(parent) = to.parent() {
        create_dir_all(parent)?;
    }

    for entry in walkdir::WalkDir::new(from) {
        let entry = entry.map_err(io::Error::from)?;
        let rel_path = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| ReleaseError::invalid_config(e.to_string()))?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = fs::read_link(entry.path()).fs_context("reading symlink", entry.path())?;
            symlink(&target, &dest_path)?;
        } else if entry.file_type().is_dir() {
            create_dir_all(&dest_path)?;
        } else {
            fs::copy(entry.path(), &dest_path).fs_context("copying file", &dest_path)?;
        }
    }
    Ok(())
}
