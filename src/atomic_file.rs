//! Atomic file replacement module
//!
//! This module provides RAII-based temporary file handling: content is written
//! to a uniquely named sibling file which is then renamed over the target. A
//! temporary file that never reaches its destination is removed on drop.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Guard for a temporary file that is deleted on drop unless persisted
#[derive(Debug)]
pub(crate) enum TempGuard {
    /// Temporary file that will be deleted when dropped
    File(PathBuf),
    /// The file was renamed to its destination; nothing left to clean up
    Persisted,
}

impl TempGuard {
    /// Get the path to the temporary file, if it still exists
    pub(crate) fn path(&self) -> Option<&Path> {
        match self {
            TempGuard::File(path) => Some(path),
            TempGuard::Persisted => None,
        }
    }

    /// Moves the temporary file to `destination`, replacing any file there
    pub(crate) fn persist(mut self, destination: &Path) -> io::Result<()> {
        if let TempGuard::File(path) = &self {
            fs::rename(path, destination)?;
        }
        // Replacing the variant runs drop on a path that no longer exists
        self.disarm();
        Ok(())
    }

    fn disarm(&mut self) {
        *self = TempGuard::Persisted;
    }
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        if let TempGuard::File(path) = self {
            // Silently ignore errors during cleanup
            let _ = fs::remove_file(path);
        }
    }
}

/// Creates an empty temporary file inside `dir` and returns its guard
///
/// The file name is hidden, starts with `prefix` and contains a ULID, so
/// concurrent writers never collide.
pub(crate) fn create_temp_file_in(dir: &Path, prefix: &str, extension: &str) -> io::Result<TempGuard> {
    let ulid = ulid::Ulid::new();
    let path = dir.join(format!(".{}_{}.{}", prefix, ulid, extension));

    OpenOptions::new().write(true).create_new(true).open(&path)?;

    Ok(TempGuard::File(path))
}

/// Writes `contents` to `path` so that readers see either the old or the new
/// file, never a truncated one
pub(crate) fn write_atomically(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("write");

    let temp = create_temp_file_in(dir, prefix, "tmp")?;
    if let Some(temp_path) = temp.path() {
        let mut file = OpenOptions::new().write(true).truncate(true).open(temp_path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
    }

    temp.persist(path)
}
