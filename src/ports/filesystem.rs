//! Filesystem port for metadata files and the download cache.

use std::path::Path;

use super::PortResult;

/// Local storage for exports, reports and cached downloads.
pub trait FileSystem: Send + Sync {
    /// Contents of the UTF-8 file at `path`.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing, unreadable or not UTF-8.
    fn read_to_string(&self, path: &Path) -> PortResult<String>;

    /// Replaces the file at `path` with `contents`, creating missing parent
    /// directories.
    ///
    /// # Errors
    ///
    /// Fails when a directory cannot be created or the file cannot be written.
    fn write(&self, path: &Path, contents: &str) -> PortResult<()>;

    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Sorted names of the regular files directly inside `dir`.
    ///
    /// # Errors
    ///
    /// Fails when `dir` is missing or cannot be listed.
    fn list_dir(&self, dir: &Path) -> PortResult<Vec<String>>;
}
