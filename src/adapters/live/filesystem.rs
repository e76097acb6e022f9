//! Disk-backed filesystem adapter.

use std::path::Path;

use crate::ports::filesystem::FileSystem;
use crate::ports::PortResult;

/// Filesystem adapter over `std::fs`.
pub struct DiskFileSystem;

impl FileSystem for DiskFileSystem {
    fn read_to_string(&self, path: &Path) -> PortResult<String> {
        std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()).into())
    }

    fn write(&self, path: &Path, contents: &str) -> PortResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents).map_err(|e| format!("{}: {e}", path.display()).into())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list_dir(&self, path: &Path) -> PortResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_creates_parents_and_list_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let fs = DiskFileSystem;
        fs.write(&dir.path().join("nested/b.json"), "{}").unwrap();
        fs.write(&dir.path().join("a.json"), "[]").unwrap();

        assert_eq!(fs.list_dir(dir.path()).unwrap(), vec!["a.json"]);
        assert_eq!(fs.read_to_string(&dir.path().join("nested/b.json")).unwrap(), "{}");
        assert!(fs.exists(&dir.path().join("nested")));
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = DiskFileSystem.read_to_string(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
