//! File helpers shared by the storage layer
//!
//! Writes go through a temp file and a rename so a crash never leaves a
//! half-written catalog behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::{StorageError, StorageResult};

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
pub fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| StorageError::write(parent, e))?;
        }
    }

    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path).map_err(|e| StorageError::write(&temp_path, e))?;
    file.write_all(data)
        .map_err(|e| StorageError::write(&temp_path, e))?;
    file.sync_all()
        .map_err(|e| StorageError::write(&temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|source| {
        let _ = fs::remove_file(&temp_path);
        StorageError::Replace {
            from: temp_path.clone(),
            to: path.to_path_buf(),
            source,
        }
    })?;

    Ok(())
}

/// Read a file to a string, returning `None` if it does not exist
pub fn read_optional(path: &Path) -> StorageResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::read(path, e)),
    }
}

/// Copy a damaged file aside and return the backup location
pub fn backup_corrupt(path: &Path) -> StorageResult<PathBuf> {
    let mut backup = path.as_os_str().to_owned();
    backup.push(".corrupt.backup");
    let backup_path = PathBuf::from(backup);

    let damaged = fs::read(path).map_err(|e| StorageError::read(path, e))?;
    fs::write(&backup_path, damaged).map_err(|e| StorageError::write(&backup_path, e))?;
    Ok(backup_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir
            .path()
            .join("a")
            .join("b")
            .join("c")
            .join("file.json");

        atomic_write(&nested_path, b"[]").unwrap();

        assert!(nested_path.exists());
        assert_eq!(fs::read_to_string(&nested_path).unwrap(), "[]");
        assert!(!nested_path.with_extension("tmp").exists());
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("file.json");

        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_read_optional_missing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");
        assert!(read_optional(&path).unwrap().is_none());
    }

    #[test]
    fn test_backup_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("code_versions.json");
        fs::write(&path, "{not json").unwrap();

        let backup = backup_corrupt(&path).unwrap();
        assert!(backup.ends_with("code_versions.json.corrupt.backup"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "{not json");
    }

    #[test]
    fn test_backup_reports_source_and_destination_separately() {
        let temp_dir = TempDir::new().unwrap();

        // Unreadable source
        let missing = temp_dir.path().join("gone.json");
        match backup_corrupt(&missing).unwrap_err() {
            StorageError::Read { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }

        // Readable source, unwritable destination
        let path = temp_dir.path().join("code_versions.json");
        fs::write(&path, "{not json").unwrap();
        fs::create_dir(temp_dir.path().join("code_versions.json.corrupt.backup")).unwrap();
        match backup_corrupt(&path).unwrap_err() {
            StorageError::Write { path, .. } | StorageError::PermissionDenied { path, .. } => {
                assert!(path.ends_with("code_versions.json.corrupt.backup"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_optional_failure_is_a_read_error() {
        let temp_dir = TempDir::new().unwrap();
        // A directory exists but cannot be read as a file
        let err = read_optional(temp_dir.path()).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Read { .. } | StorageError::PermissionDenied { .. }
        ));
    }
}
