//! Version catalog errors
//!
//! Every I/O failure records the path and whether it happened while reading
//! or writing. Missing permissions and a full disk get their own variants
//! since the user can act on them.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Direction of a failed file operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => write!(f, "read"),
            Access::Write => write!(f, "write"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cannot read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No permission to {access} '{path}'")]
    PermissionDenied {
        access: Access,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Ran out of disk space writing '{path}'")]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The finished temp file could not take the catalog's place
    #[error("Could not move '{from}' over '{to}': {source}")]
    Replace {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Catalog could not be parsed; the original was copied aside
    #[error("Version catalog at '{path}' is corrupted: {details}. A backup has been created at '{backup_path}'.")]
    CorruptCatalog {
        path: PathBuf,
        backup_path: PathBuf,
        details: String,
    },

    #[error("Failed to encode version catalog: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StorageError {
    /// A failure while reading `path`
    pub fn read(path: &Path, source: io::Error) -> Self {
        Self::classify(Access::Read, path, source)
    }

    /// A failure while creating or writing `path`
    pub fn write(path: &Path, source: io::Error) -> Self {
        Self::classify(Access::Write, path, source)
    }

    fn classify(access: Access, path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        if source.kind() == io::ErrorKind::PermissionDenied {
            return StorageError::PermissionDenied {
                access,
                path,
                source,
            };
        }
        match access {
            Access::Write if is_out_of_space(&source) => StorageError::DiskFull { path, source },
            Access::Write => StorageError::Write { path, source },
            Access::Read => StorageError::Read { path, source },
        }
    }

    /// What the user can do about it, if anything
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => Some("Free up disk space and save again."),
            StorageError::PermissionDenied { .. } => {
                Some("Check permissions on the data directory, or point NEXUS_DATA_DIR somewhere writable.")
            }
            StorageError::CorruptCatalog { .. } => {
                Some("The damaged catalog was copied aside. Saved versions can be recovered from the backup by hand; new snapshots start a fresh catalog.")
            }
            _ => None,
        }
    }
}

// ENOSPC and EDQUOT; ERROR_HANDLE_DISK_FULL and ERROR_DISK_FULL on Windows
#[cfg(target_os = "macos")]
const OUT_OF_SPACE: &[i32] = &[28, 69];
#[cfg(all(unix, not(target_os = "macos")))]
const OUT_OF_SPACE: &[i32] = &[28, 122];
#[cfg(windows)]
const OUT_OF_SPACE: &[i32] = &[39, 112];
#[cfg(not(any(unix, windows)))]
const OUT_OF_SPACE: &[i32] = &[];

fn is_out_of_space(error: &io::Error) -> bool {
    error
        .raw_os_error()
        .is_some_and(|code| OUT_OF_SPACE.contains(&code))
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> PathBuf {
        PathBuf::from("/data/code_versions.json")
    }

    #[test]
    fn test_read_failure_is_not_reported_as_write() {
        let err = StorageError::read(&catalog(), io::Error::new(io::ErrorKind::Other, "bad sector"));
        assert!(matches!(err, StorageError::Read { .. }));
        assert!(err.to_string().starts_with("Cannot read"));
        assert!(err.recovery_suggestion().is_none());

        let err = StorageError::write(&catalog(), io::Error::new(io::ErrorKind::Other, "bad sector"));
        assert!(matches!(err, StorageError::Write { .. }));
    }

    #[test]
    fn test_permission_denied_keeps_direction() {
        let denied = || io::Error::new(io::ErrorKind::PermissionDenied, "access denied");

        let err = StorageError::read(&catalog(), denied());
        assert!(matches!(err, StorageError::PermissionDenied { access: Access::Read, .. }));
        assert_eq!(
            err.to_string(),
            "No permission to read '/data/code_versions.json'"
        );

        let err = StorageError::write(&catalog(), denied());
        assert!(matches!(err, StorageError::PermissionDenied { access: Access::Write, .. }));
        assert!(err.recovery_suggestion().unwrap().contains("NEXUS_DATA_DIR"));
    }

    #[cfg(unix)]
    #[test]
    fn test_enospc_while_writing_is_disk_full() {
        let err = StorageError::write(&catalog(), io::Error::from_raw_os_error(28));
        assert!(matches!(err, StorageError::DiskFull { .. }));
        assert!(err.recovery_suggestion().is_some());

        // Only writes can run out of space
        let err = StorageError::read(&catalog(), io::Error::from_raw_os_error(28));
        assert!(matches!(err, StorageError::Read { .. }));
    }

    #[test]
    fn test_corrupt_catalog_display() {
        let err = StorageError::CorruptCatalog {
            path: catalog(),
            backup_path: PathBuf::from("/data/code_versions.json.corrupt.backup"),
            details: "expected value at line 1 column 1".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("corrupted"));
        assert!(msg.contains("backup"));
        assert!(err.recovery_suggestion().is_some());
    }
}
