//! Version snapshots
//!
//! A version is a user-triggered snapshot of the document. The catalog is
//! append-only and is persisted as a single JSON array, rewritten in full
//! on every save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};
use super::persistence::{atomic_write, backup_corrupt, read_optional};
use crate::language::Language;

/// A saved snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    /// Millisecond timestamp at creation, unique within a catalog
    pub id: i64,
    #[serde(alias = "code")]
    pub content: String,
    pub file_name: String,
    #[serde(default)]
    pub language: Language,
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// First line of the content, for listings
    pub fn preview(&self) -> &str {
        self.content.lines().next().unwrap_or("")
    }
}

/// Append-only catalog of versions
#[derive(Debug, Default)]
pub struct VersionStore {
    path: Option<PathBuf>,
    versions: Vec<Version>,
}

impl VersionStore {
    /// Open the catalog at `path`
    ///
    /// A missing or blank file yields an empty catalog. A file that cannot
    /// be parsed is copied aside and reported as corrupt.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        let versions = match read_optional(&path)? {
            None => Vec::new(),
            Some(content) if content.trim().is_empty() => Vec::new(),
            Some(content) => match serde_json::from_str::<Vec<Version>>(&content) {
                Ok(versions) => versions,
                Err(e) => {
                    let backup_path = backup_corrupt(&path)?;
                    warn!(path = %path.display(), error = %e, "version catalog is corrupted");
                    return Err(StorageError::CorruptCatalog {
                        path,
                        backup_path,
                        details: e.to_string(),
                    });
                }
            },
        };

        debug!(path = %path.display(), count = versions.len(), "opened version catalog");
        Ok(Self {
            path: Some(path),
            versions,
        })
    }

    /// Open the catalog, falling back to an in-memory one on any error
    pub fn open_or_in_memory(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(&path) {
            Ok(store) => store,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "using in-memory version catalog");
                Self::in_memory()
            }
        }
    }

    /// A catalog that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Snapshot the given content and persist the catalog
    ///
    /// If persisting fails, the new version is dropped again and the
    /// catalog is left as it was.
    pub fn save(
        &mut self,
        content: impl Into<String>,
        file_name: impl Into<String>,
        language: Language,
    ) -> StorageResult<&Version> {
        let now = Utc::now();
        let id = match self.versions.last() {
            Some(last) if last.id >= now.timestamp_millis() => last.id + 1,
            _ => now.timestamp_millis(),
        };

        self.versions.push(Version {
            id,
            content: content.into(),
            file_name: file_name.into(),
            language,
            created_at: now,
        });

        if let Err(e) = self.persist() {
            self.versions.pop();
            return Err(e);
        }

        debug!(id, "saved version");
        let index = self.versions.len() - 1;
        Ok(&self.versions[index])
    }

    fn persist(&self) -> StorageResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(&self.versions)?;
        atomic_write(path, &json)
    }

    pub fn get(&self, id: i64) -> Option<&Version> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Versions in creation order
    pub fn list(&self) -> &[Version] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Backing file, `None` for an in-memory catalog
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
