//! Project files
//!
//! Lists editable files under a project root, loads them with path
//! confinement, and exports documents back to disk.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::document::Document;
use crate::language::Language;
use crate::storage::{atomic_write, StorageError};

/// Directories never descended into when listing
const SKIPPED_DIRS: &[&str] = &["node_modules", ".next", ".git", "dist", "build", "target"];

/// Extensions considered editable
const CODE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "html", "css", "scss", "json", "py", "java", "cpp", "c", "php",
    "rb", "go", "rs", "md", "txt",
];

/// Errors from project file operations
#[derive(Error, Debug)]
pub enum FileError {
    #[error("File path is required")]
    EmptyPath,

    #[error("Access denied: '{path}' is outside the project root")]
    AccessDenied { path: PathBuf },

    #[error("File not found: '{path}'")]
    NotFound { path: PathBuf },

    #[error("Not a regular file: '{path}'")]
    NotAFile { path: PathBuf },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl FileError {
    fn io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => FileError::NotFound {
                path: path.to_path_buf(),
            },
            _ => FileError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

/// A listed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    /// Path relative to the project root
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// A file read from the project, ready to become the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub content: String,
    pub file_name: String,
    /// Path relative to the project root
    pub path: PathBuf,
    pub language: Language,
}

impl LoadedFile {
    pub fn into_document(self) -> Document {
        Document {
            content: self.content,
            language: self.language,
            file_name: self.file_name,
        }
    }
}

/// A project directory
#[derive(Debug, Clone)]
pub struct ProjectFiles {
    root: PathBuf,
}

impl ProjectFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Recursively list editable files, sorted by relative path
    pub fn list(&self) -> Result<Vec<FileEntry>, FileError> {
        let mut entries = Vec::new();
        self.walk(&self.root, &mut entries)?;
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(root = %self.root.display(), count = entries.len(), "listed project files");
        Ok(entries)
    }

    fn walk(&self, dir: &Path, out: &mut Vec<FileEntry>) -> Result<(), FileError> {
        let read_dir = fs::read_dir(dir).map_err(|e| FileError::io(dir, e))?;

        for item in read_dir {
            let item = item.map_err(|e| FileError::io(dir, e))?;
            let path = item.path();
            // symlink_metadata so linked directories are not followed
            let meta = fs::symlink_metadata(&path).map_err(|e| FileError::io(&path, e))?;
            let name = item.file_name().to_string_lossy().into_owned();

            if meta.is_dir() {
                if !SKIPPED_DIRS.contains(&name.as_str()) {
                    self.walk(&path, out)?;
                }
            } else if meta.is_file() && has_code_extension(&path) {
                let relative = path.strip_prefix(&self.root).unwrap_or(&path).to_path_buf();
                out.push(FileEntry {
                    name,
                    path: relative,
                    size: meta.len(),
                    modified: meta.modified().ok().map(DateTime::<Utc>::from),
                });
            }
        }
        Ok(())
    }

    /// Load a file given its path relative to the root
    ///
    /// Paths that resolve outside the root, through `..` or symlinks, are
    /// rejected.
    pub fn load(&self, relative: impl AsRef<Path>) -> Result<LoadedFile, FileError> {
        let relative = relative.as_ref();
        if relative.as_os_str().is_empty() {
            return Err(FileError::EmptyPath);
        }

        let root = self
            .root
            .canonicalize()
            .map_err(|e| FileError::io(&self.root, e))?;

        let joined = normalize(&root.join(relative));
        if !joined.starts_with(&root) {
            return Err(FileError::AccessDenied {
                path: relative.to_path_buf(),
            });
        }

        let resolved = joined.canonicalize().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FileError::NotFound {
                path: relative.to_path_buf(),
            },
            _ => FileError::io(relative, e),
        })?;
        if !resolved.starts_with(&root) {
            return Err(FileError::AccessDenied {
                path: relative.to_path_buf(),
            });
        }
        if !resolved.is_file() {
            return Err(FileError::NotAFile {
                path: relative.to_path_buf(),
            });
        }

        let content = fs::read_to_string(&resolved).map_err(|e| FileError::io(relative, e))?;
        let file_name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let language = Language::from_file_name(&file_name);

        debug!(path = %relative.display(), %language, "loaded file");
        Ok(LoadedFile {
            content,
            file_name,
            path: resolved.strip_prefix(&root).unwrap_or(&resolved).to_path_buf(),
            language,
        })
    }
}

/// Write a document to `dir/<file name>` and return the written path
///
/// Only the final component of the document's file name is used.
pub fn export(document: &Document, dir: &Path) -> Result<PathBuf, FileError> {
    let name = Path::new(&document.file_name)
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| crate::document::UNTITLED_FILE_NAME.into());
    let target = dir.join(name);

    atomic_write(&target, document.content.as_bytes())?;
    debug!(path = %target.display(), mime = document.language.mime_type(), "exported document");
    Ok(target)
}

fn has_code_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| CODE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Resolve `.` and `..` lexically
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
