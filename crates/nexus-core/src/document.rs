//! The shared text buffer
//!
//! Every participant holds its own replica of the document. Replicas
//! converge by last-writer-wins: whatever content a client observed last,
//! local or remote, is its current state.

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// File name given to a document that was not opened from disk
pub const UNTITLED_FILE_NAME: &str = "untitled.js";

/// A document replica
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full text content
    pub content: String,
    /// Language of the content
    pub language: Language,
    /// File name shown to the user and used on export
    pub file_name: String,
}

impl Document {
    /// Create a document with the language inferred from its file name
    pub fn new(file_name: impl Into<String>, content: impl Into<String>) -> Self {
        let file_name = file_name.into();
        Self {
            language: Language::from_file_name(&file_name),
            content: content.into(),
            file_name,
        }
    }

    /// Create an empty untitled JavaScript document
    pub fn untitled() -> Self {
        Self {
            content: String::new(),
            language: Language::Javascript,
            file_name: UNTITLED_FILE_NAME.to_string(),
        }
    }

    /// Replace the content; returns false when nothing changed
    pub fn set_content(&mut self, content: impl Into<String>) -> bool {
        let content = content.into();
        if content == self.content {
            return false;
        }
        self.content = content;
        true
    }

    /// Replace the whole document (file load or version restore)
    pub fn replace(&mut self, content: String, file_name: String, language: Language) {
        self.content = content;
        self.file_name = file_name;
        self.language = language;
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count().max(1)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::untitled()
    }
}
