//! Language tags
//!
//! The editor knows a closed set of languages. Anything it does not
//! recognize is treated as plain text, both when inferring from a file
//! name and when reading a persisted tag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Canonical language tag of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Javascript,
    Typescript,
    Html,
    Css,
    Scss,
    Json,
    Python,
    Java,
    Cpp,
    C,
    Php,
    Ruby,
    Go,
    Rust,
    Markdown,
    #[default]
    #[serde(other)]
    Plaintext,
}

impl Language {
    /// All known tags, in display order
    pub const ALL: [Language; 16] = [
        Language::Javascript,
        Language::Typescript,
        Language::Html,
        Language::Css,
        Language::Scss,
        Language::Json,
        Language::Python,
        Language::Java,
        Language::Cpp,
        Language::C,
        Language::Php,
        Language::Ruby,
        Language::Go,
        Language::Rust,
        Language::Markdown,
        Language::Plaintext,
    ];

    /// Infer the language from a file name's extension.
    ///
    /// The extension is matched case-insensitively; files without a known
    /// extension are plain text.
    pub fn from_file_name(file_name: &str) -> Self {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some(ext) => Self::from_extension(ext),
            None => Language::Plaintext,
        }
    }

    fn from_extension(ext: &str) -> Self {
        match ext {
            "js" | "jsx" => Language::Javascript,
            "ts" | "tsx" => Language::Typescript,
            "html" => Language::Html,
            "css" => Language::Css,
            "scss" => Language::Scss,
            "json" => Language::Json,
            "py" => Language::Python,
            "java" => Language::Java,
            "cpp" => Language::Cpp,
            "c" => Language::C,
            "php" => Language::Php,
            "rb" => Language::Ruby,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "md" => Language::Markdown,
            _ => Language::Plaintext,
        }
    }

    /// Lenient tag lookup; unknown tags map to plain text
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or(Language::Plaintext)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Javascript => "javascript",
            Language::Typescript => "typescript",
            Language::Html => "html",
            Language::Css => "css",
            Language::Scss => "scss",
            Language::Json => "json",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Markdown => "markdown",
            Language::Plaintext => "plaintext",
        }
    }

    /// MIME type used when exporting a document of this language
    pub fn mime_type(&self) -> &'static str {
        match self {
            Language::Javascript => "text/javascript",
            Language::Typescript => "text/typescript",
            Language::Html => "text/html",
            Language::Css => "text/css",
            Language::Scss => "text/scss",
            Language::Json => "application/json",
            Language::Python => "text/x-python",
            Language::Java => "text/x-java-source",
            Language::Cpp => "text/x-c++src",
            Language::C => "text/x-csrc",
            Language::Php => "application/x-php",
            Language::Ruby => "text/x-ruby",
            Language::Go => "text/x-go",
            Language::Rust => "text/x-rust",
            Language::Markdown => "text/markdown",
            Language::Plaintext => "text/plain",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown language tag strictly
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language tag: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.as_str() == lower)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}
