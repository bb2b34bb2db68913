//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use nexus_core::{Document, FileEntry, Participant, PresenceRegistry, Version};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print the document with line numbers
    pub fn print_document(&self, document: &Document) {
        match self.format {
            OutputFormat::Human => {
                println!("── {} ({}) ──", document.file_name, document.language);
                if document.content.is_empty() {
                    println!("(empty)");
                    return;
                }
                let width = document.line_count().to_string().len();
                for (i, line) in document.content.lines().enumerate() {
                    println!("{:>width$} │ {}", i + 1, line, width = width);
                }
            }
            OutputFormat::Json => print_json(document),
            OutputFormat::Quiet => println!("{}", document.content),
        }
    }

    /// Print a single version with its content
    pub fn print_version(&self, version: &Version) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", version.id);
                println!("File:     {}", version.file_name);
                println!("Language: {}", version.language);
                println!(
                    "Saved:    {}",
                    version.created_at.format("%Y-%m-%d %H:%M:%S")
                );
                println!();
                println!("{}", version.content);
            }
            OutputFormat::Json => print_json(version),
            OutputFormat::Quiet => println!("{}", version.content),
        }
    }

    /// Print a list of versions, newest last
    pub fn print_versions(&self, versions: &[Version]) {
        match self.format {
            OutputFormat::Human => {
                if versions.is_empty() {
                    println!("No versions saved.");
                    return;
                }
                for version in versions {
                    println!(
                        "{} | {} | {} | {}",
                        version.id,
                        version.created_at.format("%Y-%m-%d %H:%M"),
                        truncate(&version.file_name, 24),
                        truncate(version.preview(), 40)
                    );
                }
                println!("\n{} version(s)", versions.len());
            }
            OutputFormat::Json => print_json(&versions),
            OutputFormat::Quiet => {
                for version in versions {
                    println!("{}", version.id);
                }
            }
        }
    }

    /// Print project files
    pub fn print_files(&self, files: &[FileEntry]) {
        match self.format {
            OutputFormat::Human => {
                if files.is_empty() {
                    println!("No code files found.");
                    return;
                }
                for file in files {
                    let modified = file
                        .modified
                        .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "{:<48} {:>8} {}",
                        truncate(&file.path.display().to_string(), 48),
                        human_size(file.size),
                        modified
                    );
                }
                println!("\n{} file(s)", files.len());
            }
            OutputFormat::Json => print_json(&files),
            OutputFormat::Quiet => {
                for file in files {
                    println!("{}", file.path.display());
                }
            }
        }
    }

    /// Print the local participant and everyone else in the session
    pub fn print_participants(&self, local: &Participant, presence: &PresenceRegistry) {
        match self.format {
            OutputFormat::Human => {
                println!("{} (you)", local.display_name);
                for participant in presence.participants() {
                    match presence.cursor(&participant.id) {
                        Some(cursor) => println!(
                            "{}  line {}, col {}",
                            participant.display_name, cursor.line, cursor.column
                        ),
                        None => println!("{}", participant.display_name),
                    }
                }
            }
            OutputFormat::Json => {
                let others: Vec<_> = presence
                    .participants()
                    .into_iter()
                    .map(|p| {
                        serde_json::json!({
                            "id": p.id,
                            "name": p.display_name,
                            "cursor": presence.cursor(&p.id),
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({"local": local, "participants": others})
                );
            }
            OutputFormat::Quiet => {
                for participant in presence.participants() {
                    println!("{}", participant.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a problem that does not end the command
    pub fn warning(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("⚠ {}", msg),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "warning", "message": msg})
                );
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

/// Truncate a string to max length in characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ééééééééééé", 5), "éé...");
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(12), "12 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
