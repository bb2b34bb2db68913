//! Files command handler

use std::path::PathBuf;

use anyhow::{Context, Result};

use nexus_core::ProjectFiles;

use crate::output::Output;

/// List code files under `root`, or the current directory
pub fn list(root: Option<PathBuf>, output: &Output) -> Result<()> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let files = ProjectFiles::new(&root)
        .list()
        .with_context(|| format!("Failed to list files in {}", root.display()))?;

    output.print_files(&files);
    Ok(())
}
