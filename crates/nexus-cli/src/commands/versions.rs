//! Version command handlers

use anyhow::{Context, Result};

use nexus_core::storage::VersionStore;
use nexus_core::Config;

use crate::output::Output;

fn open(config: &Config) -> Result<VersionStore> {
    VersionStore::open(config.versions_path()).context("Failed to open version catalog")
}

/// List saved versions
pub fn list(config: &Config, output: &Output) -> Result<()> {
    let store = open(config)?;
    output.print_versions(store.list());
    Ok(())
}

/// Show one version in full
pub fn show(config: &Config, id: i64, output: &Output) -> Result<()> {
    let store = open(config)?;
    let version = store
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Version not found: {}", id))?;

    output.print_version(version);
    Ok(())
}
