//! Suggest command handler

use std::path::Path;

use anyhow::{Context, Result};

use nexus_core::suggest::{SuggestionGateway, SuggestionKind};
use nexus_core::{Config, Language};

use crate::output::{Output, OutputFormat};

/// Build the gateway, or explain how to configure one
pub fn gateway(config: &Config) -> Result<SuggestionGateway> {
    SuggestionGateway::from_config(config)
        .context("Failed to create suggestion client")?
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Suggestion service not configured. Set it with:\n  \
                 nexus config set suggestion_url http://your-service/api/suggest"
            )
        })
}

/// Ask the suggestion service about a file
pub async fn run(config: &Config, file: &Path, kind: SuggestionKind, output: &Output) -> Result<()> {
    let gateway = gateway(config)?;

    let code = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let language = Language::from_file_name(&file_name);

    output.message(&format!("Requesting {} for {} ({})...", kind, file_name, language));
    let suggestion = gateway.request(&code, language, kind).await?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "file": file_name,
                    "language": language,
                    "kind": kind,
                    "suggestion": suggestion
                })
            );
        }
        OutputFormat::Human | OutputFormat::Quiet => println!("{}", suggestion),
    }

    Ok(())
}
