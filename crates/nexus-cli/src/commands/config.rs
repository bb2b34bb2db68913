//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use nexus_core::Config;

use crate::output::{Output, OutputFormat};

const KEYS: &str = "data_dir, relay_url, collab_enabled, bind_addr, display_name, \
                    suggestion_url, suggestion_timeout_secs, validate_edits, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "relay_url": config.relay_url,
                    "collab_enabled": config.collab_enabled,
                    "bind_addr": config.bind_addr,
                    "display_name": config.display_name,
                    "suggestion_url": config.suggestion_url,
                    "suggestion_timeout_secs": config.suggestion_timeout_secs,
                    "validate_edits": config.validate_edits,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:                {}", config.data_dir.display());
            println!("  relay_url:               {}", or_unset(config.relay_url.as_deref()));
            println!("  collab_enabled:          {}", config.collab_enabled);
            println!("  bind_addr:               {}", config.bind_addr);
            println!("  display_name:            {}", or_unset(config.display_name.as_deref()));
            println!(
                "  suggestion_url:          {}",
                or_unset(config.suggestion_url.as_deref())
            );
            println!("  suggestion_timeout_secs: {}", config.suggestion_timeout_secs);
            println!("  validate_edits:          {}", config.validate_edits);
            println!(
                "  log_file:                {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Versions:    {}", config.versions_path().display());
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => config.data_dir = value.into(),
        "relay_url" => config.relay_url = optional(value),
        "collab_enabled" => {
            config.collab_enabled = value
                .parse()
                .context("Invalid value for collab_enabled. Use 'true' or 'false'.")?;
        }
        "bind_addr" => config.bind_addr = value.to_string(),
        "display_name" => config.display_name = optional(value),
        "suggestion_url" => config.suggestion_url = optional(value),
        "suggestion_timeout_secs" => {
            config.suggestion_timeout_secs = value
                .parse()
                .context("Invalid value for suggestion_timeout_secs. Use a number of seconds.")?;
        }
        "validate_edits" => {
            config.validate_edits = value
                .parse()
                .context("Invalid value for validate_edits. Use 'true' or 'false'.")?;
        }
        "log_file" => config.log_file = optional(value).map(PathBuf::from),
        _ => {
            bail!("Unknown configuration key: '{}'\nValid keys: {}", key, KEYS);
        }
    }
    Ok(())
}

/// Empty or "none" clears an optional value
fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

fn or_unset(value: Option<&str>) -> &str {
    value.unwrap_or("(not set)")
}
