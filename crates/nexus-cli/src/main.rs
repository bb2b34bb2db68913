//! NexusHub CLI
//!
//! Command-line interface for NexusHub - collaborative code editing.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use nexus_core::suggest::SuggestionKind;
use nexus_core::Config;

mod commands;
mod output;

use commands::edit::EditOptions;
use output::{Output, OutputFormat};

const DEFAULT_SESSION: &str = "default";

#[derive(Parser)]
#[command(name = "nexus")]
#[command(about = "NexusHub - Real-time collaborative code editing")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay server
    Relay {
        /// Address to bind (defaults to bind_addr from config)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Join a session and edit interactively
    Edit {
        /// Project file to open first
        file: Option<PathBuf>,
        /// Session to join
        #[arg(short, long, default_value = DEFAULT_SESSION)]
        session: String,
        /// Name shown to other participants
        #[arg(short, long)]
        name: Option<String>,
        /// Relay URL (overrides relay_url from config)
        #[arg(long)]
        relay: Option<String>,
    },
    /// Inspect saved versions
    Versions {
        #[command(subcommand)]
        command: Option<VersionCommands>,
    },
    /// List code files in a project directory
    Files {
        /// Project root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Ask the suggestion service about a file
    Suggest {
        /// File to send
        file: PathBuf,
        /// What to ask for
        #[arg(short, long, default_value_t = SuggestionKind::default())]
        kind: SuggestionKind,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum VersionCommands {
    /// List saved versions
    #[command(alias = "ls")]
    List,
    /// Show a version's content
    Show {
        /// Version ID
        id: i64,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (relay_url, collab_enabled, display_name, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands must work even when the file doesn't parse
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    let default_level = if matches!(cli.command, Commands::Relay { .. }) {
        "info"
    } else {
        "warn"
    };
    init_logging(&config, default_level);

    match cli.command {
        Commands::Relay { bind } => commands::relay::run(&config, bind, &output).await,
        Commands::Edit {
            file,
            session,
            name,
            relay,
        } => {
            let options = EditOptions {
                file,
                session,
                name,
                relay,
            };
            commands::edit::run(&config, options, &output).await
        }
        Commands::Versions { command } => match command {
            Some(VersionCommands::List) | None => commands::versions::list(&config, &output),
            Some(VersionCommands::Show { id }) => commands::versions::show(&config, id, &output),
        },
        Commands::Files { root } => commands::files::list(root, &output),
        Commands::Suggest { file, kind } => {
            commands::suggest::run(&config, &file, kind, &output).await
        }
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

/// Initialize logging
///
/// The level comes from NEXUS_LOG, either a bare level (`debug`) or full
/// filter directives. Logs go to `config.log_file` when set, stderr otherwise.
fn init_logging(config: &Config, default_level: &str) {
    let level = std::env::var("NEXUS_LOG").unwrap_or_else(|_| default_level.to_string());
    let env_filter = if level.contains('=') || level.contains(',') {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(format!("nexus_core={0},nexus_cli={0}", level))
    };

    if let Some(log_path) = &config.log_file {
        match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(log_file) => {
                // Ignore error if already initialized
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(env_filter)
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(log_file))
                    .try_init();
                info!("logging to {:?}", log_path);
                return;
            }
            Err(e) => {
                eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            }
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
