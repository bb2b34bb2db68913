//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/nexus/config.toml)
//! 3. Environment variables (NEXUS_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "NEXUS";

/// File name of the version catalog inside the data directory
const VERSIONS_FILE: &str = "code_versions.json";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for local data (version catalog, logs)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Relay server URL used to join editing sessions (optional)
    #[serde(default)]
    pub relay_url: Option<String>,

    /// Whether collaborative sessions connect to the relay
    #[serde(default)]
    pub collab_enabled: bool,

    /// Address the relay server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Name shown to other participants
    #[serde(default)]
    pub display_name: Option<String>,

    /// Suggestion service endpoint (optional)
    #[serde(default)]
    pub suggestion_url: Option<String>,

    /// Client-side timeout for suggestion requests
    #[serde(default = "default_suggestion_timeout")]
    pub suggestion_timeout_secs: u64,

    /// Run the advisory syntax check before accepting local edits
    #[serde(default = "default_validate_edits")]
    pub validate_edits: bool,

    /// Log file path; logs go to stderr when unset
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            relay_url: None,
            collab_enabled: false,
            bind_addr: default_bind_addr(),
            display_name: None,
            suggestion_url: None,
            suggestion_timeout_secs: default_suggestion_timeout(),
            validate_edits: default_validate_edits(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (NEXUS_DATA_DIR, NEXUS_RELAY_URL, ...)
    /// 2. Config file (~/.config/nexus/config.toml or NEXUS_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_RELAY_URL", ENV_PREFIX)) {
            self.relay_url = non_empty(val);
        }

        if let Ok(val) = std::env::var(format!("{}_COLLAB_ENABLED", ENV_PREFIX)) {
            self.collab_enabled = parse_flag(&val);
        }

        if let Ok(val) = std::env::var(format!("{}_BIND_ADDR", ENV_PREFIX)) {
            if !val.is_empty() {
                self.bind_addr = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_DISPLAY_NAME", ENV_PREFIX)) {
            self.display_name = non_empty(val);
        }

        if let Ok(val) = std::env::var(format!("{}_SUGGESTION_URL", ENV_PREFIX)) {
            self.suggestion_url = non_empty(val);
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with NEXUS_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nexus")
            .join("config.toml")
    }

    /// Get the path to the version catalog
    pub fn versions_path(&self) -> PathBuf {
        self.data_dir.join(VERSIONS_FILE)
    }

    /// Relay URL to use, if collaboration is switched on
    pub fn active_relay_url(&self) -> Option<&str> {
        if self.collab_enabled {
            self.relay_url.as_deref()
        } else {
            None
        }
    }
}

fn non_empty(val: String) -> Option<String> {
    if val.is_empty() {
        None
    } else {
        Some(val)
    }
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nexus")
}

fn default_bind_addr() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_suggestion_timeout() -> u64 {
    30
}

fn default_validate_edits() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Serializes tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "NEXUS_DATA_DIR",
        "NEXUS_RELAY_URL",
        "NEXUS_COLLAB_ENABLED",
        "NEXUS_BIND_ADDR",
        "NEXUS_DISPLAY_NAME",
        "NEXUS_SUGGESTION_URL",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.collab_enabled);
        assert!(config.relay_url.is_none());
        assert!(config.validate_edits);
        assert_eq!(config.suggestion_timeout_secs, 30);
        assert_eq!(config.bind_addr, "127.0.0.1:3001");
        assert!(config.data_dir.ends_with("nexus"));
    }

    #[test]
    fn test_versions_path() {
        let config = Config::default();
        assert!(config.versions_path().ends_with("code_versions.json"));
    }

    #[test]
    fn test_active_relay_url_requires_collab_enabled() {
        let mut config = Config {
            relay_url: Some("ws://localhost:3001".to_string()),
            ..Config::default()
        };
        assert!(config.active_relay_url().is_none());

        config.collab_enabled = true;
        assert_eq!(config.active_relay_url(), Some("ws://localhost:3001"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("NEXUS_DATA_DIR", "/tmp/nexus-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/nexus-test"));
    }

    #[test]
    fn test_env_override_collab_enabled() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        assert!(!config.collab_enabled);

        env::set_var("NEXUS_COLLAB_ENABLED", "true");
        config.apply_env_overrides();
        assert!(config.collab_enabled);

        env::set_var("NEXUS_COLLAB_ENABLED", "1");
        config.collab_enabled = false;
        config.apply_env_overrides();
        assert!(config.collab_enabled);

        env::set_var("NEXUS_COLLAB_ENABLED", "false");
        config.apply_env_overrides();
        assert!(!config.collab_enabled);
    }

    #[test]
    fn test_env_override_relay_url() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        assert!(config.relay_url.is_none());

        env::set_var("NEXUS_RELAY_URL", "ws://localhost:3001");
        config.apply_env_overrides();
        assert_eq!(config.relay_url, Some("ws://localhost:3001".to_string()));

        // Empty string clears it
        env::set_var("NEXUS_RELAY_URL", "");
        config.apply_env_overrides();
        assert!(config.relay_url.is_none());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/nexus"),
            relay_url: Some("ws://relay.example.com".to_string()),
            collab_enabled: true,
            display_name: Some("Ada".to_string()),
            ..Config::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("relay_url"));
        assert!(toml_str.contains("collab_enabled"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.relay_url, config.relay_url);
        assert_eq!(parsed.collab_enabled, config.collab_enabled);
        assert_eq!(parsed.display_name, config.display_name);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            relay_url = "ws://example.com"
            collab_enabled = true
            validate_edits = false
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.relay_url, Some("ws://example.com".to_string()));
        assert!(config.collab_enabled);
        assert!(!config.validate_edits);
        // Unset fields fall back to defaults
        assert_eq!(config.suggestion_timeout_secs, 30);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            suggestion_url: Some("http://localhost:3000/api/ai".to_string()),
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.suggestion_url, config.suggestion_url);
        assert!(loaded.data_dir.exists());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        env::set_var("NEXUS_DATA_DIR", temp_dir.path().join("data"));

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert!(!config.collab_enabled);
        assert!(config.relay_url.is_none());
    }
}
