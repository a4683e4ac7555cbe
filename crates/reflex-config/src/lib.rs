//! Configuration management for reflex.
//!
//! Parses `reflex.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! Unlike tools that fall back to built-in defaults, a missing or
//! malformed configuration file is a hard error: the server must not
//! start watching a folder it was never told about.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override watched folder.
    pub folder: Option<PathBuf>,
    /// Override debounce delay in milliseconds.
    pub delay_ms: Option<u64>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "reflex.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Watch configuration (paths are relative strings from TOML).
    watch: WatchConfigRaw,
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: Option<String>,

    /// Resolved watch configuration (set after loading).
    #[serde(skip)]
    pub watch_resolved: WatchConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Raw watch configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize)]
struct WatchConfigRaw {
    folder: String,
    delay_ms: Option<u64>,
}

/// Resolved watch configuration with absolute paths.
#[derive(Debug, Default)]
pub struct WatchConfig {
    /// Folder to watch for changes, absolute.
    pub folder: PathBuf,
    /// Quiet period that must elapse before a change is settled.
    pub delay_ms: u64,
}

impl WatchConfig {
    /// Debounce delay as a [`Duration`].
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Default debounce delay in milliseconds.
const DEFAULT_DELAY_MS: u64 = 100;

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// No config file discovered in the current directory or parents.
    #[error("No {CONFIG_FILENAME} found in the current directory or any parent")]
    NotDiscovered,
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `reflex.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns an error if no config file can be found, parsing fails, or
    /// validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            return Err(ConfigError::NotDiscovered);
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(folder) = &settings.folder {
            self.watch_resolved.folder.clone_from(folder);
        }
        if let Some(delay_ms) = settings.delay_ms {
            self.watch_resolved.delay_ms = delay_ms;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading and applying CLI settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 is technically valid (OS assigns a random port), but it's
        // unlikely to be intentional in a config file
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        let folder = &self.watch_resolved.folder;
        if !folder.is_dir() {
            return Err(ConfigError::Validation(format!(
                "watch.folder is not a directory: {}",
                folder.display()
            )));
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    ///
    /// `watch.folder` supports `~` expansion.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        require_non_empty(&self.watch.folder, "watch.folder")?;

        let expanded = shellexpand::tilde(&self.watch.folder);
        let folder = config_dir.join(expanded.as_ref());

        self.watch_resolved = WatchConfig {
            folder,
            delay_ms: self.watch.delay_ms.unwrap_or(DEFAULT_DELAY_MS),
        };

        Ok(())
    }
}
