//! Configuration management for the intent-json CLI.
//!
//! Settings are layered, later layers winning:
//! 1. Default values
//! 2. Config file (`~/.intent-json/config.toml`)
//! 3. Environment variables
//! 4. Command-line flags

mod schema;

pub use schema::{CliConfig, ConfigIssue, InvokeSettings, IssueLevel, ProviderSettings};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// Invalid value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".intent-json")
}

/// Get the default config file path.
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from `path`, or the default path when `None`.
///
/// A missing file yields the defaults. Issues of error level are fatal;
/// warnings are logged.
pub async fn load_config(path: Option<&Path>) -> ConfigResult<CliConfig> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    let config = load_config_from(&path).await?;

    for issue in config.validate() {
        match issue.level {
            IssueLevel::Error => {
                return Err(ConfigError::InvalidValue(format!(
                    "{}: {}",
                    issue.path, issue.message
                )));
            }
            IssueLevel::Warning => {
                tracing::warn!(path = %issue.path, "{}", issue.message);
            }
        }
    }

    Ok(config)
}

/// Load configuration from a specific path without validating it.
pub async fn load_config_from(path: &Path) -> ConfigResult<CliConfig> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
        return Ok(CliConfig::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    let config: CliConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), "loaded config file");

    Ok(config)
}
