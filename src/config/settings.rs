//! Application settings loading from config.toml
//!
//! Every section is optional; a missing file or missing keys fall back to
//! defaults. `DATABASE_URL` in the environment (or `.env`) takes precedence
//! over the file's database URL.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Database URL used when neither the environment nor the file names one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://newsdesk.sqlite?mode=rwc";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Storage connection settings
    pub database: DatabaseConfig,
    /// Expiry sweep schedule
    pub sweeper: SweeperConfig,
    /// Per-call storage deadline
    pub storage: StorageConfig,
}

/// `[database]` section
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL; `DATABASE_URL` overrides it
    pub url: Option<String>,
}

/// `[sweeper]` section
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SweeperConfig {
    /// Seconds between sweeps
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}

/// `[storage]` section
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Abandon storage calls that take longer than this many seconds
    pub timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Resolves the database URL: environment first, then file, then default.
    #[must_use]
    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .ok()
            .or_else(|| self.database.url.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
    }

    /// Time between sweeps, at least one second.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweeper.interval_secs.max(1))
    }

    /// Per-call storage deadline, if configured.
    #[must_use]
    pub fn storage_timeout(&self) -> Option<Duration> {
        self.storage
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from the default location (./config.toml), falling
/// back to defaults when the file does not exist.
pub fn load_default_config() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    if !path.exists() {
        tracing::warn!("config.toml not found, using default settings");
        return Ok(AppConfig::default());
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [database]
            url = "sqlite://news.sqlite?mode=rwc"

            [sweeper]
            interval_secs = 60

            [storage]
            timeout_secs = 5
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.database.url.as_deref(),
            Some("sqlite://news.sqlite?mode=rwc")
        );
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.storage_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.storage_timeout(), None);

        let zeroes: AppConfig =
            toml::from_str("[sweeper]\ninterval_secs = 0\n[storage]\ntimeout_secs = 0").unwrap();
        assert_eq!(zeroes.sweep_interval(), Duration::from_secs(1));
        assert_eq!(zeroes.storage_timeout(), None);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = std::env::temp_dir().join("newsdesk_bad_config.toml");
        std::fs::write(&dir, "[sweeper\ninterval_secs = ").unwrap();
        let result = load_config(&dir);
        assert!(matches!(result, Err(Error::Config { .. })));
        let _ = std::fs::remove_file(&dir);

        let missing = load_config("/nonexistent/newsdesk/config.toml");
        assert!(matches!(missing, Err(Error::Config { .. })));
    }
}
