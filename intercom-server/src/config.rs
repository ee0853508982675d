//! Configuration management for intercom-server
//!
//! Bootstrap configuration comes from an optional TOML file, then
//! command-line/environment overrides are applied on top. Every value has a
//! built-in default, so the server starts with no file at all.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--port`, `--database`)
//! 2. Environment variables (`INTERCOM_PORT`, `INTERCOM_DATABASE`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::error::{Error, Result};
use crate::playback::DispatchTiming;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default = "intercom_common::config::default_database_path")]
    pub database_path: PathBuf,

    /// Address the HTTP API binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub dispatch: DispatchSettings,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: intercom_common::config::default_database_path(),
            bind_address: default_bind_address(),
            port: default_port(),
            logging: LoggingConfig::default(),
            dispatch: DispatchSettings::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` string). `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Dispatcher timing and device client settings
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    /// Seconds between "now" and the shared device start time
    #[serde(default = "default_look_ahead_secs")]
    pub look_ahead_secs: u64,

    /// Settle buffer added after each sound, each repeat and each command
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Delay between triggers to successive devices
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,

    /// How long one queue wait lasts before the shutdown flag is re-checked
    #[serde(default = "default_queue_poll_ms")]
    pub queue_poll_ms: u64,

    /// Per-request timeout for device triggers and status probes
    #[serde(default = "default_device_timeout_ms")]
    pub device_timeout_ms: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            look_ahead_secs: default_look_ahead_secs(),
            settle_ms: default_settle_ms(),
            stagger_ms: default_stagger_ms(),
            queue_poll_ms: default_queue_poll_ms(),
            device_timeout_ms: default_device_timeout_ms(),
        }
    }
}

impl DispatchSettings {
    pub fn timing(&self) -> DispatchTiming {
        DispatchTiming {
            look_ahead: Duration::from_secs(self.look_ahead_secs),
            settle: Duration::from_millis(self.settle_ms),
            stagger: Duration::from_millis(self.stagger_ms),
            queue_poll: Duration::from_millis(self.queue_poll_ms),
        }
    }

    pub fn device_timeout(&self) -> Duration {
        Duration::from_millis(self.device_timeout_ms)
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "intercom_server=debug,intercom_common=info,tower_http=info".to_string()
}

fn default_look_ahead_secs() -> u64 {
    5
}

fn default_settle_ms() -> u64 {
    2000
}

fn default_stagger_ms() -> u64 {
    100
}

fn default_queue_poll_ms() -> u64 {
    1000
}

fn default_device_timeout_ms() -> u64 {
    1000
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub port: Option<u16>,
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub logging: LoggingConfig,
    pub dispatch: DispatchSettings,
}

impl Config {
    /// Load configuration from the resolved TOML file (if any) plus overrides
    ///
    /// # Errors
    ///
    /// Returns error if a config file was found or named but cannot be read
    /// or parsed.
    pub async fn load(overrides: ConfigOverrides) -> Result<Self> {
        let toml_config = match intercom_common::config::resolve_config_path(
            overrides.config_path.as_deref(),
            intercom_common::config::CONFIG_ENV_VAR,
        ) {
            Some(path) => Self::read_toml(&path).await?,
            None => TomlConfig::default(),
        };

        Ok(Self::from_parts(toml_config, overrides))
    }

    async fn read_toml(path: &Path) -> Result<TomlConfig> {
        let toml_str = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config = parse_toml(&toml_str)?;
        info!("Loaded TOML configuration from {:?}", path);
        Ok(config)
    }

    /// Apply CLI overrides on top of file values
    pub fn from_parts(toml_config: TomlConfig, overrides: ConfigOverrides) -> Self {
        Self {
            database_path: overrides.database_path.unwrap_or(toml_config.database_path),
            bind_address: toml_config.bind_address,
            port: overrides.port.unwrap_or(toml_config.port),
            logging: toml_config.logging,
            dispatch: toml_config.dispatch,
        }
    }
}

/// Parse TOML bootstrap text
pub fn parse_toml(toml_str: &str) -> Result<TomlConfig> {
    toml::from_str(toml_str).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = parse_toml("").unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.dispatch.look_ahead_secs, 5);
        assert_eq!(config.dispatch.settle_ms, 2000);
        assert_eq!(config.dispatch.stagger_ms, 100);
        assert_eq!(config.dispatch.device_timeout_ms, 1000);
    }

    #[test]
    fn test_partial_dispatch_table() {
        let config = parse_toml(
            r#"
            port = 9000
            database_path = "/srv/intercom/intercom.db"

            [dispatch]
            settle_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.database_path, PathBuf::from("/srv/intercom/intercom.db"));
        assert_eq!(config.dispatch.settle_ms, 500);
        assert_eq!(config.dispatch.stagger_ms, 100);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(matches!(parse_toml("port = \"eighty\""), Err(Error::Config(_))));
    }

    #[test]
    fn test_overrides_win() {
        let config = Config::from_parts(
            TomlConfig::default(),
            ConfigOverrides {
                config_path: None,
                database_path: Some(PathBuf::from("/tmp/override.db")),
                port: Some(8123),
            },
        );
        assert_eq!(config.port, 8123);
        assert_eq!(config.database_path, PathBuf::from("/tmp/override.db"));
    }

    #[test]
    fn test_timing_conversion() {
        let timing = DispatchSettings::default().timing();
        assert_eq!(timing.look_ahead, Duration::from_secs(5));
        assert_eq!(timing.settle, Duration::from_secs(2));
        assert_eq!(timing.stagger, Duration::from_millis(100));
        assert_eq!(timing.queue_poll, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_load_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = 8111\n").unwrap();

        let config = Config::load(ConfigOverrides {
            config_path: Some(path),
            ..Default::default()
        })
        .await
        .unwrap();
        assert_eq!(config.port, 8111);
    }

    #[tokio::test]
    async fn test_load_missing_named_file_fails() {
        let result = Config::load(ConfigOverrides {
            config_path: Some(PathBuf::from("/nonexistent/intercom/config.toml")),
            ..Default::default()
        })
        .await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
