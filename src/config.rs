//! Configuration management for rabbitmq-watcher
//!
//! Handles loading and validating configuration from YAML files. JSON is a
//! subset of YAML, so JSON configuration files load through the same path.
//!
//! Besides the nested sections, the flat keys of the older JSON format are
//! accepted at the top level:
//!
//! | Flat key   | Setting          |
//! |------------|------------------|
//! | `interval` | `interval_secs`  |
//! | `host`     | `carbon.host`    |
//! | `port`     | `carbon.port`    |
//! | `rmqhost`  | `broker.host`    |
//! | `rmqport`  | `broker.port`    |
//! | `rmquser`  | `broker.username`|
//! | `rmqpass`  | `broker.password`|
//! | `queues`   | `report.queues`  |
//!
//! A flat key wins over the same setting in a nested section.

use serde::{Deserialize, Serialize, Serializer};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// First segment of every metric name
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Seconds to sleep between rounds
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Management API endpoint
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Graphite collector endpoint
    #[serde(default)]
    pub carbon: CarbonConfig,

    /// Which optional metric groups to report
    #[serde(default)]
    pub report: ReportConfig,
}

/// Management API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_broker_host")]
    pub host: String,

    #[serde(default = "default_broker_port")]
    pub port: u16,

    #[serde(default = "default_credential")]
    pub username: String,

    #[serde(default = "default_credential", serialize_with = "redact")]
    pub password: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

/// Graphite (carbon plaintext) collector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarbonConfig {
    #[serde(default = "default_carbon_host")]
    pub host: String,

    #[serde(default = "default_carbon_port")]
    pub port: u16,

    /// Connect and write timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

/// Optional metric groups
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report per-queue and per-exchange metrics
    #[serde(default)]
    pub queues: bool,

    /// Keep auto-delete queues when reporting per-queue metrics
    #[serde(default)]
    pub include_auto_delete: bool,
}

// Default value functions
fn default_prefix() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string())
}

fn default_interval() -> u64 {
    10
}

fn default_broker_host() -> String {
    "127.0.0.1".to_string()
}

fn default_broker_port() -> u16 {
    15672
}

fn default_credential() -> String {
    "guest".to_string()
}

fn default_carbon_host() -> String {
    "127.0.0.1".to_string()
}

fn default_carbon_port() -> u16 {
    2003
}

fn default_timeout() -> u64 {
    5000
}

fn redact<T: ?Sized, S: Serializer>(_: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("********")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            interval_secs: default_interval(),
            broker: BrokerConfig::default(),
            carbon: CarbonConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_broker_host(),
            port: default_broker_port(),
            username: default_credential(),
            password: default_credential(),
            timeout_ms: default_timeout(),
        }
    }
}

impl Default for CarbonConfig {
    fn default() -> Self {
        Self {
            host: default_carbon_host(),
            port: default_carbon_port(),
            timeout_ms: default_timeout(),
        }
    }
}

/// Document as read from disk: the nested layout plus any leftover
/// top-level keys
#[derive(Deserialize)]
struct ConfigFile {
    #[serde(flatten)]
    config: Config,

    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl ConfigFile {
    fn into_config(self) -> Result<Config, ConfigError> {
        let mut config = self.config;

        for (key, value) in self.extra {
            match key.as_str() {
                "interval" => config.interval_secs = flat_number(&key, &value)?,
                "host" => config.carbon.host = flat_string(&key, value)?,
                "port" => config.carbon.port = flat_number(&key, &value)?,
                "rmqhost" => config.broker.host = flat_string(&key, value)?,
                "rmqport" => config.broker.port = flat_number(&key, &value)?,
                "rmquser" => config.broker.username = flat_string(&key, value)?,
                "rmqpass" => config.broker.password = flat_string(&key, value)?,
                "queues" => config.report.queues = flat_flag(&key, &value)?,
                _ => {
                    warn!(key = %key, "Unknown config key ignored");
                    continue;
                }
            }
            debug!(key = %key, "Applied flat config key");
        }

        Ok(config)
    }
}

fn flat_type_error(key: &str, expected: &str) -> ConfigError {
    ConfigError::ValidationError(format!("'{}' must be {}", key, expected))
}

fn flat_string(key: &str, value: Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(flat_type_error(key, "a string")),
    }
}

/// Numbers may also be given as numeric strings
fn flat_number<T: FromStr>(key: &str, value: &Value) -> Result<T, ConfigError> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(flat_type_error(key, "a number")),
    };
    text.parse()
        .map_err(|_| flat_type_error(key, "a non-negative integer in range"))
}

/// `true`/`false`, or a string that is true only when it reads "true"
fn flat_flag(key: &str, value: &Value) -> Result<bool, ConfigError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => Ok(s.trim().eq_ignore_ascii_case("true")),
        _ => Err(flat_type_error(key, "a boolean")),
    }
}

impl Config {
    /// Load configuration from a YAML (or JSON) file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or fails
    /// validation
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::parse(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, falling back to defaults if not found
    ///
    /// Validation is left to the caller so that CLI overrides can be applied
    /// first.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration text without validating it
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: ConfigFile = serde_yaml::from_str(contents)?;
        file.into_config()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Metric prefix must not be empty".to_string(),
            ));
        }

        if self.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Interval must be at least 1 second".to_string(),
            ));
        }

        if self.broker.host.is_empty() || self.carbon.host.is_empty() {
            return Err(ConfigError::ValidationError(
                "Broker and carbon hosts must not be empty".to_string(),
            ));
        }

        if self.broker.port == 0 || self.carbon.port == 0 {
            return Err(ConfigError::ValidationError(
                "Broker and carbon ports must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Sleep between rounds
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Collector address as `host:port`
    pub fn carbon_addr(&self) -> String {
        format!("{}:{}", self.carbon.host, self.carbon.port)
    }
}
