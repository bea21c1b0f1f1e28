//! CLI argument parsing for rabbitmq-watcher
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Configuration file path (default: config.yaml, env: RMQW_CONFIG)
//! - `--prefix` / `-P`: First segment of every metric name (env: RMQW_PREFIX)
//! - `--interval` / `-i`: Seconds between rounds (env: RMQW_INTERVAL)
//! - `--carbon-host` / `-H`, `--carbon-port` / `-p`: Graphite collector
//! - `--rmq-host` / `-r`, `--rmq-port` / `-b`: Management API endpoint
//! - `--rmq-user` / `-u`, `--rmq-pass` / `-s`: Management API credentials
//! - `--queues` / `-q`, `--no-queues`: Report per-queue and per-exchange metrics
//! - `--include-auto-delete` / `-a`, `--no-include-auto-delete`: Keep auto-delete queues
//! - `--once`: Run a single round and exit
//! - `--validate`: Validate configuration and print it
//! - `--log-level` / `-l`, `--log-format`: Logging
//! - `--output-format`: Output format for validate (text/json/yaml)
//!
//! # Precedence
//!
//! Configuration values are resolved in the following order (highest to lowest priority):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::Config;

/// rabbitmq-watcher - RabbitMQ statistics to Graphite
///
/// Polls the RabbitMQ management API and forwards overview, node, queue and
/// exchange statistics to a carbon plaintext listener.
///
/// Environment variables can be used for all configuration options.
/// CLI arguments take precedence over environment variables,
/// which take precedence over config file values.
#[derive(Parser, Debug)]
#[command(name = "rabbitmq-watcher")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (YAML or JSON)
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.yaml",
        env = "RMQW_CONFIG"
    )]
    pub config: PathBuf,

    /// Metric name prefix (default: hostname)
    #[arg(short = 'P', long, value_name = "PREFIX", env = "RMQW_PREFIX")]
    pub prefix: Option<String>,

    /// Seconds between rounds
    #[arg(short, long, value_name = "SECS", env = "RMQW_INTERVAL")]
    pub interval: Option<u64>,

    /// Graphite collector host
    #[arg(short = 'H', long, value_name = "HOST", env = "RMQW_CARBON_HOST")]
    pub carbon_host: Option<String>,

    /// Graphite collector plaintext port
    #[arg(short = 'p', long, value_name = "PORT", env = "RMQW_CARBON_PORT")]
    pub carbon_port: Option<u16>,

    /// Management API username
    #[arg(short = 'u', long, value_name = "USER", env = "RMQW_RMQ_USER")]
    pub rmq_user: Option<String>,

    /// Management API password
    #[arg(
        short = 's',
        long,
        value_name = "PASS",
        env = "RMQW_RMQ_PASS",
        hide_env_values = true
    )]
    pub rmq_pass: Option<String>,

    /// Management API host
    #[arg(short = 'r', long, value_name = "HOST", env = "RMQW_RMQ_HOST")]
    pub rmq_host: Option<String>,

    /// Management API port
    #[arg(short = 'b', long, value_name = "PORT", env = "RMQW_RMQ_PORT")]
    pub rmq_port: Option<u16>,

    /// Report per-queue and per-exchange metrics
    #[arg(short = 'q', long, env = "RMQW_QUEUES", overrides_with = "no_queues")]
    pub queues: bool,

    /// Do not report per-queue and per-exchange metrics
    #[arg(long, overrides_with = "queues")]
    pub no_queues: bool,

    /// Keep auto-delete queues when reporting per-queue metrics
    #[arg(
        short = 'a',
        long,
        env = "RMQW_INCLUDE_AUTO_DELETE",
        overrides_with = "no_include_auto_delete"
    )]
    pub include_auto_delete: bool,

    /// Skip auto-delete queues when reporting per-queue metrics
    #[arg(long, overrides_with = "include_auto_delete")]
    pub no_include_auto_delete: bool,

    /// Run a single round and exit
    #[arg(long)]
    pub once: bool,

    /// Validate configuration without polling
    #[arg(long, conflicts_with = "once")]
    pub validate: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "RMQW_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", env = "RMQW_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Output format for --validate
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

impl Cli {
    /// Overlay the values given on the command line (or through the
    /// environment) onto a configuration loaded from file
    ///
    /// Each switch has a `--no-` form; the last one given on the command
    /// line wins, and a `--no-` flag given on the command line beats the
    /// environment.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(interval) = self.interval {
            config.interval_secs = interval;
        }
        if let Some(host) = &self.carbon_host {
            config.carbon.host = host.clone();
        }
        if let Some(port) = self.carbon_port {
            config.carbon.port = port;
        }
        if let Some(user) = &self.rmq_user {
            config.broker.username = user.clone();
        }
        if let Some(pass) = &self.rmq_pass {
            config.broker.password = pass.clone();
        }
        if let Some(host) = &self.rmq_host {
            config.broker.host = host.clone();
        }
        if let Some(port) = self.rmq_port {
            config.broker.port = port;
        }
        if let Some(queues) = switch(self.queues, self.no_queues) {
            config.report.queues = queues;
        }
        if let Some(include) = switch(self.include_auto_delete, self.no_include_auto_delete) {
            config.report.include_auto_delete = include;
        }
    }
}

/// Resolve a `--flag`/`--no-flag` pair; `None` leaves the config alone
fn switch(on: bool, off: bool) -> Option<bool> {
    if off {
        Some(false)
    } else if on {
        Some(true)
    } else {
        None
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log line format
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Output format options for validate mode
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}
