//! rabbitmq-watcher library
//!
//! This crate polls the RabbitMQ management HTTP API at a fixed interval,
//! flattens the returned statistics into dotted metric names and forwards
//! them to a Graphite collector over the carbon plaintext protocol.

pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod poller;
pub mod sink;
pub mod transformer;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::cli::LogFormat;
use crate::error::{AppError, AppResult};

/// Initialize the logging subsystem
///
/// `RUST_LOG`, when set, takes precedence over `level`.
///
/// # Arguments
/// * `level` - Log level string (trace, debug, info, warn, error)
/// * `format` - Human-readable text or one JSON object per event
///
/// # Errors
/// Returns an error if a global subscriber is already installed
pub fn init_logging(level: &str, format: LogFormat) -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let layer = match format {
        LogFormat::Text => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))
}
