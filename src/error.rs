//! Error types for rabbitmq-watcher
//!
//! Every error here is recoverable at the step that produced it: the poller
//! logs it and carries on with the rest of the round.

use thiserror::Error;

/// Errors raised while fetching a document from the management API
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP client could not be built
    #[error("Failed to initialize HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),

    /// Broker host/port do not form a usable URL
    #[error("Invalid management API endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Transport failure: DNS, connect, timeout or body read
    #[error("Management API unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// Non-success HTTP status, e.g. 403 for node stats without the
    /// "monitoring" tag
    #[error("Management API returned {status} {message}")]
    Unavailable { status: u16, message: String },

    /// Response body is not valid JSON
    #[error("Malformed response for '{resource}': {reason}")]
    MalformedResponse { resource: String, reason: String },
}

impl SourceError {
    /// HTTP status code, if the broker answered at all
    pub fn http_status(&self) -> Option<u16> {
        match self {
            SourceError::Unavailable { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request never produced an HTTP response
    pub fn is_transport(&self) -> bool {
        matches!(self, SourceError::Unreachable(_))
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            SourceError::Unavailable {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            }
        } else {
            SourceError::Unreachable(err)
        }
    }
}

/// Errors raised while turning a document into metric points
#[derive(Error, Debug, PartialEq)]
pub enum ExtractError {
    /// Document (or a section of it) has the wrong JSON type
    #[error("Expected {expected} for '{what}', found {found}")]
    UnexpectedShape {
        what: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A field the extraction depends on is absent
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
}

/// Errors raised while sending a batch to the collector
#[derive(Error, Debug)]
pub enum SinkError {
    /// Connection to the collector could not be opened
    #[error("Collector {addr} unreachable: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Connection dropped while the batch was being written
    #[error("Write to collector {addr} failed after {written} of {total} points: {source}")]
    Write {
        addr: String,
        written: usize,
        total: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of one isolated poll step
#[derive(Error, Debug)]
pub enum StepError {
    /// Fetch failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Extraction failed
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Flush failed
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Management API client error
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Logging could not be initialised
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display_and_status() {
        let err = SourceError::Unavailable {
            status: 403,
            message: "Forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "Management API returned 403 Forbidden");
        assert_eq!(err.http_status(), Some(403));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_malformed_has_no_status() {
        let err = SourceError::MalformedResponse {
            resource: "overview".to_string(),
            reason: "expected value at line 1 column 1".to_string(),
        };
        assert_eq!(err.http_status(), None);
        assert!(err.to_string().contains("overview"));
    }

    #[test]
    fn test_step_error_is_transparent() {
        let err: StepError = ExtractError::MissingField("node").into();
        assert_eq!(err.to_string(), "Missing required field 'node'");
    }

    #[test]
    fn test_sink_error_display() {
        let err = SinkError::Unreachable {
            addr: "127.0.0.1:2003".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        assert!(err.to_string().starts_with("Collector 127.0.0.1:2003 unreachable"));
    }
}
