//! Metric extraction and formatting
//!
//! This module flattens management API documents into dotted metric points
//! and renders them in the carbon plaintext format.

pub mod extractor;
pub mod formatter;
pub mod scheme;

pub use extractor::{ExtractorConfig, MetricExtractor, MetricPoint};
pub use formatter::CarbonFormatter;
pub use scheme::{
    sanitize_instance, MetricPath, NamingScheme, Presence, ResourceKind, StatGroup, StatKind,
    EXCHANGES, MESSAGE_STATS, OBJECT_TOTALS, OVERVIEW, QUEUES, QUEUE_TOTALS, SYSTEM,
};
