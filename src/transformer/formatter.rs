//! Carbon plaintext protocol output
//!
//! One line per point, space-delimited and newline-terminated:
//!
//! ```text
//! <dotted.metric.name> <value> <unix_timestamp>
//! ```

use super::extractor::MetricPoint;

/// Carbon plaintext formatter
///
/// Every point of a batch is stamped with the same timestamp.
///
/// # Example
///
/// ```ignore
/// use rabbitmq_watcher::transformer::{CarbonFormatter, MetricPoint};
///
/// let points = vec![MetricPoint::new("host1.system.uptime", 3600.0)];
/// let output = CarbonFormatter::new().format(&points, 1609459200);
/// assert_eq!(output, "host1.system.uptime 3600 1609459200\n");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CarbonFormatter;

impl CarbonFormatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self
    }

    /// Format a whole batch, in order
    pub fn format(&self, points: &[MetricPoint], timestamp: u64) -> String {
        let mut output = String::with_capacity(points.len() * 64);
        for point in points {
            output.push_str(&self.format_line(point, timestamp));
        }
        output
    }

    /// Format a single point, including the trailing newline
    pub fn format_line(&self, point: &MetricPoint, timestamp: u64) -> String {
        format!(
            "{} {} {}\n",
            point.name,
            Self::format_value(point.value),
            timestamp
        )
    }

    /// Format a numeric value
    ///
    /// - Integers are formatted without decimal point
    /// - Everything else uses the shortest decimal form that round-trips
    /// - Non-finite values (never produced by the extractor) are sent as `0`
    fn format_value(value: f64) -> String {
        if !value.is_finite() {
            "0".to_string()
        } else if value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else {
            format!("{}", value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        let formatter = CarbonFormatter::new();
        let line = formatter.format_line(
            &MetricPoint::new("host1.overview.object_totals.channels", 3.0),
            1609459200,
        );
        assert_eq!(line, "host1.overview.object_totals.channels 3 1609459200\n");
    }

    #[test]
    fn test_format_batch_shares_timestamp_and_order() {
        let points = vec![
            MetricPoint::new("b.metric", 1.0),
            MetricPoint::new("a.metric", 0.5),
            MetricPoint::new("b.metric", 2.0),
        ];
        let output = CarbonFormatter::new().format(&points, 42);
        assert_eq!(output, "b.metric 1 42\na.metric 0.5 42\nb.metric 2 42\n");
    }

    #[test]
    fn test_format_empty_batch() {
        assert!(CarbonFormatter::new().format(&[], 42).is_empty());
    }

    #[test]
    fn test_format_value_integer() {
        assert_eq!(CarbonFormatter::format_value(42.0), "42");
        assert_eq!(CarbonFormatter::format_value(0.0), "0");
        assert_eq!(CarbonFormatter::format_value(-0.0), "0");
        assert_eq!(CarbonFormatter::format_value(-100.0), "-100");
        assert_eq!(CarbonFormatter::format_value(4294967296.0), "4294967296");
    }

    #[test]
    fn test_format_value_decimal() {
        assert_eq!(CarbonFormatter::format_value(0.5), "0.5");
        assert_eq!(CarbonFormatter::format_value(1.23456), "1.23456");
        assert_eq!(CarbonFormatter::format_value(0.000001), "0.000001");
    }

    #[test]
    fn test_format_value_never_scientific() {
        let formatted = CarbonFormatter::format_value(1.5e20);
        assert!(!formatted.contains('e'));
    }

    #[test]
    fn test_format_value_non_finite() {
        assert_eq!(CarbonFormatter::format_value(f64::NAN), "0");
        assert_eq!(CarbonFormatter::format_value(f64::INFINITY), "0");
    }
}
