//! Carbon metric sink
//!
//! Buffers metric points in memory and sends them to a Graphite collector as
//! one batch per flush. Every flush opens a fresh TCP connection and closes
//! it before returning; nothing is pooled across rounds.

use std::io;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, instrument};

use crate::config::CarbonConfig;
use crate::error::SinkError;
use crate::transformer::{CarbonFormatter, MetricPoint};

/// In-memory point buffer flushed to a carbon plaintext listener
#[derive(Debug)]
pub struct CarbonSink {
    addr: String,
    timeout: Duration,
    formatter: CarbonFormatter,
    buffer: Vec<MetricPoint>,
}

impl CarbonSink {
    /// Create a sink for `addr` ("host:port")
    ///
    /// `timeout` bounds both the connect and the batch write.
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
            formatter: CarbonFormatter::new(),
            buffer: Vec::new(),
        }
    }

    /// Build a sink from the carbon section of the configuration
    pub fn from_config(config: &CarbonConfig) -> Self {
        Self::new(
            format!("{}:{}", config.host, config.port),
            Duration::from_millis(config.timeout_ms),
        )
    }

    /// Collector address
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Append one point; duplicates are kept
    pub fn add(&mut self, name: impl Into<String>, value: f64) {
        self.buffer.push(MetricPoint::new(name, value));
    }

    /// Append points in order
    pub fn extend(&mut self, points: impl IntoIterator<Item = MetricPoint>) {
        self.buffer.extend(points);
    }

    /// Points waiting for the next flush
    pub fn pending(&self) -> &[MetricPoint] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Send every buffered point and clear the buffer
    ///
    /// The buffer is taken before any I/O, so a failed flush drops its batch
    /// and points are never sent twice. An empty buffer returns `Ok(0)`
    /// without opening a connection.
    ///
    /// # Returns
    /// Number of points written
    #[instrument(skip(self), fields(addr = %self.addr, points = self.buffer.len()))]
    pub async fn flush(&mut self) -> Result<usize, SinkError> {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let batch = std::mem::take(&mut self.buffer);
        self.send(&batch).await?;

        debug!(points = batch.len(), "Batch flushed");
        Ok(batch.len())
    }

    async fn send(&self, batch: &[MetricPoint]) -> Result<(), SinkError> {
        let stream = match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(self.unreachable(source)),
            Err(_) => return Err(self.unreachable(timed_out("connect"))),
        };

        let timestamp = unix_now();
        let mut writer = BufWriter::new(stream);
        let mut written = 0;

        let result = tokio::time::timeout(self.timeout, async {
            for point in batch {
                let line = self.formatter.format_line(point, timestamp);
                writer.write_all(line.as_bytes()).await?;
                written += 1;
            }
            writer.flush().await?;
            writer.shutdown().await
        })
        .await
        .unwrap_or_else(|_| Err(timed_out("write")));

        // writer (and the socket) is dropped here on every path
        result.map_err(|source| SinkError::Write {
            addr: self.addr.clone(),
            written,
            total: batch.len(),
            source,
        })
    }

    fn unreachable(&self, source: io::Error) -> SinkError {
        SinkError::Unreachable {
            addr: self.addr.clone(),
            source,
        }
    }
}

fn timed_out(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, format!("{} timed out", what))
}

/// Seconds since the Unix epoch
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
