//! Per-round bookkeeping and step isolation

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::StepError;

/// Outcome of one poll round
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundReport {
    /// Points extracted and buffered
    pub points: usize,
    /// Points written to the collector
    pub sent: usize,
    /// Steps that failed and contributed nothing
    pub failed: Vec<&'static str>,
    /// Wall time of the round
    pub duration: Duration,
}

impl RoundReport {
    /// Run one fallible step; a failure is logged and recorded, never
    /// propagated
    pub async fn isolate<T, Fut>(&mut self, step: &'static str, fut: Fut) -> Option<T>
    where
        Fut: Future<Output = Result<T, StepError>>,
    {
        match fut.await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(step, error = %e, "Step failed, skipping for this round");
                self.failed.push(step);
                None
            }
        }
    }

    /// Whether every step succeeded
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Emit the end-of-round summary
    pub fn log(&self) {
        info!(
            points = self.points,
            sent = self.sent,
            failed = ?self.failed,
            duration_ms = self.duration.as_millis() as u64,
            "Round complete"
        );
    }
}
