//! Poll cycle
//!
//! Runs rounds of fetch, extract and flush at a fixed interval. Every step of
//! a round is isolated: a failure is logged and the round carries on with
//! fewer points. Rounds never overlap and only one request is outstanding at
//! a time.

mod round;

pub use round::RoundReport;

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::signal;
use tracing::{error, info};

use crate::collector::{ManagementClient, Resource, ResourceDocument};
use crate::config::Config;
use crate::error::{ExtractError, SourceError, StepError};
use crate::sink::CarbonSink;
use crate::transformer::{ExtractorConfig, MetricExtractor, MetricPoint, OVERVIEW};

type Extract = fn(&MetricExtractor, &ResourceDocument) -> Result<Vec<MetricPoint>, ExtractError>;

/// Poll loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Sleeping between rounds
    Idle,
    /// A round is in progress
    Running,
}

/// Drives rounds against one broker and one collector
pub struct Poller {
    client: ManagementClient,
    extractor: MetricExtractor,
    sink: CarbonSink,
    interval: Duration,
    report_queues: bool,
    state: PollState,
}

impl Poller {
    /// Create a poller with a 10 second interval and queue reporting off
    pub fn new(client: ManagementClient, extractor: MetricExtractor, sink: CarbonSink) -> Self {
        Self {
            client,
            extractor,
            sink,
            interval: Duration::from_secs(10),
            report_queues: false,
            state: PollState::Idle,
        }
    }

    /// Build a poller from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = ManagementClient::from_config(&config.broker)?;
        let extractor = MetricExtractor::new(ExtractorConfig::from_config(config));
        let sink = CarbonSink::from_config(&config.carbon);

        Ok(Self::new(client, extractor, sink)
            .with_interval(config.interval())
            .with_queues(config.report.queues))
    }

    /// Set the sleep between rounds
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set whether per-queue and per-exchange stats are collected
    pub fn with_queues(mut self, report_queues: bool) -> Self {
        self.report_queues = report_queues;
        self
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn sink(&self) -> &CarbonSink {
        &self.sink
    }

    /// Run one full round: fetch, extract, flush
    ///
    /// A failed `overview` fetch skips the overview and system steps only;
    /// queue/exchange steps and the flush still run.
    pub async fn run_round(&mut self) -> RoundReport {
        self.state = PollState::Running;
        let start = Instant::now();
        let mut report = RoundReport::default();

        let overview = report
            .isolate("overview", async {
                Ok::<_, StepError>(self.client.get(&Resource::Overview).await?)
            })
            .await;

        if let Some(overview) = overview {
            for group in OVERVIEW.groups {
                let points = report
                    .isolate(group.name(), async {
                        Ok::<_, StepError>(self.extractor.overview_group(&overview, group)?)
                    })
                    .await;
                self.buffer(&mut report, points);
            }

            let points = report.isolate("system", self.system(&overview)).await;
            self.buffer(&mut report, points);
        }

        if self.report_queues {
            let points = report
                .isolate("queues", self.fetch_and_extract(Resource::Queues, MetricExtractor::queues))
                .await;
            self.buffer(&mut report, points);

            let points = report
                .isolate(
                    "exchanges",
                    self.fetch_and_extract(Resource::Exchanges, MetricExtractor::exchanges),
                )
                .await;
            self.buffer(&mut report, points);
        }

        let sink = &mut self.sink;
        if let Some(sent) = report
            .isolate("flush", async { Ok::<_, StepError>(sink.flush().await?) })
            .await
        {
            report.sent = sent;
        }

        report.duration = start.elapsed();
        self.state = PollState::Idle;
        report
    }

    /// Run rounds until `shutdown` resolves
    ///
    /// The round in progress is abandoned on shutdown; its buffered points are
    /// dropped with the poller.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            interval_secs = self.interval.as_secs(),
            queues = self.report_queues,
            collector = %self.sink.addr(),
            "Starting poll loop"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                report = self.run_round() => report.log(),
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Poll loop stopped");
    }

    async fn system(&self, overview: &ResourceDocument) -> Result<Vec<MetricPoint>, StepError> {
        let node = MetricExtractor::node_id(overview)?;
        self.fetch_and_extract(Resource::Node(node), MetricExtractor::system)
            .await
    }

    async fn fetch_and_extract(
        &self,
        resource: Resource,
        extract: Extract,
    ) -> Result<Vec<MetricPoint>, StepError> {
        let document = self.client.get(&resource).await?;
        Ok(extract(&self.extractor, &document)?)
    }

    fn buffer(&mut self, report: &mut RoundReport, points: Option<Vec<MetricPoint>>) {
        if let Some(points) = points {
            report.points += points.len();
            self.sink.extend(points);
        }
    }
}

/// Wait for Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
