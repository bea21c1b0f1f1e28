//! Metric extraction
//!
//! Walks management API documents and turns the stats declared in the
//! [naming scheme](super::scheme) into flat [`MetricPoint`]s. Values are read
//! through total accessors, so a missing or null stat becomes `0` rather than
//! an error. Errors are raised only when a document has the wrong shape or
//! lacks a field the round depends on (the overview's `node`).

use crate::collector::{ResourceDocument, Section};
use crate::config::Config;
use crate::error::ExtractError;

use super::scheme::{
    MetricPath, NamingScheme, Presence, ResourceKind, StatGroup, StatKind, EXCHANGES, OVERVIEW,
    QUEUES, SYSTEM,
};

/// A single metric point ready to be buffered
///
/// The timestamp is assigned when the batch is flushed.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    /// Dotted metric name
    pub name: String,
    /// Metric value, always finite
    pub value: f64,
}

impl MetricPoint {
    /// Create a new point
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Extraction settings
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// First segment of every metric name
    pub prefix: String,
    /// Keep auto-delete queues in per-queue stats
    pub include_auto_delete: bool,
}

impl ExtractorConfig {
    /// Settings for `prefix` with auto-delete queues skipped
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            include_auto_delete: false,
        }
    }

    /// Set whether auto-delete queues are reported
    pub fn with_auto_delete(mut self, include: bool) -> Self {
        self.include_auto_delete = include;
        self
    }

    /// Build from the prefix and report section of the configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.prefix.clone()).with_auto_delete(config.report.include_auto_delete)
    }
}

/// Turns management API documents into metric points
#[derive(Debug, Clone)]
pub struct MetricExtractor {
    config: ExtractorConfig,
}

impl MetricExtractor {
    /// Create a new extractor
    ///
    /// # Example
    ///
    /// ```ignore
    /// use rabbitmq_watcher::transformer::{ExtractorConfig, MetricExtractor, OBJECT_TOTALS};
    ///
    /// let extractor = MetricExtractor::new(ExtractorConfig::new("host1"));
    /// let points = extractor.overview_group(&overview, &OBJECT_TOTALS)?;
    /// ```
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extraction settings in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// One group of the overview document (`object_totals`,
    /// `message_stats` or `queue_totals`)
    pub fn overview_group(
        &self,
        overview: &ResourceDocument,
        group: &StatGroup,
    ) -> Result<Vec<MetricPoint>, ExtractError> {
        let root = overview.object()?;
        let path = self.path(ResourceKind::Overview);

        let mut points = Vec::with_capacity(group.point_count());
        extract_group(root, &path, group, &mut points)?;
        Ok(points)
    }

    /// Every group of the overview document
    pub fn overview(&self, overview: &ResourceDocument) -> Result<Vec<MetricPoint>, ExtractError> {
        let mut points = Vec::new();
        for group in OVERVIEW.groups {
            points.extend(self.overview_group(overview, group)?);
        }
        Ok(points)
    }

    /// Node the overview was served by, used to fetch `nodes/<id>`
    pub fn node_id(overview: &ResourceDocument) -> Result<String, ExtractError> {
        overview
            .object()?
            .string("node")
            .filter(|node| !node.is_empty())
            .map(str::to_string)
            .ok_or(ExtractError::MissingField("node"))
    }

    /// Node resource usage from a `nodes/<id>` document
    pub fn system(&self, node: &ResourceDocument) -> Result<Vec<MetricPoint>, ExtractError> {
        let root = node.object()?;
        let path = self.path(SYSTEM.kind);

        let mut points = Vec::new();
        for group in SYSTEM.groups {
            extract_group(root, &path, group, &mut points)?;
        }
        Ok(points)
    }

    /// Per-queue stats from the `queues` list
    pub fn queues(&self, queues: &ResourceDocument) -> Result<Vec<MetricPoint>, ExtractError> {
        self.instances(queues, &QUEUES, |queue, name| {
            if !self.config.include_auto_delete && queue.flag("auto_delete") {
                tracing::trace!(queue = %name, "Skipping auto-delete queue");
                return false;
            }
            true
        })
    }

    /// Per-exchange stats from the `exchanges` list
    pub fn exchanges(&self, exchanges: &ResourceDocument) -> Result<Vec<MetricPoint>, ExtractError> {
        self.instances(exchanges, &EXCHANGES, |_, _| true)
    }

    fn instances<F>(
        &self,
        list: &ResourceDocument,
        scheme: &NamingScheme,
        keep: F,
    ) -> Result<Vec<MetricPoint>, ExtractError>
    where
        F: Fn(Section<'_>, &str) -> bool,
    {
        let base = self.path(scheme.kind);
        let mut points = Vec::new();

        for item in list.items()? {
            let Some(name) = item.string("name") else {
                continue;
            };
            if !keep(item, name) {
                continue;
            }

            let path = base.instance(name);
            for group in scheme.groups {
                extract_group(item, &path, group, &mut points)?;
            }
        }

        Ok(points)
    }

    fn path(&self, kind: ResourceKind) -> MetricPath {
        MetricPath::new(&self.config.prefix, kind)
    }
}

fn extract_group(
    parent: Section<'_>,
    path: &MetricPath,
    group: &StatGroup,
    points: &mut Vec<MetricPoint>,
) -> Result<(), ExtractError> {
    let section = match group.section {
        None => Some(parent),
        Some(key) => match parent.child(key) {
            Some(section) => Some(section),
            None if group.presence == Presence::Optional => return Ok(()),
            None => match parent.kind_of(key) {
                None | Some("null") => None,
                Some(found) => {
                    return Err(ExtractError::UnexpectedShape {
                        what: key.to_string(),
                        expected: "object",
                        found,
                    });
                }
            },
        },
    };

    let path = match group.segment {
        Some(segment) => path.child(segment),
        None => path.clone(),
    };

    for stat in group.stats {
        let value = section.map(|s| s.number(stat)).unwrap_or(0.0);
        match group.kind {
            StatKind::Simple => points.push(MetricPoint::new(path.leaf(stat), value)),
            StatKind::Detailed => {
                let rate = section
                    .and_then(|s| s.child(&format!("{}_details", stat)))
                    .map(|details| details.number("rate"))
                    .unwrap_or(0.0);

                let stat_path = path.child(stat);
                points.push(MetricPoint::new(stat_path.leaf("count"), value));
                points.push(MetricPoint::new(stat_path.leaf("rate"), rate));
            }
        }
    }

    Ok(())
}
