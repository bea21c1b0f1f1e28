//! Naming scheme
//!
//! Static declaration of which stats are read from each resource kind and
//! how their metric names are built:
//!
//! ```text
//! {prefix}.{resource_type}[.{instance}].{stat}[.count|.rate]
//! ```

use std::borrow::Cow;

/// Replacement for an empty instance name (the default exchange is `""`)
pub const DEFAULT_INSTANCE: &str = "_default";

/// Resource kinds that produce metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Overview,
    System,
    Queues,
    Exchanges,
}

impl ResourceKind {
    /// Resource-type segment of the metric name
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Overview => "overview",
            ResourceKind::System => "system",
            ResourceKind::Queues => "queues",
            ResourceKind::Exchanges => "exchanges",
        }
    }
}

/// How a stat is turned into points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    /// `{path}.{stat}` from the field itself
    Simple,
    /// `{path}.{stat}.count` from the field and `{path}.{stat}.rate` from
    /// `{stat}_details.rate`
    Detailed,
}

/// What to do when a group's section is missing from the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Missing section reads as empty: every stat is emitted as `0`
    Required,
    /// Missing section emits nothing
    Optional,
}

/// A set of stats read from one section of a document
#[derive(Debug, Clone, Copy)]
pub struct StatGroup {
    /// Sub-object holding the stats, `None` for the document itself
    pub section: Option<&'static str>,
    /// Extra name segment after the resource type/instance
    pub segment: Option<&'static str>,
    pub kind: StatKind,
    pub presence: Presence,
    pub stats: &'static [&'static str],
}

impl StatGroup {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        self.segment.or(self.section).unwrap_or("stats")
    }

    /// Points this group produces for one fully populated section
    pub fn point_count(&self) -> usize {
        match self.kind {
            StatKind::Simple => self.stats.len(),
            StatKind::Detailed => self.stats.len() * 2,
        }
    }
}

/// Stat groups for one resource kind
#[derive(Debug, Clone, Copy)]
pub struct NamingScheme {
    pub kind: ResourceKind,
    pub groups: &'static [StatGroup],
}

pub const OBJECT_TOTALS: StatGroup = StatGroup {
    section: Some("object_totals"),
    segment: Some("object_totals"),
    kind: StatKind::Simple,
    presence: Presence::Required,
    stats: &["channels", "connections", "consumers", "exchanges", "queues"],
};

pub const MESSAGE_STATS: StatGroup = StatGroup {
    section: Some("message_stats"),
    segment: Some("message_stats"),
    kind: StatKind::Detailed,
    presence: Presence::Required,
    stats: &[
        "publish",
        "publish_in",
        "publish_out",
        "confirm",
        "deliver",
        "deliver_noack",
        "get",
        "get_noack",
        "deliver_get",
        "redeliver",
        "return",
    ],
};

pub const QUEUE_TOTALS: StatGroup = StatGroup {
    section: Some("queue_totals"),
    segment: Some("queue_totals"),
    kind: StatKind::Detailed,
    presence: Presence::Required,
    stats: &["messages", "messages_ready", "messages_unacknowledged"],
};

pub const OVERVIEW: NamingScheme = NamingScheme {
    kind: ResourceKind::Overview,
    groups: &[OBJECT_TOTALS, MESSAGE_STATS, QUEUE_TOTALS],
};

pub const SYSTEM: NamingScheme = NamingScheme {
    kind: ResourceKind::System,
    groups: &[StatGroup {
        section: None,
        segment: None,
        kind: StatKind::Simple,
        presence: Presence::Required,
        stats: &[
            "disk_free",
            "disk_free_limit",
            "fd_total",
            "fd_used",
            "mem_used",
            "mem_limit",
            "proc_total",
            "proc_used",
            "processors",
            "run_queue",
            "sockets_total",
            "sockets_used",
            "uptime",
        ],
    }],
};

pub const QUEUES: NamingScheme = NamingScheme {
    kind: ResourceKind::Queues,
    groups: &[
        StatGroup {
            section: None,
            segment: None,
            kind: StatKind::Simple,
            presence: Presence::Required,
            stats: &[
                "active_consumers",
                "consumers",
                "memory",
                "messages",
                "messages_ready",
                "messages_unacknowledged",
            ],
        },
        StatGroup {
            section: Some("backing_queue_status"),
            segment: None,
            kind: StatKind::Simple,
            presence: Presence::Optional,
            stats: &["avg_egress_rate", "avg_ingress_rate"],
        },
        StatGroup {
            section: Some("message_stats"),
            segment: None,
            kind: StatKind::Detailed,
            presence: Presence::Optional,
            stats: &["ack", "deliver_get", "deliver", "publish"],
        },
    ],
};

pub const EXCHANGES: NamingScheme = NamingScheme {
    kind: ResourceKind::Exchanges,
    groups: &[StatGroup {
        section: Some("message_stats"),
        segment: None,
        kind: StatKind::Detailed,
        presence: Presence::Optional,
        stats: &["confirm", "publish_in", "publish_out"],
    }],
};

/// Make a resource instance name safe to use as one path segment
///
/// `.` would split the segment and whitespace would break the line
/// protocol, so both become `_`. An empty name becomes [`DEFAULT_INSTANCE`].
pub fn sanitize_instance(name: &str) -> Cow<'_, str> {
    if name.is_empty() {
        return Cow::Borrowed(DEFAULT_INSTANCE);
    }

    if name.chars().any(|c| c == '.' || c.is_whitespace()) {
        Cow::Owned(
            name.chars()
                .map(|c| if c == '.' || c.is_whitespace() { '_' } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(name)
    }
}

/// Dotted metric name under construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricPath(String);

impl MetricPath {
    /// `{prefix}.{resource_type}`
    pub fn new(prefix: &str, kind: ResourceKind) -> Self {
        Self(format!("{}.{}", prefix, kind.as_str()))
    }

    /// Append a sanitized resource instance segment
    pub fn instance(&self, name: &str) -> Self {
        self.child(&sanitize_instance(name))
    }

    /// Append a literal segment
    pub fn child(&self, segment: &str) -> Self {
        Self(format!("{}.{}", self.0, segment))
    }

    /// Full metric name for `stat`
    pub fn leaf(&self, stat: &str) -> String {
        format!("{}.{}", self.0, stat)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
