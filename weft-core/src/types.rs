use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Row identifiers ────────────────────────────────────────────────

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

typed_id!(NodeId);
typed_id!(EdgeId);
typed_id!(SnapshotId);
typed_id!(DiffId);

/// Opaque identifier for a scraped data source. Assigned by the caller
/// (the scraper admin layer); the engine only scopes state by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ── Entity types ───────────────────────────────────────────────────

/// Classification assigned to an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A field name observed anywhere in the payload structure.
    Field,
    /// A string value matching a `http(s)://` prefix.
    Url,
    /// A string value with an ISO-date-like prefix (`YYYY-MM-DD...`).
    Date,
    /// Any other short string value.
    Text,
    /// A numeric value, identified by its path and value together.
    Number,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Url => "url",
            Self::Date => "date",
            Self::Text => "text",
            Self::Number => "number",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed fact extracted from one payload. Transient: entities live only
/// for the duration of the ingestion call that produced them.
///
/// `key` is the canonical type-prefixed identity (`url:https://...`,
/// `text:<lowercased>`, `num:<path>:<value>`) and is what node identity is
/// scoped on within a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub key: String,
    pub kind: EntityKind,
    /// Display value, original casing preserved.
    pub value: String,
}

impl Entity {
    pub fn new(key: impl Into<String>, kind: EntityKind, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            value: value.into(),
        }
    }
}

// ── Persistent graph types ─────────────────────────────────────────

/// A graph vertex: one entity observed over time for one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub source: SourceId,
    pub key: String,
    pub kind: EntityKind,
    /// Most recently observed display value.
    pub value: String,
    /// Number of scrapes in which this key appeared. Never decreases.
    pub occurrence_count: i64,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// A weighted undirected relation between two nodes that co-occurred in
/// the same scrape. Stored once per unordered pair: `node_a < node_b`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: SourceId,
    pub node_a: NodeId,
    pub node_b: NodeId,
    /// One increment per scrape in which both endpoints co-occurred.
    pub weight: i64,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Canonical ordering for an undirected node pair (smaller id first).
pub fn canonical_pair(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Append-only record of graph size at the end of one ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub source: SourceId,
    pub node_count: i64,
    pub edge_count: i64,
    /// Number of diff records the producing ingestion persisted.
    pub anomaly_count: i64,
    pub avg_occurrence: f64,
    pub created_at: DateTime<Utc>,
}

// ── Diff types ─────────────────────────────────────────────────────

/// How an entity's state changed between two consecutive ingestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    New,
    Disappeared,
    Changed,
    /// Present with an identical value. Part of the diff vocabulary but
    /// never persisted; stable keys emit no record.
    Stable,
}

impl DiffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Disappeared => "disappeared",
            Self::Changed => "changed",
            Self::Stable => "stable",
        }
    }
}

impl std::fmt::Display for DiffKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A computed diff for one entity key, before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDiff {
    pub kind: DiffKind,
    pub key: String,
    pub entity_kind: EntityKind,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub occurrence_delta: i64,
}

/// A persisted diff record, tagged with the scrape run that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffRecord {
    pub id: DiffId,
    pub source: SourceId,
    pub run_id: Option<Uuid>,
    pub kind: DiffKind,
    pub key: String,
    pub entity_kind: EntityKind,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub occurrence_delta: i64,
    pub created_at: DateTime<Utc>,
}

/// Prior observed state of one entity key, loaded in bulk for diffing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityState {
    pub kind: EntityKind,
    pub value: String,
    pub occurrence_count: i64,
}

/// Diff tallies by kind (stable excluded, since it is never materialized).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffCounts {
    pub new: u64,
    pub disappeared: u64,
    pub changed: u64,
}

impl DiffCounts {
    pub fn total(&self) -> u64 {
        self.new + self.disappeared + self.changed
    }
}

/// What one ingestion touched, reported to the caller.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub nodes_processed: u64,
    pub edges_processed: u64,
    pub diffs: DiffCounts,
}

// ── Read filters and summaries ─────────────────────────────────────

/// Filter for reading nodes. Results are ordered by `occurrence_count`
/// descending.
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    pub source: Option<SourceId>,
    /// Only nodes last seen at or after this instant.
    pub seen_since: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

/// Filter for reading edges. Results are ordered by `weight` descending.
#[derive(Debug, Clone, Default)]
pub struct EdgeFilter {
    pub source: Option<SourceId>,
    pub seen_since: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

/// Whole-store tallies backing `weft status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_nodes: u64,
    pub total_edges: u64,
    pub total_snapshots: u64,
    pub total_diffs: u64,
    /// Node count broken down by source.
    pub nodes_by_source: HashMap<String, u64>,
    /// Database file size in bytes (0 for in-memory stores).
    pub db_size_bytes: u64,
}

// ── Analytics types ────────────────────────────────────────────────

/// Anomaly severity, ordered so that `Critical` compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Occurrence count far above the source's population mean.
    Spike,
    /// First observed within the query window, seen exactly once.
    NewEntity,
}

/// A node whose occurrence statistics stand out from the population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub node: Node,
    pub kind: AnomalyKind,
    pub severity: Severity,
    /// Standard deviations above the mean (0 for `NewEntity`).
    pub deviation: f64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Declining,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Declining => "declining",
            Self::Stable => "stable",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Occurrence growth over a node's observed lifespan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trend {
    pub node: Node,
    pub direction: TrendDirection,
    /// Occurrences per hour of lifespan, rounded to 2 decimal places.
    pub change_rate: f64,
    /// Historical node counts from the source's snapshots in the window.
    pub sparkline: Vec<i64>,
}

/// A node with unusually many co-occurrence partners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hub {
    pub node: Node,
    pub degree: u64,
}

/// Window-scoped summary statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsStats {
    /// Nodes last seen within the window.
    pub total_nodes: u64,
    /// Edges last seen within the window.
    pub total_edges: u64,
    /// All detected anomalies, before the response cap.
    pub anomaly_count: u64,
    pub diff_count: DiffCounts,
    /// Latest node observation in scope, regardless of window.
    pub last_updated: Option<DateTime<Utc>>,
}

/// Derived insights for one query window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphAnalytics {
    pub anomalies: Vec<Anomaly>,
    pub trends: Vec<Trend>,
    pub hubs: Vec<Hub>,
    pub timeline: Vec<Snapshot>,
    pub diffs: Vec<DiffRecord>,
    pub stats: AnalyticsStats,
    /// Set when analytics failed or timed out and the payload is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GraphAnalytics {
    /// Empty payload carrying an error indicator, for degraded reads.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::default()
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────
