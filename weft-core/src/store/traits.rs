use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{
    DiffCounts, DiffRecord, Edge, EdgeFilter, EdgeId, Entity, EntityDiff, EntityState, Node,
    NodeFilter, NodeId, Snapshot, SourceId, StoreStats,
};

/// The storage abstraction. Ingestion and the query façade read and write
/// through this trait; nothing above it touches SQL.
#[async_trait::async_trait]
pub trait GraphStore: Send + Sync {
    // ── Nodes ──────────────────────────────────────────────────────

    /// Insert a node for `(source, entity.key)`, or bump its occurrence
    /// count and refresh value, kind and last-seen if it already exists.
    /// Insert-or-increment is a single atomic statement. Returns the
    /// node's ID.
    async fn upsert_node(
        &self,
        source: &SourceId,
        entity: &Entity,
        now: DateTime<Utc>,
    ) -> crate::error::Result<NodeId>;

    /// Batch upsert within one transaction. The result is aligned with the
    /// input slice: `None` marks a row skipped after a row-level failure.
    async fn upsert_nodes_batch(
        &self,
        source: &SourceId,
        entities: &[Entity],
        now: DateTime<Utc>,
    ) -> crate::error::Result<Vec<Option<NodeId>>>;

    /// Look up a node by row id.
    async fn get_node(&self, id: NodeId) -> crate::error::Result<Option<Node>>;

    /// Get a node by its source and canonical entity key.
    async fn get_node_by_key(
        &self,
        source: &SourceId,
        key: &str,
    ) -> crate::error::Result<Option<Node>>;

    /// Find nodes matching a filter, ordered by occurrence count descending.
    async fn find_nodes(&self, filter: &NodeFilter) -> crate::error::Result<Vec<Node>>;

    /// Bulk-load the stored entity state of a source, keyed by entity key.
    /// This is the "previous scrape" side of a diff.
    async fn entity_states(
        &self,
        source: &SourceId,
    ) -> crate::error::Result<HashMap<String, EntityState>>;

    // ── Edges ──────────────────────────────────────────────────────

    /// Insert a co-occurrence edge or bump its weight. The endpoint pair
    /// is canonicalized here, so argument order never splits an edge into
    /// two rows.
    async fn upsert_edge(
        &self,
        source: &SourceId,
        a: NodeId,
        b: NodeId,
        now: DateTime<Utc>,
    ) -> crate::error::Result<EdgeId>;

    /// Batch upsert pairs within one transaction. Returns the number of
    /// rows written; rows hitting a row-level failure are skipped.
    async fn upsert_edges_batch(
        &self,
        source: &SourceId,
        pairs: &[(NodeId, NodeId)],
        now: DateTime<Utc>,
    ) -> crate::error::Result<u64>;

    /// Find edges matching a filter, ordered by weight descending.
    async fn find_edges(&self, filter: &EdgeFilter) -> crate::error::Result<Vec<Edge>>;

    // ── Diff records ───────────────────────────────────────────────

    /// Append diff records for one ingestion run. Returns the count written.
    async fn insert_diffs(
        &self,
        source: &SourceId,
        run_id: Option<Uuid>,
        diffs: &[EntityDiff],
        now: DateTime<Utc>,
    ) -> crate::error::Result<u64>;

    /// Read diff records, newest first. `None` spans all sources.
    async fn find_diffs(
        &self,
        source: Option<&SourceId>,
        since: Option<DateTime<Utc>>,
        limit: Option<u32>,
    ) -> crate::error::Result<Vec<DiffRecord>>;

    /// Tally diff records by kind without loading them. `None` spans all
    /// sources.
    async fn count_diffs(
        &self,
        source: Option<&SourceId>,
        since: Option<DateTime<Utc>>,
    ) -> crate::error::Result<DiffCounts>;

    // ── Snapshots ──────────────────────────────────────────────────

    /// Record a snapshot of the source's current graph totals. Node and
    /// edge counts and the occurrence average are computed from stored
    /// rows at call time.
    async fn record_snapshot(
        &self,
        source: &SourceId,
        anomaly_count: i64,
        now: DateTime<Utc>,
    ) -> crate::error::Result<Snapshot>;

    /// List snapshots, oldest first. `None` spans all sources.
    async fn list_snapshots(
        &self,
        source: Option<&SourceId>,
        since: Option<DateTime<Utc>>,
    ) -> crate::error::Result<Vec<Snapshot>>;

    // ── Store totals ───────────────────────────────────────────────

    /// Summary statistics about the store.
    async fn stats(&self) -> crate::error::Result<StoreStats>;
}
