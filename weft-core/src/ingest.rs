//! The graph ingestion pipeline, the engine's only write path.
//!
//! One completed scrape enters as a payload; the pipeline extracts and
//! caps entities, diffs them against the source's stored state, upserts
//! nodes and co-occurrence edges, persists the diff records, and appends
//! one snapshot. Every write is an idempotent insert-or-increment, so an
//! aborted run can be retried without double-counting.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{IngestSection, WeftConfig};
use crate::diff::{compute_diff, count_diffs};
use crate::error::{IngestError, WeftError};
use crate::extract::extract_entities;
use crate::store::GraphStore;
use crate::types::{IngestReport, NodeId, SourceId};

/// Pipeline stages, in execution order. A failed run is tagged with the
/// stage that aborted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Extracting,
    Capping,
    Diffing,
    Upserting,
    Snapshotting,
}

impl IngestStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extracting => "extracting",
            Self::Capping => "capping",
            Self::Diffing => "diffing",
            Self::Upserting => "upserting",
            Self::Snapshotting => "snapshotting",
        }
    }
}

impl std::fmt::Display for IngestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs scrape payloads through extraction, diffing and graph mutation.
#[derive(Debug)]
pub struct IngestPipeline {
    config: IngestSection,
}

impl IngestPipeline {
    pub fn new(config: &WeftConfig) -> Self {
        Self {
            config: config.ingest.clone(),
        }
    }

    /// Ingest one scrape payload for a source.
    ///
    /// The clock and the optional scrape-run id come from the caller, so
    /// repeat runs over the same input are fully deterministic. Returns
    /// what the run touched; a store failure aborts the whole run with
    /// the counts committed up to that point.
    pub async fn ingest(
        &self,
        store: &dyn GraphStore,
        source: &SourceId,
        payload: &Value,
        run_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> crate::error::Result<IngestReport> {
        let started = Instant::now();

        let mut entities = extract_entities(payload);
        if entities.is_empty() {
            debug!(source = %source, "Payload yielded no entities, nothing to ingest");
            return Ok(IngestReport::default());
        }
        entities.truncate(self.config.max_entities);

        let previous = store
            .entity_states(source)
            .await
            .map_err(|e| Self::abort(IngestStage::Diffing, source, 0, 0, e))?;
        let mut diffs = compute_diff(&previous, &entities);
        diffs.truncate(self.config.max_diffs);

        let ids = store
            .upsert_nodes_batch(source, &entities, now)
            .await
            .map_err(|e| Self::abort(IngestStage::Upserting, source, 0, 0, e))?;
        let node_ids: Vec<NodeId> = ids.into_iter().flatten().collect();
        let nodes_processed = node_ids.len() as u64;

        let pairs = cooccurrence_pairs(&node_ids, self.config.max_edge_pairs);
        let edges_processed = store
            .upsert_edges_batch(source, &pairs, now)
            .await
            .map_err(|e| Self::abort(IngestStage::Upserting, source, nodes_processed, 0, e))?;

        store
            .insert_diffs(source, run_id, &diffs, now)
            .await
            .map_err(|e| {
                Self::abort(IngestStage::Upserting, source, nodes_processed, edges_processed, e)
            })?;

        store
            .record_snapshot(source, diffs.len() as i64, now)
            .await
            .map_err(|e| {
                Self::abort(IngestStage::Snapshotting, source, nodes_processed, edges_processed, e)
            })?;

        let report = IngestReport {
            nodes_processed,
            edges_processed,
            diffs: count_diffs(&diffs),
        };
        info!(
            source = %source,
            nodes = report.nodes_processed,
            edges = report.edges_processed,
            diffs = report.diffs.total(),
            elapsed = ?started.elapsed(),
            "Ingestion complete"
        );
        Ok(report)
    }

    /// Wrap a store failure with the stage it hit and the progress made.
    /// Non-store errors pass through untouched.
    fn abort(
        stage: IngestStage,
        source: &SourceId,
        nodes_processed: u64,
        edges_processed: u64,
        err: WeftError,
    ) -> WeftError {
        match err {
            WeftError::Store(cause) => {
                warn!(source = %source, stage = %stage, error = %cause, "Ingestion aborted");
                WeftError::Ingest(IngestError::Aborted {
                    stage,
                    source: source.clone(),
                    nodes_processed,
                    edges_processed,
                    cause,
                })
            }
            other => other,
        }
    }
}

/// Unordered pairs among the given node ids, walked in extraction order
/// until the cap. When the cap bites, earlier-discovered entities keep
/// their pairings at the expense of a full combinatorial expansion.
fn cooccurrence_pairs(ids: &[NodeId], cap: usize) -> Vec<(NodeId, NodeId)> {
    let mut pairs = Vec::new();
    for i in 0..ids.len() {
        if pairs.len() >= cap {
            break;
        }
        for j in (i + 1)..ids.len() {
            if pairs.len() >= cap {
                break;
            }
            pairs.push((ids[i], ids[j]));
        }
    }
    pairs
}
