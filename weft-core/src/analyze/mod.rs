//! Analytics over the stored co-occurrence graph.
//!
//! Anomalies, trends, and hubs are computed from the full per-source
//! population so that baselines stay stable as the query window moves;
//! the timeline, diff feed, and headline stats are windowed.

pub mod anomaly;
pub mod graph;
pub mod hub;
pub mod trend;

use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::store::GraphStore;
use crate::types::{
    AnalyticsStats, EdgeFilter, GraphAnalytics, NodeFilter, SourceId,
};

pub use anomaly::detect_anomalies;
pub use graph::CooccurrenceGraph;
pub use hub::{MAX_HUBS, compute_hubs};
pub use trend::{MAX_TRENDS, compute_trends};

/// Anomaly lists are capped after counting, so the headline count still
/// reflects the full total.
pub const MAX_ANOMALIES: usize = 50;

/// Diff feeds return at most this many recent records.
pub const MAX_DIFF_FEED: u32 = 50;

/// Compute the full analytics bundle for one source, or across all
/// sources when `source` is `None`.
pub async fn compute_analytics(
    store: &dyn GraphStore,
    source: Option<&SourceId>,
    window_start: DateTime<Utc>,
) -> crate::error::Result<GraphAnalytics> {
    let started = Instant::now();

    let nodes = store
        .find_nodes(&NodeFilter {
            source: source.cloned(),
            seen_since: None,
            limit: None,
        })
        .await?;
    let edges = store
        .find_edges(&EdgeFilter {
            source: source.cloned(),
            seen_since: None,
            limit: None,
        })
        .await?;
    let timeline = store.list_snapshots(source, Some(window_start)).await?;
    let diffs = store
        .find_diffs(source, Some(window_start), Some(MAX_DIFF_FEED))
        .await?;
    let diff_count = store.count_diffs(source, Some(window_start)).await?;

    let mut anomalies = detect_anomalies(&nodes, window_start);
    let anomaly_count = anomalies.len() as u64;
    anomalies.truncate(MAX_ANOMALIES);

    let cooccurrence = CooccurrenceGraph::from_edges(&edges);
    let hubs = compute_hubs(&nodes, &cooccurrence);
    let trends = compute_trends(&nodes, &timeline);

    let stats = AnalyticsStats {
        total_nodes: nodes.iter().filter(|n| n.last_seen_at >= window_start).count() as u64,
        total_edges: edges.iter().filter(|e| e.last_seen_at >= window_start).count() as u64,
        anomaly_count,
        diff_count,
        last_updated: nodes.iter().map(|n| n.last_seen_at).max(),
    };

    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        anomalies = anomaly_count,
        elapsed = ?started.elapsed(),
        "Computed graph analytics"
    );

    Ok(GraphAnalytics {
        anomalies,
        trends,
        hubs,
        timeline,
        diffs,
        stats,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::{AnomalyKind, DiffKind, Entity, EntityDiff, EntityKind};
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    fn entity(key: &str) -> Entity {
        Entity::new(key.to_string(), EntityKind::Text, key.to_string())
    }

    #[tokio::test]
    async fn empty_store_yields_empty_analytics() {
        let store = SqliteStore::in_memory().unwrap();
        let analytics = compute_analytics(&store, None, ts(1, 0)).await.unwrap();

        assert!(analytics.anomalies.is_empty());
        assert!(analytics.trends.is_empty());
        assert!(analytics.hubs.is_empty());
        assert!(analytics.timeline.is_empty());
        assert!(analytics.diffs.is_empty());
        assert_eq!(analytics.stats.total_nodes, 0);
        assert_eq!(analytics.stats.last_updated, None);
        assert!(analytics.error.is_none());
    }

    #[tokio::test]
    async fn bundle_covers_every_section() {
        let store = SqliteStore::in_memory().unwrap();
        let source = SourceId::new("feed-1");

        // Two connected entities seen twice, one fresh singleton.
        for hour in [1, 2] {
            let a = store.upsert_node(&source, &entity("text:alpha"), ts(1, hour)).await.unwrap();
            let b = store.upsert_node(&source, &entity("text:beta"), ts(1, hour)).await.unwrap();
            store.upsert_edge(&source, a, b, ts(1, hour)).await.unwrap();
        }
        store.upsert_node(&source, &entity("text:gamma"), ts(1, 3)).await.unwrap();

        let diff = EntityDiff {
            kind: DiffKind::New,
            key: "text:gamma".to_string(),
            entity_kind: EntityKind::Text,
            old_value: None,
            new_value: Some("gamma".to_string()),
            occurrence_delta: 1,
        };
        store.insert_diffs(&source, None, &[diff], ts(1, 3)).await.unwrap();
        store.record_snapshot(&source, 1, ts(1, 3)).await.unwrap();

        let analytics = compute_analytics(&store, Some(&source), ts(1, 0)).await.unwrap();

        assert_eq!(analytics.stats.total_nodes, 3);
        assert_eq!(analytics.stats.total_edges, 1);
        assert_eq!(analytics.stats.last_updated, Some(ts(1, 3)));
        assert_eq!(analytics.stats.diff_count.new, 1);

        // Gamma first appeared inside the window with a single sighting.
        assert_eq!(analytics.anomalies.len(), 1);
        assert_eq!(analytics.anomalies[0].kind, AnomalyKind::NewEntity);

        // Alpha and beta each have two sightings and one partner.
        assert_eq!(analytics.trends.len(), 2);
        assert_eq!(analytics.hubs.len(), 2);
        assert_eq!(analytics.hubs[0].degree, 1);

        assert_eq!(analytics.timeline.len(), 1);
        assert_eq!(analytics.diffs.len(), 1);
        assert_eq!(analytics.diffs[0].key, "text:gamma");
    }

    #[tokio::test]
    async fn anomaly_count_is_taken_before_the_cap() {
        let store = SqliteStore::in_memory().unwrap();
        let source = SourceId::new("feed-1");

        // Sixty fresh singletons: every one is a new-entity anomaly.
        for i in 0..60 {
            store
                .upsert_node(&source, &entity(&format!("text:entity-{i}")), ts(2, 0))
                .await
                .unwrap();
        }

        let analytics = compute_analytics(&store, Some(&source), ts(1, 0)).await.unwrap();

        assert_eq!(analytics.anomalies.len(), MAX_ANOMALIES);
        assert_eq!(analytics.stats.anomaly_count, 60);
    }

    #[tokio::test]
    async fn stats_window_excludes_stale_rows_but_baselines_do_not() {
        let store = SqliteStore::in_memory().unwrap();
        let source = SourceId::new("feed-1");

        store.upsert_node(&source, &entity("text:old"), ts(1, 0)).await.unwrap();
        store.upsert_node(&source, &entity("text:fresh"), ts(10, 0)).await.unwrap();

        let analytics = compute_analytics(&store, Some(&source), ts(5, 0)).await.unwrap();

        // Only the fresh node is inside the window, but the stale one still
        // anchors the population and only the fresh one counts as new.
        assert_eq!(analytics.stats.total_nodes, 1);
        assert_eq!(analytics.stats.last_updated, Some(ts(10, 0)));
        assert_eq!(analytics.anomalies.len(), 1);
        assert_eq!(analytics.anomalies[0].node.key, "text:fresh");
    }

    #[tokio::test]
    async fn source_scoping_limits_the_population() {
        let store = SqliteStore::in_memory().unwrap();
        let feed_1 = SourceId::new("feed-1");
        let feed_2 = SourceId::new("feed-2");

        store.upsert_node(&feed_1, &entity("text:alpha"), ts(1, 0)).await.unwrap();
        store.upsert_node(&feed_2, &entity("text:beta"), ts(1, 0)).await.unwrap();

        let scoped = compute_analytics(&store, Some(&feed_1), ts(1, 0)).await.unwrap();
        assert_eq!(scoped.stats.total_nodes, 1);

        let global = compute_analytics(&store, None, ts(1, 0)).await.unwrap();
        assert_eq!(global.stats.total_nodes, 2);
    }
}
