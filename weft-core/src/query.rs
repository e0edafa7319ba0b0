//! The query façade, the engine's read boundary.
//!
//! Callers hand in a time-range token and an optional source filter; the
//! façade validates the range, assembles the capped visualization graph,
//! and attaches the analytics bundle. Analytics failures and timeouts
//! degrade to an empty payload with an error indicator instead of
//! failing the whole response.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analyze::compute_analytics;
use crate::error::QueryError;
use crate::store::GraphStore;
use crate::types::{Edge, EdgeFilter, GraphAnalytics, Node, NodeFilter, NodeId, SourceId};

/// Nodes returned per graph response, keeping visualizations renderable.
pub const MAX_GRAPH_NODES: u32 = 150;

/// Edges returned per graph response.
pub const MAX_GRAPH_EDGES: u32 = 300;

/// Analytics budget when the caller does not specify one.
pub const DEFAULT_ANALYTICS_TIMEOUT: Duration = Duration::from_secs(5);

/// The accepted query windows. Anything outside this set is rejected
/// before touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "6h")]
    H6,
    #[default]
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "7d")]
    D7,
    #[serde(rename = "30d")]
    D30,
}

impl TimeRange {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::H1 => "1h",
            Self::H6 => "6h",
            Self::H24 => "24h",
            Self::D7 => "7d",
            Self::D30 => "30d",
        }
    }

    pub fn duration(self) -> chrono::Duration {
        match self {
            Self::H1 => chrono::Duration::hours(1),
            Self::H6 => chrono::Duration::hours(6),
            Self::H24 => chrono::Duration::hours(24),
            Self::D7 => chrono::Duration::days(7),
            Self::D30 => chrono::Duration::days(30),
        }
    }

    /// The inclusive lower bound of the window ending at `now`.
    pub fn window_start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }
}

impl std::str::FromStr for TimeRange {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(Self::H1),
            "6h" => Ok(Self::H6),
            "24h" => Ok(Self::H24),
            "7d" => Ok(Self::D7),
            "30d" => Ok(Self::D30),
            other => Err(QueryError::InvalidRange(other.to_string())),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The visualization subgraph: capped, window-scoped nodes and edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Echo of the query parameters, stamped with the response time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMeta {
    pub range: TimeRange,
    pub source: Option<SourceId>,
    pub generated_at: DateTime<Utc>,
}

/// The full response envelope handed to the API layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub graph: GraphData,
    pub analytics: GraphAnalytics,
    pub meta: QueryMeta,
}

/// Answer one graph query.
///
/// The graph section reads the heaviest nodes and edges seen within the
/// window; edges whose endpoints were cut by the node cap are dropped so
/// the subgraph is closed. The analytics section runs under
/// `analytics_timeout` and degrades on failure.
pub async fn query_graph(
    store: &dyn GraphStore,
    range: TimeRange,
    source: Option<&SourceId>,
    analytics_timeout: Duration,
    now: DateTime<Utc>,
) -> crate::error::Result<QueryResponse> {
    let window_start = range.window_start(now);

    let nodes = store
        .find_nodes(&NodeFilter {
            source: source.cloned(),
            seen_since: Some(window_start),
            limit: Some(MAX_GRAPH_NODES),
        })
        .await?;

    let edges = if nodes.is_empty() {
        Vec::new()
    } else {
        let visible: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
        store
            .find_edges(&EdgeFilter {
                source: source.cloned(),
                seen_since: Some(window_start),
                limit: Some(MAX_GRAPH_EDGES),
            })
            .await?
            .into_iter()
            .filter(|e| visible.contains(&e.node_a) && visible.contains(&e.node_b))
            .collect()
    };

    let analytics =
        match tokio::time::timeout(analytics_timeout, compute_analytics(store, source, window_start))
            .await
        {
            Ok(Ok(analytics)) => analytics,
            Ok(Err(err)) => {
                warn!(range = %range, error = %err, "Analytics failed, serving degraded response");
                GraphAnalytics::degraded(err.to_string())
            }
            Err(_) => {
                warn!(range = %range, timeout = ?analytics_timeout, "Analytics timed out");
                GraphAnalytics::degraded(format!(
                    "analytics timed out after {analytics_timeout:?}"
                ))
            }
        };

    debug!(
        range = %range,
        nodes = nodes.len(),
        edges = edges.len(),
        degraded = analytics.error.is_some(),
        "Query answered"
    );

    Ok(QueryResponse {
        graph: GraphData { nodes, edges },
        analytics,
        meta: QueryMeta {
            range,
            source: source.cloned(),
            generated_at: now,
        },
    })
}
