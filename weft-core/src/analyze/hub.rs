// Hub ranking: entities with the most distinct co-occurrence partners.

use crate::analyze::graph::CooccurrenceGraph;
use crate::types::{Hub, Node};

/// Hub lists are capped to the most connected entities.
pub const MAX_HUBS: usize = 10;

/// Rank nodes by degree in the co-occurrence graph. Isolated nodes are
/// dropped; ties keep the caller's node ordering.
pub fn compute_hubs(nodes: &[Node], graph: &CooccurrenceGraph) -> Vec<Hub> {
    let mut hubs: Vec<Hub> = nodes
        .iter()
        .filter_map(|node| {
            let degree = graph.degree(node.id) as u64;
            (degree > 0).then(|| Hub {
                node: node.clone(),
                degree,
            })
        })
        .collect();

    hubs.sort_by(|a, b| b.degree.cmp(&a.degree));
    hubs.truncate(MAX_HUBS);
    hubs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Edge, EdgeId, EntityKind, NodeId, SourceId};
    use chrono::Utc;

    fn node(id: i64) -> Node {
        Node {
            id: NodeId(id),
            source: SourceId::new("feed-1"),
            key: format!("text:entity-{id}"),
            kind: EntityKind::Text,
            value: format!("entity {id}"),
            occurrence_count: 1,
            first_seen_at: Utc::now(),
            last_seen_at: Utc::now(),
        }
    }

    fn edge(id: i64, a: i64, b: i64) -> Edge {
        Edge {
            id: EdgeId(id),
            source: SourceId::new("feed-1"),
            node_a: NodeId(a),
            node_b: NodeId(b),
            weight: 1,
            first_seen_at: Utc::now(),
            last_seen_at: Utc::now(),
        }
    }

    #[test]
    fn star_center_ranks_first() {
        let nodes: Vec<Node> = (1..=4).map(node).collect();
        let edges = vec![edge(1, 1, 2), edge(2, 1, 3), edge(3, 1, 4)];
        let graph = CooccurrenceGraph::from_edges(&edges);

        let hubs = compute_hubs(&nodes, &graph);
        assert_eq!(hubs.len(), 4);
        assert_eq!(hubs[0].node.id, NodeId(1));
        assert_eq!(hubs[0].degree, 3);
        assert_eq!(hubs[1].degree, 1);
    }

    #[test]
    fn isolated_nodes_are_excluded() {
        let nodes = vec![node(1), node(2), node(3)];
        let edges = vec![edge(1, 1, 2)];
        let graph = CooccurrenceGraph::from_edges(&edges);

        let hubs = compute_hubs(&nodes, &graph);
        assert_eq!(hubs.len(), 2);
        assert!(hubs.iter().all(|h| h.node.id != NodeId(3)));
    }

    #[test]
    fn ties_preserve_input_order() {
        // All three nodes in a triangle have degree 2; input order wins.
        let nodes = vec![node(3), node(1), node(2)];
        let edges = vec![edge(1, 1, 2), edge(2, 2, 3), edge(3, 1, 3)];
        let graph = CooccurrenceGraph::from_edges(&edges);

        let hubs = compute_hubs(&nodes, &graph);
        let order: Vec<NodeId> = hubs.iter().map(|h| h.node.id).collect();
        assert_eq!(order, vec![NodeId(3), NodeId(1), NodeId(2)]);
    }

    #[test]
    fn hub_list_is_capped() {
        let nodes: Vec<Node> = (0..=20).map(node).collect();
        let edges: Vec<Edge> = (1..=20).map(|i| edge(i, 0, i)).collect();
        let graph = CooccurrenceGraph::from_edges(&edges);

        let hubs = compute_hubs(&nodes, &graph);
        assert_eq!(hubs.len(), MAX_HUBS);
        assert_eq!(hubs[0].degree, 20);
    }
}
