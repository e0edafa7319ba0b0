use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};

use crate::types::{Edge, NodeId};

/// A petgraph `UnGraph` built from stored edge rows, with `NodeId` ↔
/// `NodeIndex` mapping. Edge weights carry the stored co-occurrence count.
#[derive(Debug)]
pub struct CooccurrenceGraph {
    pub graph: UnGraph<NodeId, i64>,
    pub node_to_index: HashMap<NodeId, NodeIndex>,
    pub index_to_node: HashMap<NodeIndex, NodeId>,
}

impl CooccurrenceGraph {
    /// Build an undirected graph from edge rows. Vertices are added on
    /// first sight of an endpoint.
    pub fn from_edges(edges: &[Edge]) -> Self {
        let estimated_nodes = edges.len();
        let mut graph = UnGraph::<NodeId, i64>::with_capacity(estimated_nodes, edges.len());
        let mut node_to_index: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(estimated_nodes);
        let mut index_to_node: HashMap<NodeIndex, NodeId> = HashMap::with_capacity(estimated_nodes);

        for edge in edges {
            for node_id in [edge.node_a, edge.node_b] {
                node_to_index.entry(node_id).or_insert_with(|| {
                    let idx = graph.add_node(node_id);
                    index_to_node.insert(idx, node_id);
                    idx
                });
            }
        }

        for edge in edges {
            if let (Some(&a_idx), Some(&b_idx)) = (
                node_to_index.get(&edge.node_a),
                node_to_index.get(&edge.node_b),
            ) {
                graph.add_edge(a_idx, b_idx, edge.weight);
            }
        }

        Self {
            graph,
            node_to_index,
            index_to_node,
        }
    }

    /// Number of distinct stored edges touching this node. Nodes the edge
    /// set never mentions have degree 0.
    pub fn degree(&self, node_id: NodeId) -> usize {
        self.node_to_index
            .get(&node_id)
            .map_or(0, |&idx| self.graph.edges(idx).count())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
