//! Weighted graph abstraction shared by the MST builder and the tour
//! evaluator.
//!
//! [`DistanceGraph`](crate::distance::DistanceGraph) is the complete
//! graph the pipeline builds from coordinates. [`SparseGraph`] holds an
//! explicit edge list, which lets the same algorithms run over partial
//! (possibly disconnected) graphs or over a spanning tree itself.

use std::collections::HashMap;

use crate::types::{PointId, SpanningTree, Weight};

/// Trait for undirected weighted graphs keyed by [`PointId`].
///
/// Implementations must list vertices and neighbors in a deterministic
/// order; the MST and tour stages inherit that order.
pub trait WeightedGraph {
    /// All vertices, in a stable order.
    fn vertices(&self) -> &[PointId];

    /// Whether `id` is a vertex of the graph.
    fn contains(&self, id: PointId) -> bool;

    /// Weight of the edge `from -> to`, if present. Never returns a
    /// self-loop.
    fn weight(&self, from: PointId, to: PointId) -> Option<Weight>;

    /// Neighbors of `id` with edge weights. Empty for unknown vertices.
    fn neighbors(&self, id: PointId) -> impl Iterator<Item = (PointId, Weight)> + '_;

    /// Number of vertices.
    fn vertex_count(&self) -> usize {
        self.vertices().len()
    }
}

/// An adjacency-list graph with explicitly inserted edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseGraph {
    ids: Vec<PointId>,
    adjacency: HashMap<PointId, Vec<(PointId, Weight)>>,
}

impl SparseGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph with the given isolated vertices.
    #[must_use]
    pub fn with_vertices(ids: impl IntoIterator<Item = PointId>) -> Self {
        let mut graph = Self::new();
        for id in ids {
            graph.add_vertex(id);
        }
        graph
    }

    /// Build the undirected view of a spanning tree.
    #[must_use]
    pub fn from_tree(tree: &SpanningTree) -> Self {
        let mut graph = Self::with_vertices([tree.start()]);
        for edge in tree.edges() {
            graph.add_edge(edge.from, edge.to, edge.weight);
        }
        graph
    }

    /// Add a vertex. Does nothing if it already exists.
    pub fn add_vertex(&mut self, id: PointId) {
        if !self.adjacency.contains_key(&id) {
            self.ids.push(id);
            self.adjacency.insert(id, Vec::new());
        }
    }

    /// Add an undirected edge, creating missing endpoints. Self-loops
    /// are ignored.
    pub fn add_edge(&mut self, a: PointId, b: PointId, weight: Weight) {
        self.add_vertex(a);
        self.add_vertex(b);
        if a == b {
            return;
        }
        if let Some(list) = self.adjacency.get_mut(&a) {
            list.push((b, weight));
        }
        if let Some(list) = self.adjacency.get_mut(&b) {
            list.push((a, weight));
        }
    }
}

impl WeightedGraph for SparseGraph {
    fn vertices(&self) -> &[PointId] {
        &self.ids
    }

    fn contains(&self, id: PointId) -> bool {
        self.adjacency.contains_key(&id)
    }

    fn weight(&self, from: PointId, to: PointId) -> Option<Weight> {
        self.adjacency
            .get(&from)?
            .iter()
            .find(|&&(n, _)| n == to)
            .map(|&(_, w)| w)
    }

    fn neighbors(&self, id: PointId) -> impl Iterator<Item = (PointId, Weight)> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|list| list.iter().copied())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::MstEdge;

    #[test]
    fn add_edge_is_undirected() {
        let mut g = SparseGraph::new();
        g.add_edge(1, 2, 5);
        assert_eq!(g.weight(1, 2), Some(5));
        assert_eq!(g.weight(2, 1), Some(5));
        assert_eq!(g.neighbors(1).count(), 1);
        assert_eq!(g.vertices(), &[1, 2]);
    }

    #[test]
    fn self_loops_are_ignored() {
        let mut g = SparseGraph::new();
        g.add_edge(3, 3, 1);
        assert!(g.contains(3));
        assert_eq!(g.weight(3, 3), None);
        assert_eq!(g.neighbors(3).count(), 0);
    }

    #[test]
    fn neighbors_keep_insertion_order() {
        let mut g = SparseGraph::new();
        g.add_edge(1, 4, 1);
        g.add_edge(1, 2, 2);
        g.add_edge(1, 3, 3);
        let order: Vec<PointId> = g.neighbors(1).map(|(n, _)| n).collect();
        assert_eq!(order, vec![4, 2, 3]);
        assert_eq!(g.neighbors(99).count(), 0);
    }

    #[test]
    fn from_tree_includes_single_vertex() {
        let tree = SpanningTree::new(7, Vec::new()).unwrap();
        let g = SparseGraph::from_tree(&tree);
        assert_eq!(g.vertices(), &[7]);
    }

    #[test]
    fn from_tree_mirrors_edges() {
        let tree = SpanningTree::new(
            1,
            vec![
                MstEdge {
                    from: 1,
                    to: 2,
                    weight: 3,
                },
                MstEdge {
                    from: 2,
                    to: 3,
                    weight: 4,
                },
            ],
        )
        .unwrap();
        let g = SparseGraph::from_tree(&tree);
        assert_eq!(g.vertex_count(), 3);
        assert_eq!(g.weight(3, 2), Some(4));
        assert_eq!(g.weight(1, 3), None);
    }
}
