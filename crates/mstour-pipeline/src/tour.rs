//! Tour extraction from a spanning tree and tour evaluation.
//!
//! The tour is the preorder of a depth-first walk over the tree,
//! closed by returning to the start. Shortcutting the doubled tree walk
//! this way keeps every point exactly once, and under the triangle
//! inequality the result is at most twice the MST weight.

use std::collections::{HashMap, HashSet};

use crate::graph::WeightedGraph;
use crate::types::{PipelineError, PointId, PointSet, SpanningTree, Tour, Weight};

/// Undirected adjacency lists of a spanning tree.
///
/// Neighbor order follows edge discovery order, which fixes the order
/// in which the DFS visits siblings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjacency {
    neighbors: HashMap<PointId, Vec<PointId>>,
}

impl Adjacency {
    /// Build adjacency lists (both directions) from a tree.
    #[must_use]
    pub fn from_tree(tree: &SpanningTree) -> Self {
        let mut neighbors: HashMap<PointId, Vec<PointId>> =
            HashMap::with_capacity(tree.len() + 1);
        neighbors.entry(tree.start()).or_default();
        for edge in tree.edges() {
            neighbors.entry(edge.from).or_default().push(edge.to);
            neighbors.entry(edge.to).or_default().push(edge.from);
        }
        Self { neighbors }
    }

    /// Neighbors of `id` in discovery order. Empty for unknown vertices.
    #[must_use]
    pub fn neighbors(&self, id: PointId) -> &[PointId] {
        self.neighbors.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Whether `id` is a vertex of the tree.
    #[must_use]
    pub fn contains(&self, id: PointId) -> bool {
        self.neighbors.contains_key(&id)
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// Returns `true` if the adjacency holds no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

/// Extract the closed preorder tour starting at `start`.
///
/// Uses an explicit stack of `(vertex, next neighbor index)` frames so
/// path-shaped trees with many thousands of vertices cannot exhaust the
/// call stack. Visiting order matches a recursive preorder DFS.
///
/// # Errors
///
/// Returns [`PipelineError::VertexNotFound`] if `start` is not in the
/// tree.
pub fn extract_tour(adjacency: &Adjacency, start: PointId) -> Result<Tour, PipelineError> {
    if !adjacency.contains(start) {
        return Err(PipelineError::VertexNotFound(start));
    }

    let mut visited: HashSet<PointId> = HashSet::with_capacity(adjacency.len());
    visited.insert(start);
    let mut order = Vec::with_capacity(adjacency.len() + 1);
    order.push(start);

    let mut stack: Vec<(PointId, usize)> = vec![(start, 0)];
    while let Some(frame) = stack.last_mut() {
        let (vertex, cursor) = *frame;
        match adjacency.neighbors(vertex).get(cursor) {
            Some(&next) => {
                frame.1 += 1;
                if visited.insert(next) {
                    order.push(next);
                    stack.push((next, 0));
                }
            }
            None => {
                stack.pop();
            }
        }
    }

    order.push(start);
    log::debug!("extracted tour of {} stops from {start}", order.len());
    Ok(Tour::new(order))
}

/// Extract the tour for `tree`, starting from the tree's own root.
///
/// # Errors
///
/// See [`extract_tour`].
pub fn tour_from_tree(tree: &SpanningTree) -> Result<Tour, PipelineError> {
    extract_tour(&Adjacency::from_tree(tree), tree.start())
}

/// Sum the weights of consecutive tour pairs on `graph`.
///
/// A pair of identical ids contributes zero, which makes the
/// single-point tour `[id, id]` weigh nothing.
///
/// # Errors
///
/// Returns [`PipelineError::MissingEdge`] when a consecutive pair has no
/// edge, [`PipelineError::VertexNotFound`] when a repeated id is not in
/// the graph, and [`PipelineError::WeightOverflow`] when the sum does not
/// fit a [`Weight`].
pub fn evaluate_tour<G: WeightedGraph>(graph: &G, tour: &Tour) -> Result<Weight, PipelineError> {
    tour.ids().windows(2).try_fold(0, |sum: Weight, pair| {
        let (from, to) = (pair[0], pair[1]);
        let step = if from == to {
            if graph.contains(from) {
                0
            } else {
                return Err(PipelineError::VertexNotFound(from));
            }
        } else {
            graph
                .weight(from, to)
                .ok_or(PipelineError::MissingEdge { from, to })?
        };
        sum.checked_add(step).ok_or(PipelineError::WeightOverflow)
    })
}

impl Tour {
    /// Check that the sequence is a closed Hamiltonian cycle over
    /// `points`: `N + 1` entries, first equal to last, and every point
    /// exactly once among the first `N`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidTour`] describing the violation.
    pub fn validate(&self, points: &PointSet) -> Result<(), PipelineError> {
        self.validate_vertices(points.ids())
    }

    /// Same check as [`Tour::validate`] against a plain vertex list, such
    /// as [`WeightedGraph::vertices`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidTour`] describing the violation.
    pub fn validate_vertices(&self, vertices: &[PointId]) -> Result<(), PipelineError> {
        let ids = self.ids();
        let invalid = |reason: String| Err(PipelineError::InvalidTour(reason));

        if ids.len() != vertices.len() + 1 {
            return invalid(format!(
                "{} stops for {} points, expected {}",
                ids.len(),
                vertices.len(),
                vertices.len() + 1
            ));
        }
        let (Some(first), Some(last)) = (ids.first(), ids.last()) else {
            return invalid("empty tour".to_string());
        };
        if first != last {
            return invalid(format!("starts at {first} but ends at {last}"));
        }

        let known: HashSet<PointId> = vertices.iter().copied().collect();
        let mut seen: HashSet<PointId> = HashSet::with_capacity(vertices.len());
        for &id in &ids[..ids.len() - 1] {
            if !known.contains(&id) {
                return invalid(format!("unknown point {id}"));
            }
            if !seen.insert(id) {
                return invalid(format!("point {id} visited twice"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::distance::{DistanceGraph, RoundingPolicy};
    use crate::graph::SparseGraph;
    use crate::mst::{MstAlgorithm, SpanningTreeBuilder};
    use crate::types::{MstEdge, Point};

    fn square_points() -> PointSet {
        let mut set = PointSet::new();
        set.push(1, Point::new(0.0, 0.0));
        set.push(2, Point::new(0.0, 3.0));
        set.push(3, Point::new(4.0, 3.0));
        set.push(4, Point::new(4.0, 0.0));
        set
    }

    fn edge(from: PointId, to: PointId) -> MstEdge {
        MstEdge {
            from,
            to,
            weight: 1,
        }
    }

    fn grid(side: u32) -> PointSet {
        let mut set = PointSet::new();
        for row in 0..side {
            for col in 0..side {
                set.push(
                    row * side + col + 1,
                    Point::new(f64::from(col) * 10.0, f64::from(row) * 7.0),
                );
            }
        }
        set
    }

    #[test]
    fn square_tour() {
        let points = square_points();
        let graph = DistanceGraph::build(&points, RoundingPolicy::default()).unwrap();
        let tree = MstAlgorithm::Heap.build(&graph, 1).unwrap();
        let tour = tour_from_tree(&tree).unwrap();
        assert_eq!(tour.ids(), &[1, 2, 4, 3, 1]);
        assert_eq!(evaluate_tour(&graph, &tour).unwrap(), 16);
        tour.validate(&points).unwrap();
    }

    #[test]
    fn siblings_follow_discovery_order() {
        // 1 has children 3 then 2; 3 has child 4.
        let tree = SpanningTree::new(1, vec![edge(1, 3), edge(1, 2), edge(3, 4)]).unwrap();
        let tour = tour_from_tree(&tree).unwrap();
        assert_eq!(tour.ids(), &[1, 3, 4, 2, 1]);
    }

    #[test]
    fn start_need_not_be_tree_root() {
        let tree = SpanningTree::new(1, vec![edge(1, 2), edge(2, 3)]).unwrap();
        let tour = extract_tour(&Adjacency::from_tree(&tree), 2).unwrap();
        assert_eq!(tour.ids(), &[2, 1, 3, 2]);
    }

    #[test]
    fn unknown_start() {
        let tree = SpanningTree::new(1, vec![edge(1, 2)]).unwrap();
        assert_eq!(
            extract_tour(&Adjacency::from_tree(&tree), 7).unwrap_err(),
            PipelineError::VertexNotFound(7)
        );
    }

    #[test]
    fn long_path_does_not_overflow() {
        let n: PointId = 200_000;
        let edges = (1..n).map(|i| edge(i, i + 1)).collect();
        let tree = SpanningTree::new(1, edges).unwrap();
        let tour = tour_from_tree(&tree).unwrap();
        assert_eq!(tour.len(), n as usize + 1);
        assert_eq!(tour.ids()[n as usize - 1], n);
        assert_eq!(tour.ids().last(), Some(&1));
    }

    #[test]
    fn single_point() {
        let mut points = PointSet::new();
        points.push(9, Point::new(1.0, 1.0));
        let graph = DistanceGraph::build(&points, RoundingPolicy::default()).unwrap();
        let tree = MstAlgorithm::Heap.build(&graph, 9).unwrap();
        let tour = tour_from_tree(&tree).unwrap();
        assert_eq!(tour.ids(), &[9, 9]);
        assert_eq!(evaluate_tour(&graph, &tour).unwrap(), 0);
        tour.validate(&points).unwrap();
    }

    #[test]
    fn tours_on_grid_are_valid_and_not_below_mst() {
        let points = grid(6);
        let graph = DistanceGraph::build(&points, RoundingPolicy::default()).unwrap();
        for &start in points.ids() {
            let tree = MstAlgorithm::Heap.build(&graph, start).unwrap();
            let tour = tour_from_tree(&tree).unwrap();
            tour.validate(&points).unwrap();
            assert_eq!(tour.start(), Some(start));

            let weight = evaluate_tour(&graph, &tour).unwrap();
            assert!(weight >= tree.total_weight());
        }
    }

    #[test]
    fn weight_is_reversal_invariant() {
        let points = grid(5);
        let graph = DistanceGraph::build(&points, RoundingPolicy::default()).unwrap();
        let tree = MstAlgorithm::Heap.build(&graph, 13).unwrap();
        let tour = tour_from_tree(&tree).unwrap();
        assert_eq!(
            evaluate_tour(&graph, &tour).unwrap(),
            evaluate_tour(&graph, &tour.reversed()).unwrap()
        );
    }

    #[test]
    fn missing_edge_on_tree_graph() {
        let points = square_points();
        let graph = DistanceGraph::build(&points, RoundingPolicy::default()).unwrap();
        let tree = MstAlgorithm::Heap.build(&graph, 1).unwrap();
        let tour = tour_from_tree(&tree).unwrap();
        // Tree 1-2, 1-4, 4-3 walked as 1 2 4 3: the jump 2 -> 4 is a shortcut.
        assert_eq!(
            evaluate_tour(&SparseGraph::from_tree(&tree), &tour).unwrap_err(),
            PipelineError::MissingEdge { from: 2, to: 4 }
        );
    }

    #[test]
    fn evaluate_rejects_weight_overflow() {
        let mut graph = SparseGraph::new();
        graph.add_edge(1, 2, Weight::MAX / 2 + 1);
        graph.add_edge(2, 3, 1);
        assert_eq!(evaluate_tour(&graph, &Tour::new(vec![2, 3])).unwrap(), 1);
        assert_eq!(
            evaluate_tour(&graph, &Tour::new(vec![1, 2, 1])).unwrap_err(),
            PipelineError::WeightOverflow
        );
    }

    #[test]
    fn validate_vertices_matches_graph_vertex_set() {
        let graph = DistanceGraph::build(&square_points(), RoundingPolicy::default()).unwrap();
        Tour::new(vec![3, 1, 2, 4, 3])
            .validate_vertices(graph.vertices())
            .unwrap();
        let err = Tour::new(vec![1, 2, 3, 1])
            .validate_vertices(graph.vertices())
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTour(ref r) if r.contains("expected 5")));
    }

    #[test]
    fn repeated_unknown_id() {
        let graph = SparseGraph::with_vertices([1]);
        assert_eq!(
            evaluate_tour(&graph, &Tour::new(vec![2, 2])).unwrap_err(),
            PipelineError::VertexNotFound(2)
        );
    }

    #[test]
    fn validate_rejects_open_tour() {
        let err = Tour::new(vec![1, 2, 3, 4, 2])
            .validate(&square_points())
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTour(ref r) if r.contains("ends at")));
    }

    #[test]
    fn validate_rejects_repeated_point() {
        let err = Tour::new(vec![1, 2, 2, 4, 1])
            .validate(&square_points())
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTour(ref r) if r.contains("twice")));
    }

    #[test]
    fn validate_rejects_wrong_length() {
        assert!(
            Tour::new(vec![1, 2, 3, 1])
                .validate(&square_points())
                .is_err()
        );
        assert!(Tour::new(Vec::new()).validate(&PointSet::new()).is_err());
    }

    #[test]
    fn validate_rejects_unknown_point() {
        let err = Tour::new(vec![1, 2, 3, 8, 1])
            .validate(&square_points())
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTour(ref r) if r.contains("unknown")));
    }
}
