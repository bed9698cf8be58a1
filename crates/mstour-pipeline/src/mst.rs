//! Minimum spanning tree construction (Prim's algorithm).
//!
//! Two interchangeable variants grow the tree from a chosen start vertex:
//!
//! - [`MstAlgorithm::Heap`]: lazy Prim with a binary min-heap of candidate
//!   edges. O(E log E), the better choice for sparse graphs.
//! - [`MstAlgorithm::DenseScan`]: array-based Prim that keeps the best
//!   known attachment for every vertex outside the tree and scans for the
//!   minimum. O(V^2) with no heap, which suits complete graphs.
//!
//! Both order candidates lexicographically by a [`TieBreak`] key. The
//! default, `(cost, from, to)`, picks the equal-cost edge leaving the
//! smallest tree vertex, then the one reaching the smallest outside
//! vertex. Given the same graph, start, and tie-break both variants
//! produce the same edges in the same discovery order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};

use crate::graph::WeightedGraph;
use crate::types::{MstEdge, PipelineError, PointId, SpanningTree, Weight};

/// Candidate edge ordering key, laid out by [`TieBreak::key`].
type CandidateKey = (Weight, PointId, PointId);

/// Order among candidate edges of equal cost.
///
/// Ties are common with rounded integer distances, and the chosen edge
/// decides discovery order and with it the shape of the tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Key `(cost, from, to)`: smallest tree-side vertex first.
    #[default]
    SourceFirst,

    /// Key `(cost, to, from)`: smallest newly attached vertex first.
    TargetFirst,
}

impl TieBreak {
    const fn key(self, cost: Weight, from: PointId, to: PointId) -> CandidateKey {
        match self {
            Self::SourceFirst => (cost, from, to),
            Self::TargetFirst => (cost, to, from),
        }
    }

    const fn edge(self, key: CandidateKey) -> MstEdge {
        let (weight, a, b) = key;
        let (from, to) = match self {
            Self::SourceFirst => (a, b),
            Self::TargetFirst => (b, a),
        };
        MstEdge { from, to, weight }
    }
}

/// Trait for spanning-tree construction strategies.
pub trait SpanningTreeBuilder {
    /// Grow a minimum spanning tree from `start`, breaking cost ties by
    /// `tie_break`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::VertexNotFound`] if `start` is not in the
    /// graph, [`PipelineError::Disconnected`] if some vertex cannot be
    /// reached from it, and [`PipelineError::WeightOverflow`] if the tree
    /// weight does not fit a [`Weight`].
    fn build_with<G: WeightedGraph>(
        &self,
        graph: &G,
        start: PointId,
        tie_break: TieBreak,
    ) -> Result<SpanningTree, PipelineError>;

    /// Grow a minimum spanning tree from `start` with the default
    /// [`TieBreak`].
    ///
    /// # Errors
    ///
    /// See [`SpanningTreeBuilder::build_with`].
    fn build<G: WeightedGraph>(
        &self,
        graph: &G,
        start: PointId,
    ) -> Result<SpanningTree, PipelineError> {
        self.build_with(graph, start, TieBreak::default())
    }
}

/// Available MST algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MstAlgorithm {
    /// Lazy Prim driven by a binary min-heap.
    #[default]
    Heap,

    /// Array-based Prim that scans all outside vertices per step.
    DenseScan,
}

impl SpanningTreeBuilder for MstAlgorithm {
    fn build_with<G: WeightedGraph>(
        &self,
        graph: &G,
        start: PointId,
        tie_break: TieBreak,
    ) -> Result<SpanningTree, PipelineError> {
        match self {
            Self::Heap => prim_heap(graph, start, tie_break),
            Self::DenseScan => prim_dense(graph, start, tie_break),
        }
    }
}

/// Lazy Prim's algorithm with a binary min-heap of candidate edges.
///
/// # Errors
///
/// See [`SpanningTreeBuilder::build_with`].
pub fn prim_heap<G: WeightedGraph>(
    graph: &G,
    start: PointId,
    tie_break: TieBreak,
) -> Result<SpanningTree, PipelineError> {
    if !graph.contains(start) {
        return Err(PipelineError::VertexNotFound(start));
    }

    let total = graph.vertex_count();
    let mut visited: HashSet<PointId> = HashSet::with_capacity(total);
    visited.insert(start);

    let mut heap: BinaryHeap<Reverse<CandidateKey>> = graph
        .neighbors(start)
        .map(|(to, cost)| Reverse(tie_break.key(cost, start, to)))
        .collect();
    let mut edges = Vec::with_capacity(total.saturating_sub(1));

    while let Some(Reverse(key)) = heap.pop() {
        let edge = tie_break.edge(key);
        if !visited.insert(edge.to) {
            continue;
        }
        edges.push(edge);
        heap.extend(
            graph
                .neighbors(edge.to)
                .filter(|(next, _)| !visited.contains(next))
                .map(|(next, w)| Reverse(tie_break.key(w, edge.to, next))),
        );
    }

    finish(start, edges, total)
}

/// Array-based Prim's algorithm without a heap.
///
/// # Errors
///
/// See [`SpanningTreeBuilder::build_with`].
pub fn prim_dense<G: WeightedGraph>(
    graph: &G,
    start: PointId,
    tie_break: TieBreak,
) -> Result<SpanningTree, PipelineError> {
    if !graph.contains(start) {
        return Err(PipelineError::VertexNotFound(start));
    }

    let ids = graph.vertices();
    let total = ids.len();
    let position: HashMap<PointId, usize> =
        ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    let mut in_tree = vec![false; total];
    // Cheapest known (cost, from) attaching each outside vertex. For a
    // fixed target both tie-break keys reduce to this order.
    let mut best: Vec<Option<(Weight, PointId)>> = vec![None; total];
    let mut edges = Vec::with_capacity(total.saturating_sub(1));

    let mut current = start;
    loop {
        if let Some(&i) = position.get(&current) {
            in_tree[i] = true;
        }
        for (next, w) in graph.neighbors(current) {
            let Some(&j) = position.get(&next) else {
                continue;
            };
            if in_tree[j] {
                continue;
            }
            if best[j].is_none_or(|known| (w, current) < known) {
                best[j] = Some((w, current));
            }
        }

        let chosen = (0..total)
            .filter(|&j| !in_tree[j])
            .filter_map(|j| best[j].map(|(cost, from)| tie_break.key(cost, from, ids[j])))
            .min();
        let Some(key) = chosen else {
            break;
        };

        let edge = tie_break.edge(key);
        edges.push(edge);
        current = edge.to;
    }

    finish(start, edges, total)
}

fn finish(
    start: PointId,
    edges: Vec<MstEdge>,
    total: usize,
) -> Result<SpanningTree, PipelineError> {
    let reached = edges.len() + 1;
    if reached < total {
        return Err(PipelineError::Disconnected { reached, total });
    }
    let tree = SpanningTree::new(start, edges)?;
    log::debug!(
        "spanning tree from {start}: {} edges, total weight {}",
        tree.len(),
        tree.total_weight(),
    );
    Ok(tree)
}

impl SpanningTree {
    /// Check that the edges form a spanning tree of `graph` whose weights
    /// match the graph.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidTree`] describing the first
    /// violation found.
    pub fn validate<G: WeightedGraph>(&self, graph: &G) -> Result<(), PipelineError> {
        let ids = graph.vertices();
        let position: HashMap<PointId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        if !position.contains_key(&self.start()) {
            return Err(invalid(format!("start {} is not a vertex", self.start())));
        }
        if self.len() + 1 != ids.len() {
            return Err(invalid(format!(
                "{} edges for {} vertices",
                self.len(),
                ids.len()
            )));
        }

        let mut components = UnionFind::<usize>::new(ids.len());
        for edge in self.edges() {
            let (Some(&a), Some(&b)) = (position.get(&edge.from), position.get(&edge.to)) else {
                return Err(invalid(format!(
                    "edge {} - {} has an unknown endpoint",
                    edge.from, edge.to
                )));
            };
            if graph.weight(edge.from, edge.to) != Some(edge.weight) {
                return Err(invalid(format!(
                    "edge {} - {} has weight {} not found in the graph",
                    edge.from, edge.to, edge.weight
                )));
            }
            if !components.union(a, b) {
                return Err(invalid(format!(
                    "edge {} - {} closes a cycle",
                    edge.from, edge.to
                )));
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> PipelineError {
    PipelineError::InvalidTree(reason)
}
