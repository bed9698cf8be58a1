//! mstour-pipeline: Approximate Euclidean TSP tours from a minimum
//! spanning tree (sans-IO).
//!
//! Turns TSPLIB-style coordinate text into a closed tour through:
//! parse -> complete distance graph -> Prim MST -> preorder DFS walk ->
//! tour evaluation. Under the triangle inequality the resulting tour is
//! at most twice the optimum.
//!
//! This crate has **no I/O dependencies**: it operates on in-memory text
//! and returns structured data. Reading files, printing reports, and
//! writing SVG live in `mstour` and `mstour-export`.

pub mod baseline;
pub mod diagnostics;
pub mod distance;
pub mod graph;
pub mod mst;
pub mod multistart;
pub mod pipeline;
pub mod tour;
pub mod tsplib;
pub mod types;

pub use baseline::{BaselineConfig, BaselineReport, GroupSpec, GroupSummary, run_baseline};
pub use distance::{DistanceGraph, RoundingPolicy};
pub use graph::{SparseGraph, WeightedGraph};
pub use mst::{MstAlgorithm, SpanningTreeBuilder, TieBreak};
pub use multistart::{MultiStartSummary, StartResult, StartSelection, multi_start};
pub use pipeline::{Evaluated, Pipeline, PipelineStage};
pub use tour::{Adjacency, evaluate_tour, extract_tour, tour_from_tree};
pub use types::{
    MstEdge, PipelineConfig, PipelineError, Point, PointId, PointSet, SpanningTree, Tour,
    TourResult, Weight,
};

/// Run the full pipeline.
///
/// # Pipeline steps
///
/// 1. Parse the coordinate section
/// 2. Build the complete rounded-distance graph
/// 3. Grow the MST from the configured start (default: first point)
/// 4. Walk the tree in preorder and close the cycle
/// 5. Sum the tour on the distance graph
///
/// # Errors
///
/// Returns the first [`PipelineError`] raised by any step: malformed
/// input, coordinates whose distances or sums exceed the [`Weight`]
/// range, an unknown start vertex, or an internal consistency failure.
pub fn process(text: &str, config: &PipelineConfig) -> Result<TourResult, PipelineError> {
    Pipeline::new(text, config.clone()).complete()
}
