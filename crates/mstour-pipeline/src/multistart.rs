//! Multi-start tour extraction over a single spanning tree.
//!
//! The MST does not depend on the start vertex (up to ties), but the
//! preorder walk does. Walking the same tree from several starts and
//! keeping the best tour is a cheap improvement over a single walk.

use rand::SeedableRng;
use rand::seq::index;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::graph::WeightedGraph;
use crate::tour::{Adjacency, evaluate_tour, extract_tour};
use crate::types::{PipelineError, PointId, SpanningTree, Tour, Weight};

/// Which start vertices to walk the tree from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartSelection {
    /// Every vertex, in graph order.
    All,

    /// A random sample without replacement.
    Random {
        /// Sample size. `None` uses [`default_start_count`].
        count: Option<usize>,
        /// RNG seed.
        seed: u64,
    },
}

impl Default for StartSelection {
    fn default() -> Self {
        Self::Random {
            count: None,
            seed: Self::DEFAULT_SEED,
        }
    }
}

impl StartSelection {
    /// Default RNG seed for [`StartSelection::Random`].
    pub const DEFAULT_SEED: u64 = 0x6d73_746f_7572;

    /// Pick start vertices from `ids`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for a zero sample size.
    pub fn select(&self, ids: &[PointId]) -> Result<Vec<PointId>, PipelineError> {
        match *self {
            Self::All => Ok(ids.to_vec()),
            Self::Random { count, seed } => {
                let count = count.unwrap_or_else(|| default_start_count(ids.len()));
                if count == 0 {
                    return Err(PipelineError::InvalidConfig(
                        "multi-start sample size must be at least 1".to_string(),
                    ));
                }
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
                Ok(index::sample(&mut rng, ids.len(), count.min(ids.len()))
                    .into_iter()
                    .map(|i| ids[i])
                    .collect())
            }
        }
    }
}

/// `ceil(sqrt(n))`, the default number of random starts.
#[must_use]
pub const fn default_start_count(n: usize) -> usize {
    let root = n.isqrt();
    if root * root == n { root } else { root + 1 }
}

/// Weight of the tour walked from one start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResult {
    /// Start vertex.
    pub start: PointId,
    /// Closed tour weight.
    pub weight: Weight,
}

/// Outcome of a multi-start run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiStartSummary {
    /// Weight of the shared spanning tree.
    pub mst_weight: Weight,
    /// One entry per start, in selection order.
    pub runs: Vec<StartResult>,
    /// Mean tour weight across runs.
    pub mean: f64,
    /// The lightest run (earliest on ties).
    pub best: StartResult,
    /// The tour of the lightest run.
    pub best_tour: Tour,
}

/// Walk `tree` from every selected start and evaluate each tour on
/// `graph`.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for an empty selection,
/// [`PipelineError::InvalidTour`] when a walk does not visit every vertex
/// of `graph` exactly once, and propagates extraction and evaluation
/// errors.
#[allow(clippy::cast_precision_loss)]
pub fn multi_start<G: WeightedGraph>(
    graph: &G,
    tree: &SpanningTree,
    selection: &StartSelection,
) -> Result<MultiStartSummary, PipelineError> {
    let starts = selection.select(graph.vertices())?;
    let adjacency = Adjacency::from_tree(tree);

    let mut runs = Vec::with_capacity(starts.len());
    let mut best: Option<(StartResult, Tour)> = None;
    for start in starts {
        let tour = extract_tour(&adjacency, start)?;
        tour.validate_vertices(graph.vertices())?;
        let weight = evaluate_tour(graph, &tour)?;
        let run = StartResult { start, weight };
        runs.push(run);
        if best.as_ref().is_none_or(|(b, _)| weight < b.weight) {
            best = Some((run, tour));
        }
    }

    let Some((best, best_tour)) = best else {
        return Err(PipelineError::InvalidConfig(
            "no start vertices selected".to_string(),
        ));
    };
    let total: u128 = runs.iter().map(|r| u128::from(r.weight)).sum();
    let mean = total as f64 / runs.len() as f64;

    log::info!(
        "multi-start: {} starts, mean {mean:.2}, best {} from {}",
        runs.len(),
        best.weight,
        best.start,
    );

    Ok(MultiStartSummary {
        mst_weight: tree.total_weight(),
        runs,
        mean,
        best,
        best_tour,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::distance::{DistanceGraph, RoundingPolicy};
    use crate::mst::{MstAlgorithm, SpanningTreeBuilder};
    use crate::types::{Point, PointSet};

    fn scattered(n: u32) -> PointSet {
        let mut set = PointSet::new();
        for id in 1..=n {
            let t = f64::from(id);
            set.push(id, Point::new((t * 37.0) % 101.0, (t * 59.0) % 97.0));
        }
        set
    }

    #[test]
    fn start_count_is_ceil_sqrt() {
        assert_eq!(default_start_count(0), 0);
        assert_eq!(default_start_count(1), 1);
        assert_eq!(default_start_count(2), 2);
        assert_eq!(default_start_count(4), 2);
        assert_eq!(default_start_count(5), 3);
        assert_eq!(default_start_count(131), 12);
    }

    #[test]
    fn random_selection_is_seeded_and_distinct() {
        let ids: Vec<PointId> = (1..=50).collect();
        let selection = StartSelection::Random {
            count: None,
            seed: 4,
        };
        let a = selection.select(&ids).unwrap();
        let b = selection.select(&ids).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        let mut sorted = a.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), a.len());
    }

    #[test]
    fn oversized_sample_is_clamped() {
        let selection = StartSelection::Random {
            count: Some(10),
            seed: 0,
        };
        assert_eq!(selection.select(&[3, 1, 2]).unwrap().len(), 3);
    }

    #[test]
    fn zero_sample_is_rejected() {
        let selection = StartSelection::Random {
            count: Some(0),
            seed: 0,
        };
        assert!(matches!(
            selection.select(&[1, 2]),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn all_starts_report_best_and_mean() {
        let points = scattered(20);
        let graph = DistanceGraph::build(&points, RoundingPolicy::default()).unwrap();
        let tree = MstAlgorithm::Heap.build(&graph, 1).unwrap();
        let summary = multi_start(&graph, &tree, &StartSelection::All).unwrap();

        assert_eq!(summary.runs.len(), 20);
        assert_eq!(summary.mst_weight, tree.total_weight());
        let min = summary.runs.iter().map(|r| r.weight).min().unwrap();
        assert_eq!(summary.best.weight, min);
        assert_eq!(summary.best_tour.start(), Some(summary.best.start));
        assert_eq!(evaluate_tour(&graph, &summary.best_tour).unwrap(), min);
        #[allow(clippy::cast_precision_loss)]
        let min_f = min as f64;
        assert!(summary.mean >= min_f);
        for run in &summary.runs {
            assert!(run.weight >= tree.total_weight());
        }
    }

    #[test]
    fn single_start_from_tree_root_matches_tour_from_tree() {
        let points = scattered(9);
        let graph = DistanceGraph::build(&points, RoundingPolicy::default()).unwrap();
        let tree = MstAlgorithm::Heap.build(&graph, 1).unwrap();
        let reference = crate::tour::tour_from_tree(&tree).unwrap();
        let summary = multi_start(&graph, &tree, &StartSelection::All).unwrap();
        assert_eq!(
            summary.runs[0].weight,
            evaluate_tour(&graph, &reference).unwrap()
        );
    }

    #[test]
    fn single_point() {
        let mut points = PointSet::new();
        points.push(4, Point::new(0.0, 0.0));
        let graph = DistanceGraph::build(&points, RoundingPolicy::default()).unwrap();
        let tree = MstAlgorithm::Heap.build(&graph, 4).unwrap();
        let summary = multi_start(&graph, &tree, &StartSelection::default()).unwrap();
        assert_eq!(summary.runs, vec![StartResult { start: 4, weight: 0 }]);
        assert!(summary.mean.abs() < f64::EPSILON);
    }

    #[test]
    fn tree_must_span_the_graph() {
        let graph = DistanceGraph::build(&scattered(4), RoundingPolicy::default()).unwrap();
        let partial = SpanningTree::new(
            1,
            vec![crate::types::MstEdge {
                from: 1,
                to: 2,
                weight: graph.weight(1, 2).unwrap(),
            }],
        )
        .unwrap();
        let err = multi_start(&graph, &partial, &StartSelection::All).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTour(ref r) if r.contains("3 stops for 4")));
    }

    #[test]
    fn selection_serde() {
        let json = serde_json::to_string(&StartSelection::All).unwrap();
        assert_eq!(json, "\"all\"");
        let parsed: StartSelection =
            serde_json::from_str(r#"{"random":{"count":3,"seed":7}}"#).unwrap();
        assert_eq!(
            parsed,
            StartSelection::Random {
                count: Some(3),
                seed: 7
            }
        );
    }
}
