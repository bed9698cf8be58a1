//! Random-tour baseline.
//!
//! Samples uniformly random closed tours in groups, keeps the best tour
//! of each group, and averages those per-group minima. The result gives
//! a reference point for how much the MST-derived tour improves on
//! chance.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::graph::WeightedGraph;
use crate::tour::evaluate_tour;
use crate::types::{PipelineError, PointId, Tour, Weight};

/// One batch of groups that share a group size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Number of groups to sample.
    pub group_count: usize,
    /// Random tours per group.
    pub group_size: usize,
}

impl GroupSpec {
    /// Create a group spec.
    #[must_use]
    pub const fn new(group_count: usize, group_size: usize) -> Self {
        Self {
            group_count,
            group_size,
        }
    }
}

/// Configuration for [`run_baseline`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Group batches, processed in order from one RNG stream.
    pub groups: Vec<GroupSpec>,
    /// RNG seed.
    pub seed: u64,
}

impl BaselineConfig {
    /// Default batches: 100 groups of 10 tours, then 20 groups of 50.
    pub const DEFAULT_GROUPS: [GroupSpec; 2] = [GroupSpec::new(100, 10), GroupSpec::new(20, 50)];
    /// Default RNG seed.
    pub const DEFAULT_SEED: u64 = 0x6d73_746f_7572;
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            groups: Self::DEFAULT_GROUPS.to_vec(),
            seed: Self::DEFAULT_SEED,
        }
    }
}

/// Outcome of one [`GroupSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// The batch this summary describes.
    pub spec: GroupSpec,
    /// Mean of the per-group minimum tour weights.
    pub mean_of_minima: f64,
    /// Smallest tour weight seen in this batch.
    pub best: Weight,
}

/// Outcome of a baseline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineReport {
    /// Per-batch summaries, in configuration order.
    pub groups: Vec<GroupSummary>,
    /// Smallest tour weight across every sampled tour.
    pub overall_min: Weight,
    /// Total number of tours sampled.
    pub tours_sampled: usize,
}

/// Close a permutation into a tour by repeating its first id.
fn closed(order: &[PointId]) -> Tour {
    let mut ids = Vec::with_capacity(order.len() + 1);
    ids.extend_from_slice(order);
    if let Some(&first) = order.first() {
        ids.push(first);
    }
    Tour::new(ids)
}

/// Sample random tours over `graph` and summarize group minima.
///
/// The same permutation buffer is reshuffled for every sample, so a
/// given seed always reproduces the same report.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for fewer than two vertices,
/// an empty group list, or a zero group count or size.
/// Propagates evaluator errors.
#[allow(clippy::cast_precision_loss)]
pub fn run_baseline<G: WeightedGraph>(
    graph: &G,
    config: &BaselineConfig,
) -> Result<BaselineReport, PipelineError> {
    if graph.vertex_count() < 2 {
        return Err(PipelineError::InvalidConfig(format!(
            "random baseline needs at least 2 points, got {}",
            graph.vertex_count()
        )));
    }
    if config.groups.is_empty() {
        return Err(PipelineError::InvalidConfig(
            "random baseline needs at least one group batch".to_string(),
        ));
    }
    if let Some(spec) = config
        .groups
        .iter()
        .find(|s| s.group_count == 0 || s.group_size == 0)
    {
        return Err(PipelineError::InvalidConfig(format!(
            "group batch {} x {} is empty",
            spec.group_count, spec.group_size
        )));
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);
    let mut order = graph.vertices().to_vec();
    let mut overall_min = Weight::MAX;
    let mut tours_sampled = 0;
    let mut groups = Vec::with_capacity(config.groups.len());

    for &spec in &config.groups {
        let mut minima_sum: u128 = 0;
        let mut best = Weight::MAX;
        for _ in 0..spec.group_count {
            let mut group_min = Weight::MAX;
            for _ in 0..spec.group_size {
                order.shuffle(&mut rng);
                let weight = evaluate_tour(graph, &closed(&order))?;
                group_min = group_min.min(weight);
            }
            tours_sampled += spec.group_size;
            minima_sum += u128::from(group_min);
            best = best.min(group_min);
        }
        overall_min = overall_min.min(best);

        let mean_of_minima = minima_sum as f64 / spec.group_count as f64;
        log::debug!(
            "baseline {} groups of {}: mean of minima {mean_of_minima:.2}, best {best}",
            spec.group_count,
            spec.group_size,
        );
        groups.push(GroupSummary {
            spec,
            mean_of_minima,
            best,
        });
    }

    Ok(BaselineReport {
        groups,
        overall_min,
        tours_sampled,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::distance::{DistanceGraph, RoundingPolicy};
    use crate::types::{Point, PointSet};

    fn hexagon() -> DistanceGraph {
        let mut set = PointSet::new();
        for (i, angle) in (0..6).map(|k| f64::from(k) * std::f64::consts::FRAC_PI_3).enumerate() {
            let id = PointId::try_from(i + 1).unwrap();
            set.push(id, Point::new(100.0 * angle.cos(), 100.0 * angle.sin()));
        }
        DistanceGraph::build(&set, RoundingPolicy::default()).unwrap()
    }

    fn small_config(seed: u64) -> BaselineConfig {
        BaselineConfig {
            groups: vec![GroupSpec::new(5, 4), GroupSpec::new(2, 10)],
            seed,
        }
    }

    #[test]
    fn default_config_matches_reference_batches() {
        let config = BaselineConfig::default();
        assert_eq!(
            config.groups,
            vec![GroupSpec::new(100, 10), GroupSpec::new(20, 50)]
        );
    }

    #[test]
    fn same_seed_same_report() {
        let graph = hexagon();
        let a = run_baseline(&graph, &small_config(3)).unwrap();
        let b = run_baseline(&graph, &small_config(3)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.tours_sampled, 40);
        assert_eq!(a.groups.len(), 2);
    }

    #[test]
    fn overall_min_bounds_every_batch() {
        let graph = hexagon();
        let report = run_baseline(&graph, &small_config(11)).unwrap();
        for group in &report.groups {
            assert!(report.overall_min <= group.best);
            #[allow(clippy::cast_precision_loss)]
            let best = group.best as f64;
            assert!(group.mean_of_minima >= best);
        }
        // The perimeter (600) is the optimum for a regular hexagon.
        assert!(report.overall_min >= 600);
    }

    #[test]
    fn two_points_have_a_single_tour_weight() {
        let mut set = PointSet::new();
        set.push(1, Point::new(0.0, 0.0));
        set.push(2, Point::new(3.0, 4.0));
        let graph = DistanceGraph::build(&set, RoundingPolicy::default()).unwrap();
        let report = run_baseline(&graph, &small_config(0)).unwrap();
        assert_eq!(report.overall_min, 10);
        for group in &report.groups {
            assert!((group.mean_of_minima - 10.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn single_point_is_rejected() {
        let mut set = PointSet::new();
        set.push(1, Point::new(0.0, 0.0));
        let graph = DistanceGraph::build(&set, RoundingPolicy::default()).unwrap();
        assert!(matches!(
            run_baseline(&graph, &BaselineConfig::default()),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_sized_batch_is_rejected() {
        let config = BaselineConfig {
            groups: vec![GroupSpec::new(3, 0)],
            seed: 1,
        };
        assert!(matches!(
            run_baseline(&hexagon(), &config),
            Err(PipelineError::InvalidConfig(_))
        ));
        let empty = BaselineConfig {
            groups: Vec::new(),
            seed: 1,
        };
        assert!(run_baseline(&hexagon(), &empty).is_err());
    }

    #[test]
    fn config_json_defaults() {
        let config: BaselineConfig = serde_json::from_str(r#"{"seed": 9}"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.groups.len(), 2);
    }
}
