//! Complete Euclidean distance graph over the loaded points.
//!
//! Every ordered pair of distinct points gets its own entry holding the
//! rounded Euclidean distance, so the graph is symmetric in value but
//! stored per direction. Storage is a dense row-major `N x N` matrix
//! indexed by input position; the diagonal is never exposed.

use std::collections::HashMap;

use geo::Euclidean;
use geo::line_measures::Distance;
use serde::{Deserialize, Serialize};

use crate::graph::WeightedGraph;
use crate::types::{PipelineError, Point, PointId, PointSet, Weight};

/// `2^64`, the first real value a [`Weight`] cannot hold.
const WEIGHT_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// How a real distance is rounded to an integer weight.
///
/// Only exact `.5` ties differ between the two policies, but a tie can
/// change which MST edge wins and therefore the final tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundingPolicy {
    /// Ties go to the even integer (`2.5 -> 2`, `3.5 -> 4`).
    #[default]
    HalfEven,

    /// Ties go away from zero (`2.5 -> 3`).
    HalfAwayFromZero,
}

impl RoundingPolicy {
    /// Round a non-negative distance to an integer weight.
    ///
    /// Returns `None` when the rounded value is negative, not finite, or
    /// too large for a [`Weight`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn round(self, distance: f64) -> Option<Weight> {
        let rounded = match self {
            Self::HalfEven => distance.round_ties_even(),
            Self::HalfAwayFromZero => distance.round(),
        };
        (0.0..WEIGHT_LIMIT)
            .contains(&rounded)
            .then(|| rounded as Weight)
    }
}

/// Convert a pipeline `Point` to a `geo::Point`.
const fn to_geo(p: Point) -> geo::Point<f64> {
    geo::Point(geo::Coord { x: p.x, y: p.y })
}

/// Rounded Euclidean distance between two points, or `None` if it does
/// not fit a [`Weight`].
#[must_use]
pub fn rounded_distance(a: Point, b: Point, rounding: RoundingPolicy) -> Option<Weight> {
    rounding.round(Euclidean.distance(&to_geo(a), &to_geo(b)))
}

/// The complete graph over a [`PointSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceGraph {
    ids: Vec<PointId>,
    index: HashMap<PointId, usize>,
    weights: Vec<Weight>,
    rounding: RoundingPolicy,
}

impl DistanceGraph {
    /// Build the complete graph. O(N^2) time and space.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DistanceOutOfRange`] for the first pair
    /// whose rounded distance does not fit a [`Weight`].
    pub fn build(points: &PointSet, rounding: RoundingPolicy) -> Result<Self, PipelineError> {
        let n = points.len();
        let ids = points.ids();
        let coords = points.points();
        let mut weights = vec![0; n * n];

        for i in 0..n {
            for j in (i + 1)..n {
                let w = rounded_distance(coords[i], coords[j], rounding).ok_or(
                    PipelineError::DistanceOutOfRange {
                        from: ids[i],
                        to: ids[j],
                    },
                )?;
                weights[i * n + j] = w;
                weights[j * n + i] = w;
            }
        }

        log::debug!(
            "built distance graph: {n} vertices, {} directed edges ({rounding:?})",
            n * n.saturating_sub(1),
        );

        Ok(Self {
            ids: ids.to_vec(),
            index: ids.iter().enumerate().map(|(i, &id)| (id, i)).collect(),
            weights,
            rounding,
        })
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if the graph has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of directed entries, `N * (N - 1)`.
    #[must_use]
    pub fn directed_edge_count(&self) -> usize {
        self.len() * self.len().saturating_sub(1)
    }

    /// The rounding policy the weights were computed with.
    #[must_use]
    pub const fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }
}

impl WeightedGraph for DistanceGraph {
    fn vertices(&self) -> &[PointId] {
        &self.ids
    }

    fn contains(&self, id: PointId) -> bool {
        self.index.contains_key(&id)
    }

    fn weight(&self, from: PointId, to: PointId) -> Option<Weight> {
        let i = *self.index.get(&from)?;
        let j = *self.index.get(&to)?;
        (i != j).then(|| self.weights[i * self.len() + j])
    }

    fn neighbors(&self, id: PointId) -> impl Iterator<Item = (PointId, Weight)> + '_ {
        let n = self.len();
        self.index.get(&id).into_iter().flat_map(move |&row| {
            (0..n)
                .filter(move |&col| col != row)
                .map(move |col| (self.ids[col], self.weights[row * n + col]))
        })
    }
}
