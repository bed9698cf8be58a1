//! Shared types for the mstour pipeline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::distance::RoundingPolicy;
use crate::mst::{MstAlgorithm, TieBreak};

/// Identifier of a point as it appears in the input file.
///
/// TSPLIB numbers cities from 1, and the loader rejects zero.
pub type PointId = u32;

/// Integer edge weight (rounded Euclidean distance).
pub type Weight = u64;

/// A 2D city coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point together with its identifier, used as the serialized form of
/// [`PointSet`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedPoint {
    /// Point identifier.
    pub id: PointId,
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// The loaded cities, in input order.
///
/// Input order is the iteration order for every downstream stage: the
/// distance graph lists neighbors in this order and the default start
/// vertex is the first loaded id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<IdentifiedPoint>", try_from = "Vec<IdentifiedPoint>")]
pub struct PointSet {
    ids: Vec<PointId>,
    points: Vec<Point>,
    index: HashMap<PointId, usize>,
}

impl PointSet {
    /// Create an empty point set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point. Returns `false` (and leaves the set unchanged) if
    /// `id` is already present.
    pub fn push(&mut self, id: PointId, point: Point) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id, self.ids.len());
        self.ids.push(id);
        self.points.push(point);
        true
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if no points were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in input order.
    #[must_use]
    pub fn ids(&self) -> &[PointId] {
        &self.ids
    }

    /// Coordinates in input order (parallel to [`ids`](Self::ids)).
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// First identifier in input order.
    #[must_use]
    pub fn first_id(&self) -> Option<PointId> {
        self.ids.first().copied()
    }

    /// Position of `id` in input order.
    #[must_use]
    pub fn position(&self, id: PointId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Coordinates of `id`.
    #[must_use]
    pub fn get(&self, id: PointId) -> Option<Point> {
        self.position(id).map(|i| self.points[i])
    }

    /// Iterate `(id, point)` pairs in input order.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, Point)> + '_ {
        self.ids.iter().copied().zip(self.points.iter().copied())
    }
}

impl From<PointSet> for Vec<IdentifiedPoint> {
    fn from(set: PointSet) -> Self {
        set.iter()
            .map(|(id, p)| IdentifiedPoint { id, x: p.x, y: p.y })
            .collect()
    }
}

impl TryFrom<Vec<IdentifiedPoint>> for PointSet {
    type Error = PipelineError;

    fn try_from(entries: Vec<IdentifiedPoint>) -> Result<Self, Self::Error> {
        let mut set = Self::new();
        for (i, entry) in entries.into_iter().enumerate() {
            if !set.push(entry.id, Point::new(entry.x, entry.y)) {
                return Err(PipelineError::DuplicateId {
                    id: entry.id,
                    line: i + 1,
                });
            }
        }
        Ok(set)
    }
}

/// An MST edge, oriented in the direction it was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MstEdge {
    /// Vertex already in the tree when the edge was chosen.
    pub from: PointId,
    /// Vertex attached to the tree by this edge.
    pub to: PointId,
    /// Edge weight in the graph the tree was built from.
    pub weight: Weight,
}

/// A spanning tree as produced by the MST builder.
///
/// Edges are kept in discovery order; that order determines neighbor
/// order in the derived [`Adjacency`](crate::tour::Adjacency) and
/// therefore the shape of the extracted tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanningTree {
    start: PointId,
    edges: Vec<MstEdge>,
    total_weight: Weight,
}

impl SpanningTree {
    /// Assemble a tree from edges in discovery order.
    ///
    /// The total weight is computed from the edges. No structural
    /// validation happens here; see [`SpanningTree::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::WeightOverflow`] if the edge weights do
    /// not sum to a [`Weight`].
    pub fn new(start: PointId, edges: Vec<MstEdge>) -> Result<Self, PipelineError> {
        let total_weight = edges
            .iter()
            .try_fold(0, |sum: Weight, e| sum.checked_add(e.weight))
            .ok_or(PipelineError::WeightOverflow)?;
        Ok(Self {
            start,
            edges,
            total_weight,
        })
    }

    /// The root the tree was grown from.
    #[must_use]
    pub const fn start(&self) -> PointId {
        self.start
    }

    /// Edges in discovery order.
    #[must_use]
    pub fn edges(&self) -> &[MstEdge] {
        &self.edges
    }

    /// Sum of all edge weights.
    #[must_use]
    pub const fn total_weight(&self) -> Weight {
        self.total_weight
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` for the single-vertex tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// A closed tour: starts and ends at the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour(Vec<PointId>);

impl Tour {
    /// Create a tour from a closed id sequence.
    #[must_use]
    pub const fn new(ids: Vec<PointId>) -> Self {
        Self(ids)
    }

    /// The id sequence, including the repeated start at the end.
    #[must_use]
    pub fn ids(&self) -> &[PointId] {
        &self.0
    }

    /// Sequence length (`N + 1` for a valid tour over `N` points).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First id of the sequence.
    #[must_use]
    pub fn start(&self) -> Option<PointId> {
        self.0.first().copied()
    }

    /// The same cycle traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self(self.0.iter().rev().copied().collect())
    }
}

/// Configuration for the MST-to-tour pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Vertex to grow the tree from and start the tour at.
    ///
    /// `None` selects the first point in input order.
    pub start: Option<PointId>,

    /// How rounded distances resolve `.5` ties.
    pub rounding: RoundingPolicy,

    /// Which Prim variant builds the tree. Both produce identical trees.
    pub mst_algorithm: MstAlgorithm,

    /// Order among equal-cost candidate edges while growing the tree.
    pub tie_break: TieBreak,
}

impl PipelineConfig {
    /// Default start vertex (first loaded point).
    pub const DEFAULT_START: Option<PointId> = None;
    /// Default rounding policy.
    pub const DEFAULT_ROUNDING: RoundingPolicy = RoundingPolicy::HalfEven;
    /// Default MST algorithm.
    pub const DEFAULT_MST_ALGORITHM: MstAlgorithm = MstAlgorithm::Heap;
    /// Default tie-break order.
    pub const DEFAULT_TIE_BREAK: TieBreak = TieBreak::SourceFirst;
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start: Self::DEFAULT_START,
            rounding: Self::DEFAULT_ROUNDING,
            mst_algorithm: Self::DEFAULT_MST_ALGORITHM,
            tie_break: Self::DEFAULT_TIE_BREAK,
        }
    }
}

/// Result of running the full pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourResult {
    /// The loaded cities.
    pub points: PointSet,
    /// The minimum spanning tree.
    pub tree: SpanningTree,
    /// The closed tour derived from the tree.
    pub tour: Tour,
    /// Total MST weight.
    pub mst_weight: Weight,
    /// Total tour weight measured on the complete distance graph.
    pub tour_weight: Weight,
}

impl TourResult {
    /// Ratio of tour weight to MST weight, or `None` when the MST weight
    /// is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn approximation_ratio(&self) -> Option<f64> {
        (self.mst_weight > 0).then(|| self.tour_weight as f64 / self.mst_weight as f64)
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum PipelineError {
    /// A required section marker line was not found.
    #[error("missing `{marker}` marker line")]
    MissingMarker {
        /// The marker text that was expected.
        marker: String,
    },

    /// A coordinate line could not be parsed.
    #[error("line {line}: {reason}")]
    Parse {
        /// 1-based input line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// The same point id appeared twice.
    #[error("line {line}: duplicate point id {id}")]
    DuplicateId {
        /// The repeated id.
        id: PointId,
        /// 1-based input line number of the second occurrence.
        line: usize,
    },

    /// The `DIMENSION` header disagrees with the coordinate section.
    #[error("DIMENSION declares {declared} points but {found} were listed")]
    DimensionMismatch {
        /// Count declared in the header.
        declared: usize,
        /// Count actually parsed.
        found: usize,
    },

    /// The coordinate section contained no points.
    #[error("coordinate section is empty")]
    NoPoints,

    /// A vertex id was not present in the graph.
    #[error("vertex {0} not found")]
    VertexNotFound(PointId),

    /// The MST builder could not reach every vertex.
    #[error("graph is disconnected: reached {reached} of {total} vertices")]
    Disconnected {
        /// Vertices in the partial tree.
        reached: usize,
        /// Vertices in the graph.
        total: usize,
    },

    /// A distance is too large (or not finite) to be stored as a
    /// [`Weight`].
    #[error("distance between {from} and {to} is out of the integer weight range")]
    DistanceOutOfRange {
        /// First point.
        from: PointId,
        /// Second point.
        to: PointId,
    },

    /// A sum of weights exceeded [`Weight::MAX`].
    #[error("total weight exceeds {}", Weight::MAX)]
    WeightOverflow,

    /// An edge set that should be a spanning tree is not one.
    #[error("invalid spanning tree: {0}")]
    InvalidTree(String),

    /// A sequence that should be a closed Hamiltonian cycle is not one.
    #[error("invalid tour: {0}")]
    InvalidTour(String),

    /// A consecutive tour pair has no edge in the distance graph.
    #[error("no edge between {from} and {to}")]
    MissingEdge {
        /// Source vertex.
        from: PointId,
        /// Destination vertex.
        to: PointId,
    },

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn point_set_keeps_input_order() {
        let mut set = PointSet::new();
        assert!(set.push(7, Point::new(1.0, 1.0)));
        assert!(set.push(3, Point::new(2.0, 2.0)));
        assert!(set.push(5, Point::new(3.0, 3.0)));
        assert_eq!(set.ids(), &[7, 3, 5]);
        assert_eq!(set.first_id(), Some(7));
        assert_eq!(set.position(5), Some(2));
        assert_eq!(set.get(3), Some(Point::new(2.0, 2.0)));
        assert!(set.get(4).is_none());
    }

    #[test]
    fn point_set_rejects_duplicates() {
        let mut set = PointSet::new();
        assert!(set.push(1, Point::new(0.0, 0.0)));
        assert!(!set.push(1, Point::new(9.0, 9.0)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(1), Some(Point::new(0.0, 0.0)));
    }

    #[test]
    fn point_set_serde_preserves_order() {
        let mut set = PointSet::new();
        set.push(2, Point::new(1.5, -2.0));
        set.push(1, Point::new(0.0, 4.25));
        let json = serde_json::to_string(&set).unwrap();
        let back: PointSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ids(), &[2, 1]);
        assert_eq!(back, set);
    }

    #[test]
    fn point_set_deserialize_rejects_duplicates() {
        let json = r#"[{"id":1,"x":0.0,"y":0.0},{"id":1,"x":1.0,"y":1.0}]"#;
        assert!(serde_json::from_str::<PointSet>(json).is_err());
    }

    #[test]
    fn spanning_tree_sums_weights() {
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
        assert_eq!(tree.total_weight(), 7);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.start(), 1);
    }

    #[test]
    fn spanning_tree_rejects_weight_overflow() {
        let edges = vec![
            MstEdge {
                from: 1,
                to: 2,
                weight: Weight::MAX - 1,
            },
            MstEdge {
                from: 2,
                to: 3,
                weight: 2,
            },
        ];
        assert_eq!(
            SpanningTree::new(1, edges).unwrap_err(),
            PipelineError::WeightOverflow
        );
    }

    #[test]
    fn tour_reversed() {
        let tour = Tour::new(vec![1, 2, 3, 1]);
        assert_eq!(tour.reversed().ids(), &[1, 3, 2, 1]);
        assert_eq!(tour.start(), Some(1));
    }

    #[test]
    fn approximation_ratio_handles_zero_mst() {
        let mut points = PointSet::new();
        points.push(1, Point::new(0.0, 0.0));
        let result = TourResult {
            points,
            tree: SpanningTree::new(1, Vec::new()).unwrap(),
            tour: Tour::new(vec![1, 1]),
            mst_weight: 0,
            tour_weight: 0,
        };
        assert!(result.approximation_ratio().is_none());
    }

    #[test]
    fn pipeline_config_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.start, None);
        assert_eq!(config.rounding, RoundingPolicy::HalfEven);
        assert_eq!(config.mst_algorithm, MstAlgorithm::Heap);
        assert_eq!(config.tie_break, TieBreak::SourceFirst);
    }

    #[test]
    fn pipeline_config_partial_json_uses_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"start": 4}"#).unwrap();
        assert_eq!(config.start, Some(4));
        assert_eq!(config.mst_algorithm, MstAlgorithm::Heap);

        let config: PipelineConfig =
            serde_json::from_str(r#"{"tie_break": "target-first"}"#).unwrap();
        assert_eq!(config.tie_break, TieBreak::TargetFirst);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            PipelineError::VertexNotFound(9).to_string(),
            "vertex 9 not found"
        );
        assert_eq!(
            PipelineError::Disconnected {
                reached: 2,
                total: 5
            }
            .to_string(),
            "graph is disconnected: reached 2 of 5 vertices",
        );
        assert_eq!(
            PipelineError::Parse {
                line: 7,
                reason: "expected 3 tokens, found 2".to_string()
            }
            .to_string(),
            "line 7: expected 3 tokens, found 2",
        );
    }

    #[test]
    fn error_serde_round_trip() {
        let err = PipelineError::MissingEdge { from: 3, to: 8 };
        let json = serde_json::to_string(&err).unwrap();
        let back: PipelineError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
