//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process`] which runs the whole chain in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use mstour_pipeline::{Pipeline, PipelineConfig, PipelineError};
//! # fn run(text: &str) -> Result<(), PipelineError> {
//! let spanned = Pipeline::new(text, PipelineConfig::default())
//!     .load()?
//!     .build_graph()?
//!     .span()?;
//! println!("MST weight: {}", spanned.tree().total_weight());
//!
//! let result = spanned.extract_tour()?.evaluate()?.into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), carrying all previously computed
//! intermediates. Every stage from [`GraphBuilt`] onward holds the
//! `N x N` distance matrix.

use crate::diagnostics::StageMetrics;
use crate::distance::DistanceGraph;
use crate::graph::WeightedGraph;
use crate::mst::SpanningTreeBuilder;
use crate::tour::{evaluate_tour, tour_from_tree};
use crate::tsplib::{TsplibHeader, TsplibInstance};
use crate::types::{PipelineConfig, PipelineError, PointSet, SpanningTree, Tour, TourResult, Weight};

/// Entry point for the incremental pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Create a pipeline over TSPLIB-style `text`.
    ///
    /// Nothing is parsed until [`Pending::load`] is called.
    pub fn new(text: impl Into<String>, config: PipelineConfig) -> Pending {
        Pending {
            config,
            text: text.into(),
        }
    }
}

/// Common behavior of every pipeline stage.
pub trait PipelineStage: Sized {
    /// Short stage name used in diagnostics and logs.
    const NAME: &str;

    /// The configuration the pipeline was created with.
    fn config(&self) -> &PipelineConfig;

    /// Metrics describing the work done to reach this stage, or `None`
    /// for the initial stage.
    fn metrics(&self) -> Option<StageMetrics>;

    /// Run every remaining stage and return the final result.
    ///
    /// # Errors
    ///
    /// Returns the first [`PipelineError`] raised by a remaining stage.
    fn complete(self) -> Result<TourResult, PipelineError>;
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing, call .load() to continue"]
pub struct Pending {
    config: PipelineConfig,
    text: String,
}

impl Pending {
    /// The raw input text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse the input and advance to the [`Loaded`] stage.
    ///
    /// # Errors
    ///
    /// Returns the loader's [`PipelineError`] for a malformed input.
    pub fn load(self) -> Result<Loaded, PipelineError> {
        let instance = crate::tsplib::parse(&self.text)?;
        Ok(Loaded {
            config: self.config,
            instance,
            input_bytes: self.text.len(),
        })
    }
}

// ───────────────────────── Stage 1: Loaded ───────────────────────────

/// Pipeline state after parsing the coordinate section.
#[must_use = "pipeline stages are consumed by advancing, call .build_graph() to continue"]
pub struct Loaded {
    config: PipelineConfig,
    instance: TsplibInstance,
    input_bytes: usize,
}

impl Loaded {
    /// Header keywords.
    #[must_use]
    pub const fn header(&self) -> &TsplibHeader {
        &self.instance.header
    }

    /// The loaded points.
    #[must_use]
    pub const fn points(&self) -> &PointSet {
        &self.instance.points
    }

    /// Build the complete distance graph and advance.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DistanceOutOfRange`] when a rounded
    /// distance does not fit a [`Weight`].
    pub fn build_graph(self) -> Result<GraphBuilt, PipelineError> {
        let graph = DistanceGraph::build(&self.instance.points, self.config.rounding)?;
        Ok(GraphBuilt {
            config: self.config,
            instance: self.instance,
            graph,
        })
    }
}

// ───────────────────────── Stage 2: GraphBuilt ───────────────────────

/// Pipeline state after building the distance graph.
#[must_use = "pipeline stages are consumed by advancing, call .span() to continue"]
pub struct GraphBuilt {
    config: PipelineConfig,
    instance: TsplibInstance,
    graph: DistanceGraph,
}

impl GraphBuilt {
    /// The loaded points.
    #[must_use]
    pub const fn points(&self) -> &PointSet {
        &self.instance.points
    }

    /// The complete distance graph.
    #[must_use]
    pub const fn graph(&self) -> &DistanceGraph {
        &self.graph
    }

    /// Build the minimum spanning tree and advance.
    ///
    /// The tree is grown from `config.start`, or from the first loaded
    /// point when no start is configured, with ties broken by
    /// `config.tie_break`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::VertexNotFound`] for an unknown start,
    /// [`PipelineError::NoPoints`] for an empty point set, and
    /// [`PipelineError::WeightOverflow`] for a tree too heavy to sum.
    pub fn span(self) -> Result<Spanned, PipelineError> {
        let start = match self.config.start {
            Some(id) => id,
            None => self.instance.points.first_id().ok_or(PipelineError::NoPoints)?,
        };
        let tree = self
            .config
            .mst_algorithm
            .build_with(&self.graph, start, self.config.tie_break)?;
        Ok(Spanned {
            config: self.config,
            instance: self.instance,
            graph: self.graph,
            tree,
        })
    }
}

// ───────────────────────── Stage 3: Spanned ──────────────────────────

/// Pipeline state after building the spanning tree.
#[must_use = "pipeline stages are consumed by advancing, call .extract_tour() to continue"]
pub struct Spanned {
    config: PipelineConfig,
    instance: TsplibInstance,
    graph: DistanceGraph,
    tree: SpanningTree,
}

impl Spanned {
    /// The loaded points.
    #[must_use]
    pub const fn points(&self) -> &PointSet {
        &self.instance.points
    }

    /// The complete distance graph.
    #[must_use]
    pub const fn graph(&self) -> &DistanceGraph {
        &self.graph
    }

    /// The minimum spanning tree.
    #[must_use]
    pub const fn tree(&self) -> &SpanningTree {
        &self.tree
    }

    /// Walk the tree in preorder, check the tour, and advance.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidTour`] if the walk does not cover
    /// every point exactly once.
    pub fn extract_tour(self) -> Result<Toured, PipelineError> {
        let tour = tour_from_tree(&self.tree)?;
        tour.validate(&self.instance.points)?;
        Ok(Toured {
            config: self.config,
            instance: self.instance,
            graph: self.graph,
            tree: self.tree,
            tour,
        })
    }
}

// ───────────────────────── Stage 4: Toured ───────────────────────────

/// Pipeline state after extracting the tour.
#[must_use = "pipeline stages are consumed by advancing, call .evaluate() to continue"]
pub struct Toured {
    config: PipelineConfig,
    instance: TsplibInstance,
    graph: DistanceGraph,
    tree: SpanningTree,
    tour: Tour,
}

impl Toured {
    /// The minimum spanning tree.
    #[must_use]
    pub const fn tree(&self) -> &SpanningTree {
        &self.tree
    }

    /// The closed tour.
    #[must_use]
    pub const fn tour(&self) -> &Tour {
        &self.tour
    }

    /// Sum the tour on the distance graph and advance.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingEdge`] if a consecutive pair has
    /// no edge and [`PipelineError::WeightOverflow`] if the sum does not
    /// fit a [`Weight`].
    pub fn evaluate(self) -> Result<Evaluated, PipelineError> {
        let tour_weight = evaluate_tour(&self.graph, &self.tour)?;
        log::info!(
            "tour weight {tour_weight} over {} points (MST {})",
            self.instance.points.len(),
            self.tree.total_weight(),
        );
        Ok(Evaluated {
            config: self.config,
            instance: self.instance,
            graph: self.graph,
            tree: self.tree,
            tour: self.tour,
            tour_weight,
        })
    }
}

// ───────────────────────── Stage 5: Evaluated ────────────────────────

/// Final pipeline state.
#[must_use = "call .into_result() to take the pipeline output"]
pub struct Evaluated {
    config: PipelineConfig,
    instance: TsplibInstance,
    graph: DistanceGraph,
    tree: SpanningTree,
    tour: Tour,
    tour_weight: Weight,
}

impl Evaluated {
    /// Header keywords of the input.
    #[must_use]
    pub const fn header(&self) -> &TsplibHeader {
        &self.instance.header
    }

    /// The loaded points.
    #[must_use]
    pub const fn points(&self) -> &PointSet {
        &self.instance.points
    }

    /// The complete distance graph.
    #[must_use]
    pub const fn graph(&self) -> &DistanceGraph {
        &self.graph
    }

    /// The minimum spanning tree.
    #[must_use]
    pub const fn tree(&self) -> &SpanningTree {
        &self.tree
    }

    /// The closed tour.
    #[must_use]
    pub const fn tour(&self) -> &Tour {
        &self.tour
    }

    /// Total tour weight.
    #[must_use]
    pub const fn tour_weight(&self) -> Weight {
        self.tour_weight
    }

    /// Ratio of tour weight to MST weight, or `None` when the MST weight
    /// is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn approximation_ratio(&self) -> Option<f64> {
        let mst_weight = self.tree.total_weight();
        (mst_weight > 0).then(|| self.tour_weight as f64 / mst_weight as f64)
    }

    /// Consume the pipeline and return the result.
    #[must_use]
    pub fn into_result(self) -> TourResult {
        TourResult {
            mst_weight: self.tree.total_weight(),
            tour_weight: self.tour_weight,
            points: self.instance.points,
            tree: self.tree,
            tour: self.tour,
        }
    }
}

// ───────────────────────── PipelineStage impls ───────────────────────

impl PipelineStage for Pending {
    const NAME: &str = "source";

    fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }

    fn complete(self) -> Result<TourResult, PipelineError> {
        self.load()?.complete()
    }
}

impl PipelineStage for Loaded {
    const NAME: &str = "load";

    fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Load {
            input_bytes: self.input_bytes,
            name: self.instance.header.name.clone(),
            point_count: self.instance.points.len(),
        })
    }

    fn complete(self) -> Result<TourResult, PipelineError> {
        self.build_graph()?.complete()
    }
}

impl PipelineStage for GraphBuilt {
    const NAME: &str = "distance graph";

    fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::DistanceGraph {
            vertex_count: self.graph.vertex_count(),
            directed_edge_count: self.graph.directed_edge_count(),
            rounding: self.graph.rounding(),
        })
    }

    fn complete(self) -> Result<TourResult, PipelineError> {
        self.span()?.complete()
    }
}

impl PipelineStage for Spanned {
    const NAME: &str = "spanning tree";

    fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::SpanningTree {
            algorithm: self.config.mst_algorithm,
            tie_break: self.config.tie_break,
            start: self.tree.start(),
            edge_count: self.tree.len(),
            total_weight: self.tree.total_weight(),
        })
    }

    fn complete(self) -> Result<TourResult, PipelineError> {
        self.extract_tour()?.complete()
    }
}

impl PipelineStage for Toured {
    const NAME: &str = "tour";

    fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Tour {
            length: self.tour.len(),
        })
    }

    fn complete(self) -> Result<TourResult, PipelineError> {
        self.evaluate()?.complete()
    }
}

impl PipelineStage for Evaluated {
    const NAME: &str = "evaluate";

    fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Evaluate {
            tour_weight: self.tour_weight,
            mst_weight: self.tree.total_weight(),
        })
    }

    fn complete(self) -> Result<TourResult, PipelineError> {
        Ok(self.into_result())
    }
}
