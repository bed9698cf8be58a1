//! Pipeline diagnostics: timing, counts, and weights for each stage.
//!
//! Time is read through the [`Clock`] trait so this crate stays free of
//! platform timers; the CLI supplies an implementation backed by
//! [`std::time::Instant`].
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::distance::RoundingPolicy;
use crate::mst::{MstAlgorithm, TieBreak};
use crate::pipeline::{Evaluated, Pipeline, PipelineStage};
use crate::types::{PipelineConfig, PipelineError, PointId, TourResult, Weight};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Per-stage timings and metrics, in execution order.
    pub stages: Vec<StageDiagnostics>,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Stage name.
    pub name: String,
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Input parsing.
    Load {
        /// Size of the input text in bytes.
        input_bytes: usize,
        /// `NAME` header entry, if present.
        name: Option<String>,
        /// Number of points loaded.
        point_count: usize,
    },
    /// Complete distance graph construction.
    DistanceGraph {
        /// Number of vertices.
        vertex_count: usize,
        /// Number of directed entries, `N * (N - 1)`.
        directed_edge_count: usize,
        /// Rounding policy applied to distances.
        rounding: RoundingPolicy,
    },
    /// Minimum spanning tree construction.
    SpanningTree {
        /// Prim variant used.
        algorithm: MstAlgorithm,
        /// Order among equal-cost candidates.
        tie_break: TieBreak,
        /// Root vertex.
        start: PointId,
        /// Number of tree edges.
        edge_count: usize,
        /// Total tree weight.
        total_weight: Weight,
    },
    /// Preorder tour extraction.
    Tour {
        /// Stops in the closed tour (`N + 1`).
        length: usize,
    },
    /// Tour evaluation.
    Evaluate {
        /// Total tour weight.
        tour_weight: Weight,
        /// Total MST weight.
        mst_weight: Weight,
    },
}

/// High-level summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Number of points.
    pub point_count: usize,
    /// Total MST weight.
    pub mst_weight: Weight,
    /// Total tour weight.
    pub tour_weight: Weight,
    /// Tour weight divided by MST weight (`None` for a zero-weight MST).
    pub approximation_ratio: Option<f64>,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!("Points: {}", self.summary.point_count));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(72));

        let total_ms = duration_ms(self.total_duration);
        for stage in &self.stages {
            let ms = duration_ms(stage.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&stage.metrics);
            lines.push(format!("{:<16} {ms:>8.3}ms {pct:>9.1}%  {details}", stage.name));
        }

        lines.push(String::new());
        let ratio = self
            .summary
            .approximation_ratio
            .map_or_else(|| "n/a".to_string(), |r| format!("{r:.4}"));
        lines.push(format!(
            "MST weight: {}  |  Tour weight: {}  |  Tour/MST: {ratio}",
            self.summary.mst_weight, self.summary.tour_weight,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Load {
            input_bytes,
            name,
            point_count,
        } => match name {
            Some(name) => format!("{name}: {input_bytes} bytes -> {point_count} points"),
            None => format!("{input_bytes} bytes -> {point_count} points"),
        },
        StageMetrics::DistanceGraph {
            vertex_count,
            directed_edge_count,
            rounding,
        } => format!("{vertex_count} vertices, {directed_edge_count} entries ({rounding:?})"),
        StageMetrics::SpanningTree {
            algorithm,
            tie_break,
            start,
            edge_count,
            total_weight,
        } => format!(
            "{algorithm:?} ({tie_break:?}) from {start}: {edge_count} edges, weight {total_weight}"
        ),
        StageMetrics::Tour { length } => format!("{length} stops"),
        StageMetrics::Evaluate {
            tour_weight,
            mst_weight,
        } => format!("weight {tour_weight} (MST {mst_weight})"),
    }
}

/// Append the metrics of `stage`, timed from `since`.
fn record<S: PipelineStage, C: Clock>(
    stages: &mut Vec<StageDiagnostics>,
    clock: &C,
    since: &C::Instant,
    stage: &S,
) {
    let duration = clock.elapsed(since);
    if let Some(metrics) = stage.metrics() {
        log::debug!("{}: {}", S::NAME, format_metrics(&metrics));
        stages.push(StageDiagnostics {
            name: S::NAME.to_string(),
            duration,
            metrics,
        });
    }
}

/// Run the full pipeline, timing every stage.
///
/// # Errors
///
/// Returns the first [`PipelineError`] raised by any stage.
pub fn process_with_diagnostics<C: Clock>(
    text: &str,
    config: &PipelineConfig,
    clock: &C,
) -> Result<(TourResult, PipelineDiagnostics), PipelineError> {
    let (evaluated, diagnostics) = run_with_diagnostics(text, config, clock)?;
    Ok((evaluated.into_result(), diagnostics))
}

/// Run the full pipeline, timing every stage, and keep the final stage
/// so the caller can reuse its distance graph and tree.
///
/// # Errors
///
/// Returns the first [`PipelineError`] raised by any stage.
pub fn run_with_diagnostics<C: Clock>(
    text: &str,
    config: &PipelineConfig,
    clock: &C,
) -> Result<(Evaluated, PipelineDiagnostics), PipelineError> {
    let mut stages = Vec::with_capacity(5);
    let total_start = clock.now();

    let t = clock.now();
    let loaded = Pipeline::new(text, config.clone()).load()?;
    record(&mut stages, clock, &t, &loaded);

    let t = clock.now();
    let built = loaded.build_graph()?;
    record(&mut stages, clock, &t, &built);

    let t = clock.now();
    let spanned = built.span()?;
    record(&mut stages, clock, &t, &spanned);

    let t = clock.now();
    let toured = spanned.extract_tour()?;
    record(&mut stages, clock, &t, &toured);

    let t = clock.now();
    let evaluated = toured.evaluate()?;
    record(&mut stages, clock, &t, &evaluated);

    let total_duration = clock.elapsed(&total_start);

    let summary = PipelineSummary {
        point_count: evaluated.points().len(),
        mst_weight: evaluated.tree().total_weight(),
        tour_weight: evaluated.tour_weight(),
        approximation_ratio: evaluated.approximation_ratio(),
    };

    Ok((
        evaluated,
        PipelineDiagnostics {
            stages,
            total_duration,
            summary,
        },
    ))
}
