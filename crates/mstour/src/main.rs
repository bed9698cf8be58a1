//! mstour: build an MST-based TSP tour from a TSPLIB coordinate file.
//!
//! Loads the coordinates, builds the complete rounded-distance graph,
//! grows a minimum spanning tree with Prim's algorithm, and walks it in
//! preorder to obtain a closed tour. Optional extras:
//!
//! - Per-stage timing diagnostics (`--diagnostics`)
//! - SVG rendering of points, tree, and tour (`--svg`)
//! - A random-tour baseline for comparison (`--baseline`)
//! - Tours from several start vertices over the same tree (`--multi-start`)
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin mstour -- [OPTIONS] <TSP_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use mstour_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use mstour_pipeline::{
    BaselineConfig, BaselineReport, Evaluated, MultiStartSummary, Pipeline, PipelineConfig,
    PipelineError, StartSelection, TourResult,
};
use serde::Serialize;

use crate::logging::LogLevel;

/// Approximate Euclidean TSP tours from a minimum spanning tree.
///
/// Prints the MST weight, the tour, and the tour weight for the given
/// TSPLIB-style coordinate file.
#[derive(Parser)]
#[command(name = "mstour", version)]
struct Cli {
    /// Path to the input file (`NODE_COORD_SECTION` ... `EOF`).
    tsp_path: PathBuf,

    /// Vertex to grow the tree from and start the tour at (default: first point).
    #[arg(long)]
    start: Option<u32>,

    /// How `.5` distance ties are rounded.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_ROUNDING)]
    rounding: Rounding,

    /// Prim variant used to build the tree.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_ALGORITHM)]
    mst_algorithm: Algorithm,

    /// Which equal-cost candidate edge Prim takes first.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_TIE_BREAK)]
    tie_break: TieBreak,

    /// Write an SVG drawing of points, tree, and tour to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Print results as JSON instead of the text report.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, `--start`, `--rounding`, `--mst-algorithm`, and
    /// `--tie-break` are ignored. The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Print per-stage timing diagnostics to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Also sample random tours and report group minima.
    #[arg(long)]
    baseline: bool,

    /// RNG seed for the random baseline.
    #[arg(long, default_value_t = BaselineConfig::DEFAULT_SEED)]
    baseline_seed: u64,

    /// Write the text reports to this file as well.
    #[arg(long)]
    results: Option<PathBuf>,

    /// Walk the tree from several random starts (default count: ceil(sqrt(N))).
    #[arg(
        long,
        value_name = "COUNT",
        num_args = 0..=1,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..),
    )]
    multi_start: Option<Option<usize>>,

    /// RNG seed for multi-start sampling.
    #[arg(long, default_value_t = StartSelection::DEFAULT_SEED)]
    multi_start_seed: u64,

    /// Log verbosity (logs go to stderr).
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

/// Rounding policy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Rounding {
    /// Ties go to the even integer.
    HalfEven,
    /// Ties go away from zero.
    HalfAwayFromZero,
}

/// MST algorithm selection.
#[derive(Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Binary-heap Prim, O(E log E).
    Heap,
    /// Array-scan Prim, O(V^2).
    DenseScan,
}

/// Tie-break selection.
#[derive(Clone, Copy, ValueEnum)]
enum TieBreak {
    /// Smallest tree-side vertex first.
    SourceFirst,
    /// Smallest newly attached vertex first.
    TargetFirst,
}

const fn rounding_from_pipeline(r: mstour_pipeline::RoundingPolicy) -> Rounding {
    match r {
        mstour_pipeline::RoundingPolicy::HalfEven => Rounding::HalfEven,
        mstour_pipeline::RoundingPolicy::HalfAwayFromZero => Rounding::HalfAwayFromZero,
    }
}

const fn algorithm_from_pipeline(a: mstour_pipeline::MstAlgorithm) -> Algorithm {
    match a {
        mstour_pipeline::MstAlgorithm::Heap => Algorithm::Heap,
        mstour_pipeline::MstAlgorithm::DenseScan => Algorithm::DenseScan,
    }
}

const fn tie_break_from_pipeline(t: mstour_pipeline::TieBreak) -> TieBreak {
    match t {
        mstour_pipeline::TieBreak::SourceFirst => TieBreak::SourceFirst,
        mstour_pipeline::TieBreak::TargetFirst => TieBreak::TargetFirst,
    }
}

/// CLI defaults derived from [`PipelineConfig`] so the two cannot
/// silently diverge.
const CLI_DEFAULT_ROUNDING: Rounding = rounding_from_pipeline(PipelineConfig::DEFAULT_ROUNDING);
const CLI_DEFAULT_ALGORITHM: Algorithm =
    algorithm_from_pipeline(PipelineConfig::DEFAULT_MST_ALGORITHM);
const CLI_DEFAULT_TIE_BREAK: TieBreak =
    tie_break_from_pipeline(PipelineConfig::DEFAULT_TIE_BREAK);

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(PipelineConfig {
        start: cli.start,
        rounding: match cli.rounding {
            Rounding::HalfEven => mstour_pipeline::RoundingPolicy::HalfEven,
            Rounding::HalfAwayFromZero => mstour_pipeline::RoundingPolicy::HalfAwayFromZero,
        },
        mst_algorithm: match cli.mst_algorithm {
            Algorithm::Heap => mstour_pipeline::MstAlgorithm::Heap,
            Algorithm::DenseScan => mstour_pipeline::MstAlgorithm::DenseScan,
        },
        tie_break: match cli.tie_break {
            TieBreak::SourceFirst => mstour_pipeline::TieBreak::SourceFirst,
            TieBreak::TargetFirst => mstour_pipeline::TieBreak::TargetFirst,
        },
    })
}

/// Drive every stage and stop at [`Evaluated`], keeping the distance
/// graph for the extras.
fn evaluate(text: &str, config: &PipelineConfig) -> Result<Evaluated, PipelineError> {
    Pipeline::new(text, config.clone())
        .load()?
        .build_graph()?
        .span()?
        .extract_tour()?
        .evaluate()
}

/// Everything `--json` prints.
#[derive(Serialize)]
struct JsonOutput<'a> {
    config: &'a PipelineConfig,
    result: &'a TourResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<&'a PipelineDiagnostics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    baseline: Option<&'a BaselineReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    multi_start: Option<&'a MultiStartSummary>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(msg) = logging::init_logger(cli.log_level) {
        eprintln!("{msg}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = config_from_cli(cli)?;

    let text = std::fs::read_to_string(&cli.tsp_path)
        .map_err(|e| format!("Error reading {}: {e}", cli.tsp_path.display()))?;
    log::info!(
        "read {} ({} bytes), config {config:?}",
        cli.tsp_path.display(),
        text.len(),
    );

    let (evaluated, diagnostics) = if cli.diagnostics {
        let (evaluated, diagnostics) =
            mstour_pipeline::diagnostics::run_with_diagnostics(&text, &config, &StdClock)
                .map_err(|e| format!("Pipeline error: {e}"))?;
        (evaluated, Some(diagnostics))
    } else {
        let evaluated = evaluate(&text, &config).map_err(|e| format!("Pipeline error: {e}"))?;
        (evaluated, None)
    };

    if let Some(ref diagnostics) = diagnostics {
        eprintln!("{}", diagnostics.report());
        eprintln!();
    }

    let baseline = if cli.baseline {
        let baseline_config = BaselineConfig {
            seed: cli.baseline_seed,
            ..BaselineConfig::default()
        };
        Some(
            mstour_pipeline::run_baseline(evaluated.graph(), &baseline_config)
                .map_err(|e| format!("Baseline error: {e}"))?,
        )
    } else {
        None
    };

    let multi_start = match cli.multi_start {
        Some(count) => {
            let selection = StartSelection::Random {
                count,
                seed: cli.multi_start_seed,
            };
            Some(
                mstour_pipeline::multi_start(evaluated.graph(), evaluated.tree(), &selection)
                    .map_err(|e| format!("Multi-start error: {e}"))?,
            )
        }
        None => None,
    };

    let result = evaluated.into_result();

    let mut sections = vec![mstour_export::console_report(&result)];
    if let Some(ref report) = baseline {
        sections.push(mstour_export::baseline_report(report));
    }
    if let Some(ref summary) = multi_start {
        sections.push(mstour_export::multi_start_report(summary));
    }
    let text_report = sections.join("\n\n");

    if cli.json {
        let output = JsonOutput {
            config: &config,
            result: &result,
            diagnostics: diagnostics.as_ref(),
            baseline: baseline.as_ref(),
            multi_start: multi_start.as_ref(),
        };
        let json = serde_json::to_string_pretty(&output)
            .map_err(|e| format!("Error serializing results: {e}"))?;
        println!("{json}");
    } else {
        println!("{text_report}");
    }

    if let Some(ref results_path) = cli.results {
        std::fs::write(results_path, format!("{text_report}\n"))
            .map_err(|e| format!("Error writing results to {}: {e}", results_path.display()))?;
        eprintln!("Results written to {}", results_path.display());
    }

    if let Some(ref svg_path) = cli.svg {
        let title = cli
            .tsp_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("mstour");
        let desc = format!(
            "MST weight {}, tour weight {} ({config:?})",
            result.mst_weight, result.tour_weight,
        );
        let metadata = mstour_export::SvgMetadata {
            title: Some(title),
            description: Some(&desc),
        };
        let svg = mstour_export::to_svg(&result.points, &result.tree, &result.tour, &metadata);
        std::fs::write(svg_path, &svg)
            .map_err(|e| format!("Error writing SVG to {}: {e}", svg_path.display()))?;
        eprintln!(
            "SVG written to {} ({} bytes)",
            svg_path.display(),
            svg.len(),
        );
    }

    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
