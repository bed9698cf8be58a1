//! Plain-text reports.
//!
//! Every report is a block of `Label: value` lines without a trailing
//! newline, ready for `println!` or for writing to a results file.

use std::fmt::Write;

use mstour_pipeline::{BaselineReport, MultiStartSummary, Tour, TourResult};

/// Format a tour as `a -> b -> ... -> a`.
#[must_use]
pub fn format_tour(tour: &Tour) -> String {
    tour.ids()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// The three-line console report for a pipeline run.
///
/// ```
/// use mstour_export::report::console_report;
/// use mstour_pipeline::{PipelineConfig, process};
///
/// let text = "NODE_COORD_SECTION\n1 0 0\n2 0 3\n3 4 3\n4 4 0\nEOF\n";
/// let result = process(text, &PipelineConfig::default()).unwrap();
/// assert_eq!(
///     console_report(&result),
///     "Total weight of MST: 10\n\
///      TSP cycle based on MST: 1 -> 2 -> 4 -> 3 -> 1\n\
///      Total weight of TSP cycle based on MST: 16",
/// );
/// ```
#[must_use]
pub fn console_report(result: &TourResult) -> String {
    format!(
        "Total weight of MST: {}\nTSP cycle based on MST: {}\nTotal weight of TSP cycle based on MST: {}",
        result.mst_weight,
        format_tour(&result.tour),
        result.tour_weight,
    )
}

/// Summary of a random-tour baseline, one line per group batch plus the
/// overall minimum.
#[must_use]
pub fn baseline_report(report: &BaselineReport) -> String {
    let mut out = String::new();
    for group in &report.groups {
        let _ = writeln!(
            out,
            "Average of {}-minimum groups: {}",
            group.spec.group_size, group.mean_of_minima,
        );
    }
    let _ = write!(out, "Overall minimum: {}", report.overall_min);
    out
}

/// Summary of a multi-start run.
#[must_use]
pub fn multi_start_report(summary: &MultiStartSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total weight of MST: {}", summary.mst_weight);
    let _ = writeln!(out, "Starts: {}", summary.runs.len());
    for run in &summary.runs {
        let _ = writeln!(out, "Start {}: {}", run.start, run.weight);
    }
    let _ = writeln!(out, "Average tour weight: {:.2}", summary.mean);
    let _ = writeln!(
        out,
        "Best tour weight: {} (start {})",
        summary.best.weight, summary.best.start,
    );
    let _ = write!(out, "Best tour: {}", format_tour(&summary.best_tour));
    out
}
