//! mstour-export: Pure report and SVG serializers (sans-IO)
//!
//! Converts pipeline results into console text and SVG drawings. Every
//! function returns a `String`; writing it anywhere is the caller's job.

pub mod report;
pub mod svg;

pub use report::{baseline_report, console_report, multi_start_report};
pub use svg::{SvgMetadata, to_svg};
