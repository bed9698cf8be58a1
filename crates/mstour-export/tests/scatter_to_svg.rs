//! Integration test: run the scatter40 sample through the full pipeline and export to SVG.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;

#[test]
fn scatter_pipeline_to_svg() {
    // Locate the sample relative to the workspace root.
    let workspace_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf();
    let tsp_path = workspace_root.join("assets/examples/scatter40.tsp");
    assert!(tsp_path.exists(), "scatter40 sample not found at {tsp_path:?}");

    let text = std::fs::read_to_string(&tsp_path).unwrap();

    let config = mstour_pipeline::PipelineConfig::default();
    let result = mstour_pipeline::process(&text, &config).expect("pipeline should succeed");
    eprintln!(
        "Pipeline produced MST weight {} and tour weight {}",
        result.mst_weight, result.tour_weight,
    );

    let report = mstour_export::console_report(&result);
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Total weight of MST: 452");
    assert!(lines[1].starts_with("TSP cycle based on MST: 1 -> "));
    assert!(lines[1].ends_with(" -> 1"));
    assert_eq!(lines[2], "Total weight of TSP cycle based on MST: 718");

    let metadata = mstour_export::SvgMetadata {
        title: Some("scatter40"),
        description: Some("MST-based tour"),
    };
    let svg = mstour_export::to_svg(&result.points, &result.tree, &result.tour, &metadata);

    // Basic structural assertions.
    assert!(svg.contains("<svg"));
    assert!(svg.contains("<path"));
    assert!(svg.contains("</svg>"));
    assert_eq!(svg.matches("<circle").count(), 40);
    assert_eq!(svg.matches("<line").count(), 39);

    // Write SVG to a temp location so we can inspect it.
    let output_path = workspace_root.join("target/scatter40-output.svg");
    if std::fs::create_dir_all(workspace_root.join("target")).is_ok() {
        std::fs::write(&output_path, &svg).unwrap();
        eprintln!("SVG written to {output_path:?} ({} bytes)", svg.len());
    }
}
