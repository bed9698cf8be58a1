//! SVG export serializer.
//!
//! Renders a pipeline result with the [`svg`] crate: the tour as one
//! green `<path>`, spanning-tree edges as red dashed `<line>` elements,
//! and every point as a blue `<circle>`. The `viewBox` is fitted to the
//! bounding box of the points plus a margin, and the y axis is flipped
//! so that larger y values are drawn higher, as on a plot.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use geo::{BoundingRect, MultiPoint, Rect};
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Group, Line, Path, Title};
use svg::node::{Text, Value};

use mstour_pipeline::{Point, PointSet, SpanningTree, Tour};

/// Margin around the points as a fraction of the larger extent.
const MARGIN_FRACTION: f64 = 0.05;
/// Point radius as a fraction of the larger extent.
const POINT_RADIUS_FRACTION: f64 = 0.006;
/// Stroke width as a fraction of the larger extent.
const STROKE_FRACTION: f64 = 0.002;
/// Extent used when all points coincide.
const MIN_EXTENT: f64 = 1.0;

const TOUR_COLOR: &str = "green";
const TREE_COLOR: &str = "red";
const POINT_COLOR: &str = "blue";

/// Metadata to embed in the SVG document.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the instance name or input file stem.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,
}

/// Maps point coordinates into the drawing's coordinate space.
#[derive(Debug, Clone, Copy)]
struct Frame {
    min_y: f64,
    max_y: f64,
    extent: f64,
    view_box: (f64, f64, f64, f64),
}

impl Frame {
    fn fit(points: &PointSet) -> Option<Self> {
        let multi: MultiPoint<f64> = points
            .points()
            .iter()
            .map(|p| geo::Point::new(p.x, p.y))
            .collect();
        let rect: Rect<f64> = multi.bounding_rect()?;

        let extent = rect.width().max(rect.height()).max(MIN_EXTENT);
        let margin = extent * MARGIN_FRACTION;
        Some(Self {
            min_y: rect.min().y,
            max_y: rect.max().y,
            extent,
            view_box: (
                rect.min().x - margin,
                rect.min().y - margin,
                2.0f64.mul_add(margin, rect.width()),
                2.0f64.mul_add(margin, rect.height()),
            ),
        })
    }

    /// Flip y within the bounding box so larger y is drawn higher.
    fn map(&self, p: Point) -> (f64, f64) {
        (p.x, self.max_y + self.min_y - p.y)
    }
}

/// Build the `d` attribute of the tour path.
///
/// Uses `M` for the first stop and `L` for the rest, in tour order.
/// Ids missing from `points` are skipped. Returns an empty string when
/// fewer than two stops can be drawn.
///
/// # Examples
///
/// ```
/// use mstour_pipeline::{Point, PointSet, Tour};
/// use mstour_export::svg::build_path_data;
///
/// let mut points = PointSet::new();
/// points.push(1, Point::new(10.0, 20.0));
/// points.push(2, Point::new(30.0, 40.0));
/// let d = build_path_data(&points, &Tour::new(vec![1, 2, 1]));
/// assert_eq!(d, "M10,40 L30,20 L10,40");
/// ```
#[must_use]
pub fn build_path_data(points: &PointSet, tour: &Tour) -> String {
    Frame::fit(points).map_or_else(String::new, |frame| path_data(points, tour, &frame))
}

fn path_data(points: &PointSet, tour: &Tour, frame: &Frame) -> String {
    let stops: Vec<(f64, f64)> = tour
        .ids()
        .iter()
        .filter_map(|&id| points.get(id))
        .map(|p| frame.map(p))
        .collect();
    let [first, rest @ ..] = stops.as_slice() else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let mut data = Data::new().move_to(*first);
    for &p in rest {
        data = data.line_to(p);
    }
    String::from(Value::from(data))
}

/// Serialize a tour, its spanning tree, and the points into an SVG
/// document string.
///
/// Layers are drawn bottom to top: tree edges (`<g id="mst">`), the tour
/// (`<path id="tour">`), then points (`<g id="points">`, each circle
/// carrying a `data-id` attribute). An empty point set produces an
/// empty document.
///
/// # Examples
///
/// ```
/// use mstour_export::{SvgMetadata, to_svg};
/// use mstour_pipeline::{PipelineConfig, process};
///
/// let text = "NODE_COORD_SECTION\n1 0 0\n2 0 3\n3 4 3\n4 4 0\nEOF\n";
/// let result = process(text, &PipelineConfig::default()).unwrap();
/// let metadata = SvgMetadata {
///     title: Some("square4"),
///     description: Some("MST tour"),
/// };
/// let svg = to_svg(&result.points, &result.tree, &result.tour, &metadata);
/// assert!(svg.contains("<title>square4</title>"));
/// assert!(svg.contains("<desc>MST tour</desc>"));
/// assert!(svg.contains(r#"d="M0,3 L0,0 L4,3 L4,0 L0,3""#));
/// ```
#[must_use]
pub fn to_svg(
    points: &PointSet,
    tree: &SpanningTree,
    tour: &Tour,
    metadata: &SvgMetadata<'_>,
) -> String {
    let mut doc = Document::new();

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(frame) = Frame::fit(points) {
        let (x, y, w, h) = frame.view_box;
        let stroke = frame.extent * STROKE_FRACTION;
        doc = doc.set("viewBox", (x, y, w, h));

        let mut edges = Group::new()
            .set("id", "mst")
            .set("stroke", TREE_COLOR)
            .set("stroke-width", stroke)
            .set("stroke-dasharray", format!("{} {}", stroke * 4.0, stroke * 2.0));
        for edge in tree.edges() {
            let (Some(a), Some(b)) = (points.get(edge.from), points.get(edge.to)) else {
                continue;
            };
            let (x1, y1) = frame.map(a);
            let (x2, y2) = frame.map(b);
            edges = edges.add(
                Line::new()
                    .set("x1", x1)
                    .set("y1", y1)
                    .set("x2", x2)
                    .set("y2", y2)
                    .set("data-weight", edge.weight),
            );
        }
        doc = doc.add(edges);

        let d = path_data(points, tour, &frame);
        if !d.is_empty() {
            doc = doc.add(
                Path::new()
                    .set("id", "tour")
                    .set("d", d)
                    .set("fill", "none")
                    .set("stroke", TOUR_COLOR)
                    .set("stroke-width", stroke * 1.5),
            );
        }

        let radius = frame.extent * POINT_RADIUS_FRACTION;
        let mut dots = Group::new().set("id", "points").set("fill", POINT_COLOR);
        for (id, p) in points.iter() {
            let (cx, cy) = frame.map(p);
            dots = dots.add(
                Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", radius)
                    .set("data-id", id),
            );
        }
        doc = doc.add(dots);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
