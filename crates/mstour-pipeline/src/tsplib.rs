//! Coordinate loading from TSPLIB-style text.
//!
//! Only the coordinate section is interpreted strictly: every line
//! between the `NODE_COORD_SECTION` marker and the following `EOF`
//! marker must be `<id> <x> <y>`. Keyword lines before the section
//! (`NAME : xqf131`, `DIMENSION : 131`, ...) are collected into a
//! [`TsplibHeader`]; a `DIMENSION` entry is cross-checked against the
//! number of coordinate lines.

use serde::{Deserialize, Serialize};

use crate::types::{PipelineError, Point, PointId, PointSet};

/// Line that opens the coordinate section.
pub const COORD_SECTION_MARKER: &str = "NODE_COORD_SECTION";

/// Line that closes the coordinate section.
pub const EOF_MARKER: &str = "EOF";

/// Keyword entries found before the coordinate section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TsplibHeader {
    /// `NAME` entry.
    pub name: Option<String>,
    /// `COMMENT` entry. Repeated comments are joined with newlines.
    pub comment: Option<String>,
    /// `TYPE` entry (usually `TSP`).
    pub problem_type: Option<String>,
    /// `DIMENSION` entry.
    pub dimension: Option<usize>,
    /// `EDGE_WEIGHT_TYPE` entry (usually `EUC_2D`).
    pub edge_weight_type: Option<String>,
    /// Any other `KEY : VALUE` lines, in input order.
    pub other: Vec<(String, String)>,
}

/// A parsed input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsplibInstance {
    /// Header keywords.
    pub header: TsplibHeader,
    /// Loaded cities in input order.
    pub points: PointSet,
}

/// Parse a TSPLIB-style document.
///
/// Marker lines are matched after trimming surrounding whitespace, so
/// CRLF line endings and indented markers are accepted.
///
/// # Errors
///
/// Returns [`PipelineError::MissingMarker`] if either marker is absent,
/// [`PipelineError::Parse`] for malformed header or coordinate lines,
/// [`PipelineError::DuplicateId`] for a repeated id,
/// [`PipelineError::NoPoints`] for an empty section, and
/// [`PipelineError::DimensionMismatch`] when `DIMENSION` disagrees with
/// the section.
pub fn parse(text: &str) -> Result<TsplibInstance, PipelineError> {
    let lines: Vec<&str> = text.lines().collect();

    let section = lines
        .iter()
        .position(|l| l.trim() == COORD_SECTION_MARKER)
        .ok_or_else(|| missing(COORD_SECTION_MARKER))?;
    let end = lines[section + 1..]
        .iter()
        .position(|l| l.trim() == EOF_MARKER)
        .map(|offset| section + 1 + offset)
        .ok_or_else(|| missing(EOF_MARKER))?;

    let header = parse_header(&lines[..section])?;

    let mut points = PointSet::new();
    for (idx, line) in lines.iter().enumerate().take(end).skip(section + 1) {
        let line_no = idx + 1;
        let (id, point) = parse_coord_line(line, line_no)?;
        if !points.push(id, point) {
            return Err(PipelineError::DuplicateId { id, line: line_no });
        }
    }

    if points.is_empty() {
        return Err(PipelineError::NoPoints);
    }

    if let Some(declared) = header.dimension
        && declared != points.len()
    {
        return Err(PipelineError::DimensionMismatch {
            declared,
            found: points.len(),
        });
    }

    log::debug!(
        "loaded {} points{}",
        points.len(),
        header
            .name
            .as_deref()
            .map_or_else(String::new, |n| format!(" from instance {n}")),
    );

    Ok(TsplibInstance { header, points })
}

/// Parse only the coordinate section, discarding the header.
///
/// # Errors
///
/// Same as [`parse`].
pub fn parse_points(text: &str) -> Result<PointSet, PipelineError> {
    parse(text).map(|instance| instance.points)
}

fn missing(marker: &str) -> PipelineError {
    PipelineError::MissingMarker {
        marker: marker.to_string(),
    }
}

fn parse_header(lines: &[&str]) -> Result<TsplibHeader, PipelineError> {
    let mut header = TsplibHeader::default();

    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .map_or((line, ""), |(k, v)| (k.trim(), v.trim()));

        match key {
            "NAME" => header.name = Some(value.to_string()),
            "COMMENT" => {
                header.comment = Some(match header.comment.take() {
                    Some(prev) => format!("{prev}\n{value}"),
                    None => value.to_string(),
                });
            }
            "TYPE" => header.problem_type = Some(value.to_string()),
            "DIMENSION" => {
                let dimension = value.parse().map_err(|_| PipelineError::Parse {
                    line: idx + 1,
                    reason: format!("invalid DIMENSION `{value}`"),
                })?;
                header.dimension = Some(dimension);
            }
            "EDGE_WEIGHT_TYPE" => header.edge_weight_type = Some(value.to_string()),
            _ => header.other.push((key.to_string(), value.to_string())),
        }
    }

    Ok(header)
}

fn parse_coord_line(line: &str, line_no: usize) -> Result<(PointId, Point), PipelineError> {
    let parse_err = |reason: String| PipelineError::Parse {
        line: line_no,
        reason,
    };

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [id_tok, x_tok, y_tok] = tokens[..] else {
        return Err(parse_err(format!(
            "expected 3 tokens (id x y), found {}",
            tokens.len()
        )));
    };

    let id: PointId = id_tok
        .parse()
        .map_err(|_| parse_err(format!("invalid point id `{id_tok}`")))?;
    if id == 0 {
        return Err(parse_err("point id must be positive".to_string()));
    }

    let coord = |tok: &str, axis: &str| -> Result<f64, PipelineError> {
        tok.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| parse_err(format!("invalid {axis} coordinate `{tok}`")))
    };

    Ok((id, Point::new(coord(x_tok, "x")?, coord(y_tok, "y")?)))
}
