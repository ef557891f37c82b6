//! PLY format support (ASCII variant)

use crate::{DecodeError, PointCloudReader};
use pickview_core::{Color, DecodedGeometry, Point3f};
use tracing::{debug, warn};

pub struct PlyReader;

impl PointCloudReader for PlyReader {
    fn read_point_cloud(bytes: &[u8]) -> crate::Result<DecodedGeometry> {
        decode_point_cloud(bytes)
    }
}

/// What the header scan found
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlyHeader {
    /// Declared `element vertex` count, zero when absent or unparsable
    pub vertex_count: usize,
    /// Index of the first line after `end_header`
    pub data_start: Option<usize>,
}

/// Scan header lines for the vertex count and the end-of-header marker.
///
/// Fails only for a binary `format` declaration, which must never be
/// misparsed as text.
pub fn parse_header(lines: &[&str]) -> crate::Result<PlyHeader> {
    let mut header = PlyHeader::default();

    for (i, line) in lines.iter().enumerate() {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some("format"), Some(format), _) if format != "ascii" => {
                return Err(DecodeError::UnsupportedPlyFormat {
                    format: format.to_string(),
                });
            }
            (Some("element"), Some("vertex"), count) => {
                header.vertex_count = count.and_then(|c| c.parse().ok()).unwrap_or(0);
            }
            (Some("end_header"), _, _) => {
                header.data_start = Some(i + 1);
                break;
            }
            _ => {}
        }
    }

    Ok(header)
}

/// Decode an ASCII PLY buffer into a point cloud.
///
/// Exactly the declared number of records is read after `end_header`, or
/// fewer if the input runs out. Each record with at least three fields gives
/// a position; fields four to six, when present, are 0-255 colour channels.
/// Colours are kept only if every decoded record carried them.
///
/// A header without a vertex count or without `end_header` yields empty
/// geometry; callers treat that as a soft failure.
pub fn decode_point_cloud(bytes: &[u8]) -> crate::Result<DecodedGeometry> {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text.lines().collect();

    let header = parse_header(&lines)?;
    let Some(start) = header.data_start else {
        warn!("PLY header has no end_header marker");
        return Ok(DecodedGeometry::default());
    };

    let mut positions = Vec::with_capacity(header.vertex_count.min(lines.len()));
    let mut colors = Vec::new();

    for line in lines.iter().skip(start).take(header.vertex_count) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            continue;
        }

        positions.push(Point3f::new(
            parse_field(fields[0]),
            parse_field(fields[1]),
            parse_field(fields[2]),
        ));
        if fields.len() >= 6 {
            colors.push(Color::from_bytes(
                parse_field(fields[3]),
                parse_field(fields[4]),
                parse_field(fields[5]),
            ));
        }
    }

    let mut geometry = DecodedGeometry::point_cloud(positions);
    if !colors.is_empty() {
        if colors.len() == geometry.vertex_count() {
            geometry.set_colors(colors);
        } else {
            warn!(
                colored = colors.len(),
                points = geometry.vertex_count(),
                "dropping PLY colours, not every record has them"
            );
        }
    }

    debug!(
        declared = header.vertex_count,
        points = geometry.vertex_count(),
        colored = geometry.colors.is_some(),
        "decoded PLY point cloud"
    );

    Ok(geometry)
}

fn parse_field(token: &str) -> f32 {
    token.parse().unwrap_or(f32::NAN)
}
