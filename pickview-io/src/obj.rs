//! OBJ format support

use crate::MeshReader;
use pickview_core::{DecodedGeometry, Point3f};
use tracing::{debug, warn};

pub struct ObjReader;

impl MeshReader for ObjReader {
    fn read_mesh(bytes: &[u8]) -> crate::Result<DecodedGeometry> {
        Ok(decode_mesh(&String::from_utf8_lossy(bytes)))
    }
}

/// Decode Wavefront OBJ text into a triangulated surface.
///
/// Only `v` and `f` records are interpreted; every other line is ignored.
/// Malformed coordinates become `NaN`. Polygons are fan-triangulated around
/// their first vertex. A polygon with an unparsable or out-of-range vertex
/// reference is dropped as a whole.
pub fn decode_mesh(text: &str) -> DecodedGeometry {
    let mut positions = Vec::new();
    let mut polygons: Vec<Vec<Option<usize>>> = Vec::new();

    for line in text.lines() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let mut coord = || parts.next().map_or(f32::NAN, parse_coordinate);
                let (x, y, z) = (coord(), coord(), coord());
                positions.push(Point3f::new(x, y, z));
            }
            Some("f") => {
                let seen = positions.len();
                let polygon: Vec<Option<usize>> =
                    parts.map(|token| resolve_index(token, seen)).collect();
                if polygon.len() >= 3 {
                    polygons.push(polygon);
                }
            }
            _ => {}
        }
    }

    let vertex_count = positions.len();
    let mut faces = Vec::new();
    let mut dropped = 0usize;

    for polygon in &polygons {
        let indices: Option<Vec<usize>> = polygon
            .iter()
            .map(|i| i.filter(|&i| i < vertex_count))
            .collect();

        match indices {
            Some(indices) => {
                for i in 1..indices.len() - 1 {
                    faces.push([indices[0], indices[i], indices[i + 1]]);
                }
            }
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(dropped, "skipped OBJ faces with invalid vertex references");
    }
    debug!(
        vertices = vertex_count,
        triangles = faces.len(),
        "decoded OBJ mesh"
    );

    let mut geometry = DecodedGeometry::mesh(positions, faces);
    geometry.compute_vertex_normals();
    geometry
}

fn parse_coordinate(token: &str) -> f32 {
    token.parse().unwrap_or(f32::NAN)
}

/// Turn a face token (`7`, `7/2`, `7//3`, `-1`) into a 0-based index.
///
/// Positive references are 1-based; negative ones count back from the
/// vertices declared so far. Zero and garbage resolve to `None`.
fn resolve_index(token: &str, seen: usize) -> Option<usize> {
    let reference: i64 = token.split('/').next()?.parse().ok()?;
    if reference > 0 {
        usize::try_from(reference - 1).ok()
    } else if reference < 0 {
        let back = usize::try_from(reference.checked_neg()?).ok()?;
        seen.checked_sub(back)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_triangle() {
        let mesh = decode_mesh("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.faces, Some(vec![[0, 1, 2]]));
        assert_eq!(mesh.positions[1], Point3f::new(1.0, 0.0, 0.0));
        let normals = mesh.normals.unwrap();
        assert!((normals[0].z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_polygons_are_fan_triangulated() {
        let text = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v -1 1 0
f 1 2 3 4 5
f 1 2 3 4
";
        let mesh = decode_mesh(text);
        let faces = mesh.faces.unwrap();

        // (5 - 2) + (4 - 2)
        assert_eq!(faces.len(), 5);
        assert_eq!(&faces[..3], &[[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
        assert_eq!(&faces[3..], &[[0, 1, 2], [0, 2, 3]]);
        assert!(faces.iter().flatten().all(|&i| i < mesh.positions.len()));
    }

    #[test]
    fn test_attribute_suffixes_are_discarded() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/2/1 3//1\n";
        let mesh = decode_mesh(text);
        assert_eq!(mesh.faces, Some(vec![[0, 1, 2]]));
    }

    #[test]
    fn test_unrecognized_lines_are_ignored() {
        let text = "# comment\no thing\ng group\nusemtl red\ns off\n\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = decode_mesh(text);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_malformed_coordinates_become_nan() {
        let mesh = decode_mesh("v 1.5 abc\n");
        let p = mesh.positions[0];
        assert_eq!(p.x, 1.5);
        assert!(p.y.is_nan());
        assert!(p.z.is_nan());
    }

    #[test]
    fn test_negative_indices_are_relative() {
        let mesh = decode_mesh("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n");
        assert_eq!(mesh.faces, Some(vec![[0, 1, 2]]));
    }

    #[test]
    fn test_forward_references_resolve() {
        let mesh = decode_mesh("f 1 2 3\nv 0 0 0\nv 1 0 0\nv 0 1 0\n");
        assert_eq!(mesh.faces, Some(vec![[0, 1, 2]]));
    }

    #[test]
    fn test_invalid_references_drop_the_polygon() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\nf 0 1 2\nf 1 x 3\nf 1 2\nf 3 2 1\n";
        let mesh = decode_mesh(text);
        assert_eq!(mesh.faces, Some(vec![[2, 1, 0]]));
    }

    #[test]
    fn test_crlf_input() {
        let mesh = decode_mesh("v 0 0 0\r\nv 1 0 0\r\nv 0 1 0\r\nf 1 2 3\r\n");
        assert_eq!(mesh.positions[2], Point3f::new(0.0, 1.0, 0.0));
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_reader_trait() {
        let mesh = ObjReader::read_mesh(b"v 0 0 0\nv 0 0 1\nv 0 1 0\nf 1 2 3").unwrap();
        assert!(mesh.is_mesh());
        assert_eq!(mesh.triangle_count(), 1);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        /// Vertex count plus polygons of 1-based references, negative ones
        /// counting back from the end of the vertex list
        fn mesh_lines() -> impl Strategy<Value = (usize, Vec<Vec<i64>>)> {
            (3usize..24).prop_flat_map(|n| {
                let reference = prop_oneof![1..=n as i64, -(n as i64)..=-1];
                (Just(n), prop::collection::vec(prop::collection::vec(reference, 3..8), 0..12))
            })
        }

        proptest! {
            #[test]
            fn prop_faces_in_bounds_and_fan_counted((n, polygons) in mesh_lines()) {
                let mut text = String::new();
                for i in 0..n {
                    text.push_str(&format!("v {i} {} 0.5\n", i * 2));
                }
                for polygon in &polygons {
                    let refs: Vec<String> = polygon.iter().map(i64::to_string).collect();
                    text.push_str(&format!("f {}\n", refs.join(" ")));
                }

                let mesh = decode_mesh(&text);
                let faces = mesh.faces.unwrap_or_default();
                let expected: usize = polygons.iter().map(|p| p.len() - 2).sum();

                prop_assert_eq!(mesh.positions.len(), n);
                prop_assert_eq!(faces.len(), expected);
                prop_assert!(faces.iter().flatten().all(|&i| i < n));
            }
        }
    }
}
