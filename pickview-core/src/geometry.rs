//! Decoded geometry: the in-memory form of a loaded file before it becomes a
//! scene renderable

use crate::point::*;
use serde::{Deserialize, Serialize};

/// Positions, optional triangles and optional per-vertex colours extracted
/// from a file buffer.
///
/// `faces == None` marks a point cloud, `Some` a triangulated surface. Every
/// face index is in `[0, positions.len())`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodedGeometry {
    pub positions: Vec<Point3f>,
    pub faces: Option<Vec<[usize; 3]>>,
    pub colors: Option<Vec<Color>>,
    pub normals: Option<Vec<Vector3f>>,
}

impl DecodedGeometry {
    /// Create a point cloud from positions
    pub fn point_cloud(positions: Vec<Point3f>) -> Self {
        Self {
            positions,
            faces: None,
            colors: None,
            normals: None,
        }
    }

    /// Create a triangulated surface from positions and faces
    pub fn mesh(positions: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            positions,
            faces: Some(faces),
            colors: None,
            normals: None,
        }
    }

    /// Get the number of positions
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of triangles (zero for point clouds)
    pub fn triangle_count(&self) -> usize {
        self.faces.as_ref().map_or(0, Vec::len)
    }

    pub fn is_mesh(&self) -> bool {
        self.faces.is_some()
    }

    /// Zero-length geometry is the decoders' soft-failure signal
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Set per-vertex colours; ignored unless there is one per position
    pub fn set_colors(&mut self, colors: Vec<Color>) {
        if colors.len() == self.positions.len() {
            self.colors = Some(colors);
        }
    }

    /// Compute smooth per-vertex normals from the triangles.
    ///
    /// Unnormalized face normals (twice the triangle area in magnitude) are
    /// summed onto each corner, so larger faces weigh more. Vertices without
    /// a usable normal get `+Z`. Point clouds are left untouched.
    pub fn compute_vertex_normals(&mut self) {
        let Some(faces) = &self.faces else {
            return;
        };

        let mut normals = vec![Vector3f::zeros(); self.positions.len()];
        for face in faces {
            let v0 = self.positions[face[0]];
            let v1 = self.positions[face[1]];
            let v2 = self.positions[face[2]];
            let face_normal = (v1 - v0).cross(&(v2 - v0));
            if !face_normal.iter().all(|c| c.is_finite()) {
                continue;
            }
            for &i in face {
                normals[i] += face_normal;
            }
        }

        for normal in &mut normals {
            let length = normal.norm();
            *normal = if length > 1e-12 {
                *normal / length
            } else {
                Vector3f::new(0.0, 0.0, 1.0)
            };
        }

        self.normals = Some(normals);
    }

    /// Iterate over the triangles as position triples
    pub fn triangles(&self) -> impl Iterator<Item = [Point3f; 3]> + '_ {
        self.faces.iter().flatten().map(move |face| {
            [
                self.positions[face[0]],
                self.positions[face[1]],
                self.positions[face[2]],
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_triangle() -> DecodedGeometry {
        DecodedGeometry::mesh(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.5, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn test_counts() {
        let mesh = create_test_triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.is_mesh());

        let cloud = DecodedGeometry::point_cloud(vec![Point3f::origin()]);
        assert_eq!(cloud.triangle_count(), 0);
        assert!(!cloud.is_mesh());
        assert!(DecodedGeometry::default().is_empty());
    }

    #[test]
    fn test_normal_computation() {
        let mut mesh = create_test_triangle();
        mesh.compute_vertex_normals();

        let normals = mesh.normals.unwrap();
        assert_eq!(normals.len(), 3);
        for normal in &normals {
            assert_relative_eq!(normal.z, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_normals_are_area_weighted() {
        // Shared vertex 0: a large triangle in the XY plane and a tiny one
        // in the XZ plane. The shared normal leans towards +Z.
        let mut mesh = DecodedGeometry::mesh(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(10.0, 0.0, 0.0),
                Point3f::new(0.0, 10.0, 0.0),
                Point3f::new(0.0, 0.0, -0.1),
            ],
            vec![[0, 1, 2], [0, 3, 1]],
        );
        mesh.compute_vertex_normals();

        let n = mesh.normals.unwrap()[0];
        assert!(n.z > 0.99);
        assert!(n.y < 0.0);
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unreferenced_vertex_gets_default_normal() {
        let mut mesh = create_test_triangle();
        mesh.positions.push(Point3f::new(5.0, 5.0, 5.0));
        mesh.compute_vertex_normals();
        assert_eq!(mesh.normals.unwrap()[3], Vector3f::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_set_colors_requires_matching_length() {
        let mut mesh = create_test_triangle();
        mesh.set_colors(vec![Color::WHITE]);
        assert!(mesh.colors.is_none());
        mesh.set_colors(vec![Color::WHITE; 3]);
        assert_eq!(mesh.colors.as_ref().map(Vec::len), Some(3));
    }
}
