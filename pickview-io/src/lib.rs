//! Geometry decoding for pickview
//!
//! This crate turns raw file buffers into [`DecodedGeometry`]: Wavefront OBJ
//! text becomes a triangulated surface and ASCII PLY becomes a point cloud.
//! Decoding is lenient: malformed numbers turn into `NaN` and malformed
//! headers into empty geometry, so only a wrong file type is reported as an
//! error.

pub mod ply;
pub mod obj;
pub mod error;

pub use error::*;
pub use obj::decode_mesh;
pub use ply::decode_point_cloud;

use pickview_core::DecodedGeometry;
use std::path::Path;

/// Result type alias for decoding
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Trait for decoding triangulated surfaces from a buffer
pub trait MeshReader {
    fn read_mesh(bytes: &[u8]) -> Result<DecodedGeometry>;
}

/// Trait for decoding point clouds from a buffer
pub trait PointCloudReader {
    fn read_point_cloud(bytes: &[u8]) -> Result<DecodedGeometry>;
}

/// Which decoder produced a piece of geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Mesh,
    PointCloud,
}

impl GeometryKind {
    /// Noun used when reporting the element count to the user
    pub fn element_noun(self) -> &'static str {
        match self {
            GeometryKind::Mesh => "vertices",
            GeometryKind::PointCloud => "points",
        }
    }
}

/// Decoded geometry tagged with the decoder that produced it
#[derive(Debug, Clone)]
pub struct LoadedGeometry {
    pub kind: GeometryKind,
    pub geometry: DecodedGeometry,
}

/// Lowercased extension of a file name, empty when there is none
pub fn file_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_lowercase()
}

/// Dispatch a file buffer to the decoder matching its extension.
///
/// `obj` goes to the mesh decoder and `ply` to the point-cloud decoder; every
/// other extension is rejected with [`DecodeError::UnsupportedFormat`].
pub fn decode_file(file_name: &str, bytes: &[u8]) -> Result<LoadedGeometry> {
    match file_extension(file_name).as_str() {
        "obj" => Ok(LoadedGeometry {
            kind: GeometryKind::Mesh,
            geometry: obj::ObjReader::read_mesh(bytes)?,
        }),
        "ply" => Ok(LoadedGeometry {
            kind: GeometryKind::PointCloud,
            geometry: ply::PlyReader::read_point_cloud(bytes)?,
        }),
        other => Err(DecodeError::UnsupportedFormat {
            extension: other.to_uppercase(),
        }),
    }
}

/// Read a file from disk and decode it
pub fn read_geometry<P: AsRef<Path>>(path: P) -> Result<LoadedGeometry> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    decode_file(name, &bytes)
}
