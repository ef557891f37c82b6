//! Model transforms and the auto-fit normalization

use crate::{bounds::Bounded, error::Error, geometry::DecodedGeometry, point::*, Result};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D transformation applied to a renderable when it is placed in the scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Create a uniform scaling transformation
    pub fn uniform_scaling(scale: f32) -> Self {
        Self {
            matrix: Matrix4::new_scaling(scale),
        }
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Compose this transformation with another (`other` is applied first)
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Check if this is approximately the identity transformation
    pub fn is_identity(&self, epsilon: f32) -> bool {
        (self.matrix - Matrix4::identity()).norm() < epsilon
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

impl From<Matrix4<f32>> for Transform3D {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }
}

/// Parameters of the auto-fit normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitParams {
    /// Edge length the largest model dimension is scaled to
    pub target_size: f32,
    /// Height of the model origin above the ground plane
    pub ground_offset: f32,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            target_size: 2.0,
            ground_offset: 0.5,
        }
    }
}

impl FitParams {
    /// Orbit distance that frames a freshly fitted model
    pub fn framing_distance(&self) -> f32 {
        self.target_size * 3.0
    }
}

/// Uniform scale plus translation placing a model at a canonical footprint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitTransform {
    pub scale: f32,
    pub translation: Vector3f,
}

impl FitTransform {
    /// `translation * scale`, the order the scene applies them in
    pub fn to_transform(&self) -> Transform3D {
        Transform3D::translation(self.translation) * Transform3D::uniform_scaling(self.scale)
    }
}

/// Compute the normalizing transform for decoded geometry.
///
/// The largest bounding-box edge is scaled to `params.target_size`; the
/// scaled box is recentered on the origin in X and Z and lifted to
/// `params.ground_offset` in Y. Empty, zero-extent or non-finite bounds fail
/// with [`Error::DegenerateBounds`] instead of producing an infinite scale.
pub fn fit(geometry: &DecodedGeometry, params: &FitParams) -> Result<FitTransform> {
    let bounds = geometry
        .bounding_box()
        .ok_or(Error::DegenerateBounds { max_dimension: 0.0 })?;

    let max_dimension = bounds.max_dimension();
    if !max_dimension.is_finite() || max_dimension <= 0.0 {
        return Err(Error::DegenerateBounds { max_dimension });
    }

    let scale = params.target_size / max_dimension;
    let center = bounds.center();

    Ok(FitTransform {
        scale,
        translation: Vector3f::new(-center.x * scale, params.ground_offset, -center.z * scale),
    })
}
