//! Point, vector and colour types

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A linear RGB colour with channels normalized to `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a colour from a packed `0xRRGGBB` value
    pub fn from_hex(hex: u32) -> Self {
        Self::from_bytes(
            ((hex >> 16) & 0xff) as f32,
            ((hex >> 8) & 0xff) as f32,
            (hex & 0xff) as f32,
        )
    }

    /// Normalize byte-range channels (0-255) to `[0, 1]`.
    ///
    /// Out-of-range values are clamped; `NaN` channels stay `NaN`.
    pub fn from_bytes(r: f32, g: f32, b: f32) -> Self {
        let norm = |c: f32| (c / 255.0).clamp(0.0, 1.0);
        Self::new(norm(r), norm(g), norm(b))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 3]> for Color {
    fn from(c: [f32; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

/// Convert a `[x, y, z]` triple into a point
pub fn point_from_array(p: [f32; 3]) -> Point3f {
    Point3f::new(p[0], p[1], p[2])
}

/// Convert a point into a `[x, y, z]` triple
pub fn point_to_array(p: &Point3f) -> [f32; 3] {
    [p.x, p.y, p.z]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colour() {
        let c = Color::from_hex(0xff0000);
        assert_eq!(c, Color::new(1.0, 0.0, 0.0));

        let c = Color::from_hex(0x0077ff);
        assert!((c.g - 119.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 1.0);
    }

    #[test]
    fn test_byte_channels_are_clamped() {
        let c = Color::from_bytes(300.0, -5.0, 127.5);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 0.5).abs() < 1e-6);
        assert!(Color::from_bytes(f32::NAN, 0.0, 0.0).r.is_nan());
    }
}
