//! Core data structures for pickview
//!
//! This crate provides the fundamental types shared by the decoders and the
//! viewer: points and colours, decoded geometry, axis-aligned bounds, and the
//! transform that normalizes freshly loaded models to a canonical size.

pub mod point;
pub mod geometry;
pub mod bounds;
pub mod transform;
pub mod error;

pub use point::*;
pub use geometry::*;
pub use bounds::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};
