//! Axis-aligned bounds

use crate::{geometry::DecodedGeometry, point::*};
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point3f,
    pub max: Point3f,
}

impl Aabb {
    /// Grow a box over a set of points.
    ///
    /// `NaN` coordinates are skipped by the min/max fold. Returns `None` for
    /// an empty input.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3f>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut min = first;
        let mut max = first;

        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some(Self { min, max })
    }

    pub fn size(&self) -> Vector3f {
        self.max - self.min
    }

    pub fn center(&self) -> Point3f {
        nalgebra::center(&self.min, &self.max)
    }

    /// Largest edge length
    pub fn max_dimension(&self) -> f32 {
        let size = self.size();
        size.x.max(size.y).max(size.z)
    }
}

/// Anything with an axis-aligned extent
pub trait Bounded {
    /// Get the bounding box, `None` when there is nothing to bound
    fn bounding_box(&self) -> Option<Aabb>;

    /// Get the center point of the bounding box
    fn center(&self) -> Option<Point3f> {
        self.bounding_box().map(|b| b.center())
    }
}

impl Bounded for DecodedGeometry {
    fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }
}

impl Bounded for [Point3f] {
    fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self)
    }
}
