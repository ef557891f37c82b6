//! Ray casting against visible scene entries

use crate::registry::{ObjectId, SceneRegistry};
use crate::scene::{Primitive, Renderable, Scene};
use pickview_core::{Point3f, Vector3f};

const DET_EPSILON: f32 = 1e-10;
const T_EPSILON: f32 = 1e-6;

/// A ray in world space with a unit direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3f,
    pub direction: Vector3f,
}

impl Ray {
    pub fn new(origin: Point3f, direction: Vector3f) -> Self {
        Self { origin, direction }
    }

    /// Get a point along the ray at parameter t
    pub fn point_at(&self, t: f32) -> Point3f {
        self.origin + self.direction * t
    }
}

/// Nearest intersection of a ray with a registry entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub object: ObjectId,
    pub point: Point3f,
    /// Distance along the ray
    pub distance: f32,
}

/// Two-sided Möller–Trumbore ray/triangle test, returning the ray parameter.
///
/// Comparisons are written so that `NaN` vertices never produce a hit.
pub fn intersect_triangle(ray: &Ray, a: &Point3f, b: &Point3f, c: &Point3f) -> Option<f32> {
    let e1 = b - a;
    let e2 = c - a;
    let p = ray.direction.cross(&e2);
    let det = e1.dot(&p);
    if !(det.abs() > DET_EPSILON) {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&e1);
    let v = ray.direction.dot(&q) * inv_det;
    if !(v >= 0.0 && u + v <= 1.0) {
        return None;
    }

    let t = e2.dot(&q) * inv_det;
    (t > T_EPSILON).then_some(t)
}

/// Ray parameter of the closest approach to `point`, if it lies in front of
/// the origin and within `threshold` of the ray
pub fn intersect_point(ray: &Ray, point: &Point3f, threshold: f32) -> Option<f32> {
    let t = (point - ray.origin).dot(&ray.direction);
    if !(t > 0.0) {
        return None;
    }
    let closest = ray.point_at(t);
    ((point - closest).norm() <= threshold).then_some(t)
}

/// Intersect one renderable in world space.
///
/// Returns the ray parameter and the recorded world point: the surface point
/// for meshes, the cloud point itself for point clouds. Lines and markers are
/// not pickable.
pub fn intersect_renderable(
    renderable: &Renderable,
    ray: &Ray,
    point_threshold: f32,
) -> Option<(f32, Point3f)> {
    let transform = &renderable.transform;
    match &renderable.primitive {
        Primitive::Mesh(geometry) => geometry
            .triangles()
            .filter_map(|[a, b, c]| {
                let a = transform.transform_point(&a);
                let b = transform.transform_point(&b);
                let c = transform.transform_point(&c);
                intersect_triangle(ray, &a, &b, &c)
            })
            .min_by(f32::total_cmp)
            .map(|t| (t, ray.point_at(t))),
        Primitive::Points { geometry, .. } => geometry
            .positions
            .iter()
            .filter_map(|p| {
                let world = transform.transform_point(p);
                intersect_point(ray, &world, point_threshold).map(|t| (t, world))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0)),
        Primitive::LineStrip(_) | Primitive::Marker { .. } => None,
    }
}

/// Cast a ray against every visible registry entry and return the nearest hit
pub fn raycast(
    scene: &Scene,
    registry: &SceneRegistry,
    ray: &Ray,
    point_threshold: f32,
) -> Option<Hit> {
    registry
        .entries()
        .iter()
        .filter(|entry| entry.visible)
        .filter_map(|entry| {
            let node = scene.node(&entry.node)?;
            if !node.visible {
                return None;
            }
            intersect_renderable(&node.renderable, ray, point_threshold).map(|(distance, point)| Hit {
                object: entry.id,
                point,
                distance,
            })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}
