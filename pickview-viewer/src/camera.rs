//! Camera utilities: the projection camera handed to the renderer and the
//! orbit controller that drives it from pointer and wheel input

use crate::config::CameraParams;
use crate::picking::Ray;
use nalgebra::{Matrix4, Perspective3, Point3, Vector3};
use pickview_core::{point_from_array, Point3f};
use std::f32::consts::FRAC_PI_2;

/// Size of the drawing surface in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width over height; 1 while either side is zero, e.g. a minimized window
    pub fn aspect_ratio(&self) -> f32 {
        if self.width > 0.0 && self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// A perspective camera looking at a target
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Perspective3::new(self.aspect_ratio, self.fov, self.near, self.far).into_inner()
    }

    /// Ray from the eye through a pixel (origin top-left, y down).
    ///
    /// Returns `None` when the view-projection cannot be inverted, e.g. for a
    /// zero-sized viewport.
    pub fn ray_through_pixel(&self, x: f32, y: f32, viewport: Viewport) -> Option<Ray> {
        if viewport.width <= 0.0 || viewport.height <= 0.0 {
            return None;
        }

        let ndc_x = 2.0 * x / viewport.width - 1.0;
        let ndc_y = 1.0 - 2.0 * y / viewport.height;

        let inverse = (self.projection_matrix() * self.view_matrix()).try_inverse()?;
        let far = inverse.transform_point(&Point3::new(ndc_x, ndc_y, 1.0));
        let direction = far - self.position;
        if direction.norm() <= f32::EPSILON {
            return None;
        }

        Some(Ray::new(self.position, direction.normalize()))
    }
}

/// Orbit state: angles around the target and the distance from it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub yaw: f32,
    /// Always within `[-π/2, π/2]`
    pub pitch: f32,
    /// Always within the configured distance range
    pub distance: f32,
}

/// Manual orbit controls: drag to rotate, wheel to zoom.
///
/// The eye position is never stored; [`OrbitCameraController::camera`]
/// recomputes it from the pose on every frame.
#[derive(Debug, Clone)]
pub struct OrbitCameraController {
    pose: CameraPose,
    params: CameraParams,
    drag_anchor: Option<(f32, f32)>,
}

impl OrbitCameraController {
    pub fn new(params: CameraParams) -> Self {
        let distance = clamp_distance(params.initial_distance, &params);
        Self {
            pose: CameraPose {
                yaw: 0.0,
                pitch: 0.0,
                distance,
            },
            params,
            drag_anchor: None,
        }
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.drag_anchor = Some((x, y));
    }

    /// Rotate by the distance moved since the last pointer position
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let Some((anchor_x, anchor_y)) = self.drag_anchor else {
            return;
        };

        let sensitivity = self.params.rotate_sensitivity;
        self.pose.yaw += (x - anchor_x) * sensitivity;
        self.pose.pitch = (self.pose.pitch + (y - anchor_y) * sensitivity).clamp(-FRAC_PI_2, FRAC_PI_2);
        self.drag_anchor = Some((x, y));
    }

    pub fn pointer_up(&mut self) {
        self.drag_anchor = None;
    }

    /// Zoom out for positive `delta_y`, in for negative; zero is ignored
    pub fn wheel(&mut self, delta_y: f32) {
        let step = self.params.zoom_step;
        let factor = if delta_y > 0.0 {
            1.0 + step
        } else if delta_y < 0.0 {
            1.0 - step
        } else {
            return;
        };
        self.set_distance(self.pose.distance * factor);
    }

    /// Jump to a distance, clamped to the allowed range
    pub fn set_distance(&mut self, distance: f32) {
        if distance.is_nan() {
            return;
        }
        self.pose.distance = clamp_distance(distance, &self.params);
    }

    pub fn target(&self) -> Point3f {
        point_from_array(self.params.target)
    }

    /// Eye position derived from the current pose
    pub fn eye(&self) -> Point3f {
        let CameraPose {
            yaw,
            pitch,
            distance,
        } = self.pose;
        let target = self.target();

        Point3f::new(
            target.x + distance * yaw.sin() * pitch.cos(),
            target.y + distance * pitch.sin() + self.params.eye_height_offset,
            target.z + distance * yaw.cos() * pitch.cos(),
        )
    }

    /// Camera for this frame
    pub fn camera(&self, viewport: Viewport) -> Camera {
        Camera {
            position: self.eye(),
            target: self.target(),
            up: Vector3::y(),
            fov: self.params.fov_degrees.to_radians(),
            aspect_ratio: viewport.aspect_ratio(),
            near: self.params.near,
            far: self.params.far,
        }
    }
}

// f32::clamp panics on an inverted range
fn clamp_distance(distance: f32, params: &CameraParams) -> f32 {
    distance.max(params.min_distance).min(params.max_distance)
}

impl Default for OrbitCameraController {
    fn default() -> Self {
        Self::new(CameraParams::default())
    }
}
