//! Viewer configuration
//!
//! Every section has a `Default` matching the stock viewer, and missing keys
//! in a JSON file fall back to those defaults.

use crate::remote::SplineMethod;
use pickview_core::{Error, FitParams, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Orbit camera parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    /// Radians of yaw/pitch per dragged pixel
    pub rotate_sensitivity: f32,
    /// Fractional distance change per wheel notch
    pub zoom_step: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub initial_distance: f32,
    /// Fixed look-at target
    pub target: [f32; 3],
    /// Added to the eye height after the spherical conversion
    pub eye_height_offset: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            rotate_sensitivity: 0.005,
            zoom_step: 0.1,
            min_distance: 1.0,
            max_distance: 50.0,
            initial_distance: 5.0,
            target: [0.0, 0.5, 0.0],
            eye_height_offset: 2.0,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraParams {
    /// Reject ranges the orbit controller and the projection cannot work with
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.min_distance,
            self.max_distance,
            self.fov_degrees,
            self.near,
            self.far,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(Error::Config("camera parameters must be finite".to_string()));
        }
        if self.min_distance <= 0.0 || self.min_distance > self.max_distance {
            return Err(Error::Config(format!(
                "camera distance range [{}, {}] is empty or not positive",
                self.min_distance, self.max_distance
            )));
        }
        if self.near <= 0.0 || self.far <= self.near {
            return Err(Error::Config(format!(
                "camera clip range near {} / far {} is invalid",
                self.near, self.far
            )));
        }
        if self.fov_degrees <= 0.0 || self.fov_degrees >= 180.0 {
            return Err(Error::Config(format!(
                "camera field of view {} must be between 0 and 180 degrees",
                self.fov_degrees
            )));
        }
        Ok(())
    }
}

/// Point-selection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionParams {
    pub min_plane_points: usize,
    pub min_spline_points: usize,
    /// World-space distance from the pick ray within which a cloud point counts as hit
    pub point_pick_threshold: f32,
    pub marker_radius: f32,
    /// Edge length of the square patch drawn for a segmented plane
    pub patch_size: f32,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            min_plane_points: 100,
            min_spline_points: 2,
            point_pick_threshold: 0.05,
            marker_radius: 0.02,
            patch_size: 2.0,
        }
    }
}

/// Remote processing service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub plane_threshold: f32,
    pub plane_max_iterations: u32,
    pub spline_degree: u32,
    pub spline_samples: u32,
    pub spline_method: SplineMethod,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
            plane_threshold: 0.05,
            plane_max_iterations: 1000,
            spline_degree: 3,
            spline_samples: 100,
            spline_method: SplineMethod::Bspline,
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub camera: CameraParams,
    pub fit: FitParams,
    pub selection: SelectionParams,
    pub service: ServiceConfig,
}

impl ViewerConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.camera.validate()
    }

    /// Load a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}
