//! Configuration options for translucent-rs.

use std::path::Path;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::material::{MaterialPreset, DEFAULT_MATERIAL_SCALE};
use crate::sampling::SamplingParams;

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Initial window width in logical pixels.
    pub window_width: u32,

    /// Initial window height in logical pixels.
    pub window_height: u32,

    /// Light source configuration.
    pub light: LightConfig,

    /// Viewer camera configuration.
    pub camera: CameraConfig,

    /// Sample hierarchy parameters.
    pub sampling: SamplingParams,

    /// Diffusion splat configuration.
    pub splat: SplatConfig,

    /// Initially selected material.
    pub material: MaterialPreset,

    /// Initial coefficient scale.
    pub material_scale: f32,

    /// Whether the reflection term is initially drawn.
    pub reflection_enabled: bool,

    /// Whether the transmission term is initially drawn.
    pub transmission_enabled: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            window_width: 1000,
            window_height: 600,
            light: LightConfig::default(),
            camera: CameraConfig::default(),
            sampling: SamplingParams::default(),
            splat: SplatConfig::default(),
            material: MaterialPreset::Milk,
            material_scale: DEFAULT_MATERIAL_SCALE,
            reflection_enabled: true,
            transmission_enabled: true,
        }
    }
}

impl Options {
    /// Loads options from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parses options from a JSON string. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// The fixed point light and the view used to rasterize the sample map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Light position (fixed for the session).
    pub position: Vec3,
    /// Point the light looks at when rasterizing the sample map.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Uniform model scale used for the light-space rasterization.
    pub model_scale: f32,
    /// Side length of the square sample map.
    pub map_size: u32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(-3.0, 4.0, 5.0),
            target: Vec3::ZERO,
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            model_scale: 7.0,
            map_size: 1024,
        }
    }
}

impl LightConfig {
    /// Model-view-projection matrix of the light-space rasterization.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fov_degrees.to_radians(), 1.0, self.near, self.far);
        let view = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
        let model = Mat4::from_scale(Vec3::splat(self.model_scale));
        proj * view * model
    }
}

/// Viewer camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial uniform model scale.
    pub model_scale: f32,
    /// Eye position.
    pub eye: Vec3,
    /// Look-at target.
    pub target: Vec3,
    /// Up vector (need not be normalized).
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            model_scale: 5.0,
            eye: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::new(0.0, 0.1, 0.0),
            fov_degrees: 45.0,
            near: 1.0,
            far: 1000.0,
        }
    }
}

impl CameraConfig {
    /// Initial model matrix.
    #[must_use]
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(self.model_scale))
    }

    /// Look-at view matrix.
    #[must_use]
    pub fn look_at(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Perspective projection for the given aspect ratio.
    #[must_use]
    pub fn projection(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            aspect_ratio,
            self.near,
            self.far,
        )
    }
}

/// Diffusion splat configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplatConfig {
    /// Object-space disc radius of a sample with radius 1 (the coarsest level).
    pub radius_scale: f32,
    /// Object-space radius of the surface patch a radius-1 sample stands for;
    /// its disc area weights the sample's contribution.
    pub footprint_scale: f32,
}

impl Default for SplatConfig {
    fn default() -> Self {
        Self {
            radius_scale: 0.05,
            footprint_scale: 0.005,
        }
    }
}

impl SplatConfig {
    /// Object-space splat radius for a sample of the given radius.
    #[must_use]
    pub fn splat_radius(&self, sample_radius: f32) -> f32 {
        sample_radius * self.radius_scale
    }

    /// Integration area represented by a sample of the given radius.
    #[must_use]
    pub fn footprint_area(&self, sample_radius: f32) -> f32 {
        let r = sample_radius * self.footprint_scale;
        std::f32::consts::PI * r * r
    }
}
