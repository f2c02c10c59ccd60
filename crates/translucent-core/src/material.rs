//! Translucent material presets.
//!
//! A material is described by the optical coefficients consumed by the dipole
//! diffusion model: an absorption coefficient, a reduced scattering coefficient
//! and a relative index of refraction. The coefficients are given per color
//! channel in inverse millimeters and multiplied by a user-controlled scale
//! before they reach the shader, which lets the same preset be used with meshes
//! of arbitrary size.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TranslucentError};

/// Default multiplier applied to the optical coefficients.
pub const DEFAULT_MATERIAL_SCALE: f32 = 50.0;

/// The built-in measured materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MaterialPreset {
    /// Whole milk.
    #[default]
    Milk,
    /// Human skin.
    Skin,
}

impl MaterialPreset {
    /// All presets, in UI order.
    pub const ALL: [MaterialPreset; 2] = [MaterialPreset::Milk, MaterialPreset::Skin];

    /// Returns display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            MaterialPreset::Milk => "Milk",
            MaterialPreset::Skin => "Skin",
        }
    }

    /// Absorption coefficient (per channel, 1/mm).
    #[must_use]
    pub fn sigma_a(self) -> Vec3 {
        match self {
            MaterialPreset::Milk => Vec3::new(0.001_533_3, 0.0046, 0.019_933),
            MaterialPreset::Skin => Vec3::new(0.061, 0.97, 1.45),
        }
    }

    /// Reduced scattering coefficient (per channel, 1/mm).
    #[must_use]
    pub fn sigmap_s(self) -> Vec3 {
        match self {
            MaterialPreset::Milk => Vec3::new(4.5513, 5.8294, 7.136),
            MaterialPreset::Skin => Vec3::new(0.18, 0.07, 0.03),
        }
    }

    /// Relative index of refraction.
    #[must_use]
    pub fn eta(self) -> f32 {
        1.3
    }
}

impl fmt::Display for MaterialPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MaterialPreset {
    type Err = TranslucentError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TranslucentError::UnknownMaterial(s.to_string()))
    }
}

/// Optical parameters of the active translucent material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Absorption coefficient.
    pub sigma_a: Vec3,
    /// Reduced scattering coefficient.
    pub sigmap_s: Vec3,
    /// Relative index of refraction.
    pub eta: f32,
    /// Multiplier for both coefficients.
    pub scale: f32,
}

impl Material {
    /// Creates a material from a preset with the given coefficient scale.
    #[must_use]
    pub fn from_preset(preset: MaterialPreset, scale: f32) -> Self {
        Self {
            sigma_a: preset.sigma_a(),
            sigmap_s: preset.sigmap_s(),
            eta: preset.eta(),
            scale,
        }
    }

    /// Absorption coefficient multiplied by the scale.
    #[must_use]
    pub fn scaled_sigma_a(&self) -> Vec3 {
        self.sigma_a * self.scale
    }

    /// Reduced scattering coefficient multiplied by the scale.
    #[must_use]
    pub fn scaled_sigmap_s(&self) -> Vec3 {
        self.sigmap_s * self.scale
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::from_preset(MaterialPreset::default(), DEFAULT_MATERIAL_SCALE)
    }
}

/// Parses a material scale typed by the user.
///
/// Malformed text parses to `0.0`; this never fails.
#[must_use]
pub fn parse_material_scale(text: &str) -> f32 {
    text.trim().parse::<f64>().map_or(0.0, |v| v as f32)
}
