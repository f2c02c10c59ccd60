//! Shading state shared by the render passes.

use crate::error::Result;
use crate::material::{parse_material_scale, Material, MaterialPreset};
use crate::options::Options;

/// Material and toggle state read by the render passes every frame.
///
/// The UI collaborator mutates this through the setters below; the passes
/// receive it by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    preset: MaterialPreset,
    material: Material,
    reflection_enabled: bool,
    transmission_enabled: bool,
}

impl RenderContext {
    /// Creates a context with the given preset and coefficient scale.
    #[must_use]
    pub fn new(preset: MaterialPreset, scale: f32) -> Self {
        Self {
            preset,
            material: Material::from_preset(preset, scale),
            reflection_enabled: true,
            transmission_enabled: true,
        }
    }

    /// Creates a context from configuration options.
    #[must_use]
    pub fn from_options(options: &Options) -> Self {
        let mut ctx = Self::new(options.material, options.material_scale);
        ctx.reflection_enabled = options.reflection_enabled;
        ctx.transmission_enabled = options.transmission_enabled;
        ctx
    }

    /// Returns the active material.
    #[must_use]
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Returns the active preset.
    #[must_use]
    pub fn preset(&self) -> MaterialPreset {
        self.preset
    }

    /// Selects a material preset by name ("Milk" or "Skin").
    ///
    /// Unknown names leave the current material untouched.
    pub fn select_material(&mut self, name: &str) -> Result<()> {
        let preset = match name.parse::<MaterialPreset>() {
            Ok(preset) => preset,
            Err(e) => {
                log::warn!("ignoring material selection: {e}");
                return Err(e);
            }
        };
        self.select_preset(preset);
        Ok(())
    }

    /// Selects a material preset, keeping the current scale.
    pub fn select_preset(&mut self, preset: MaterialPreset) {
        self.preset = preset;
        self.material = Material::from_preset(preset, self.material.scale);
        log::info!("material set to {preset}");
    }

    /// Sets the coefficient scale.
    pub fn set_material_scale(&mut self, scale: f32) {
        self.material.scale = scale;
        log::info!("material scale set to {scale}");
    }

    /// Sets the coefficient scale from user text. Malformed text yields 0.
    pub fn set_material_scale_text(&mut self, text: &str) {
        self.set_material_scale(parse_material_scale(text));
    }

    /// Enables or disables the reflection term.
    pub fn set_reflection_enabled(&mut self, enabled: bool) {
        self.reflection_enabled = enabled;
    }

    /// Enables or disables the transmission term.
    pub fn set_transmission_enabled(&mut self, enabled: bool) {
        self.transmission_enabled = enabled;
    }

    /// Returns whether the reflection term is drawn.
    #[must_use]
    pub fn reflection_enabled(&self) -> bool {
        self.reflection_enabled
    }

    /// Returns whether the transmission term is drawn.
    #[must_use]
    pub fn transmission_enabled(&self) -> bool {
        self.transmission_enabled
    }

    /// Weight of the reflection term in the composite (0 or 1).
    #[must_use]
    pub fn reflection_factor(&self) -> f32 {
        if self.reflection_enabled {
            1.0
        } else {
            0.0
        }
    }

    /// Weight of the transmission term in the composite (0 or 1).
    #[must_use]
    pub fn transmission_factor(&self) -> f32 {
        if self.transmission_enabled {
            1.0
        } else {
            0.0
        }
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::from_options(&Options::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::DEFAULT_MATERIAL_SCALE;

    #[test]
    fn test_material_switch_round_trip() {
        let mut ctx = RenderContext::default();
        let milk = *ctx.material();

        ctx.select_material("Skin").unwrap();
        assert_eq!(ctx.preset(), MaterialPreset::Skin);
        assert_eq!(ctx.material().sigma_a, MaterialPreset::Skin.sigma_a());
        assert_eq!(ctx.material().sigmap_s, MaterialPreset::Skin.sigmap_s());
        assert_eq!(ctx.material().eta, MaterialPreset::Skin.eta());

        ctx.select_material("Milk").unwrap();
        assert_eq!(*ctx.material(), milk);
    }

    #[test]
    fn test_unknown_material_keeps_state() {
        let mut ctx = RenderContext::default();
        ctx.select_material("Skin").unwrap();
        assert!(ctx.select_material("Jade").is_err());
        assert_eq!(ctx.preset(), MaterialPreset::Skin);
    }

    #[test]
    fn test_scale_survives_preset_switch() {
        let mut ctx = RenderContext::default();
        assert_eq!(ctx.material().scale, DEFAULT_MATERIAL_SCALE);
        ctx.set_material_scale(12.0);
        ctx.select_preset(MaterialPreset::Skin);
        assert_eq!(ctx.material().scale, 12.0);
    }

    #[test]
    fn test_malformed_scale_text() {
        let mut ctx = RenderContext::default();
        ctx.set_material_scale_text("not a number");
        assert_eq!(ctx.material().scale, 0.0);
        ctx.set_material_scale_text("25");
        assert_eq!(ctx.material().scale, 25.0);
    }

    #[test]
    fn test_toggles_are_independent() {
        let mut ctx = RenderContext::default();
        assert_eq!(ctx.reflection_factor(), 1.0);
        assert_eq!(ctx.transmission_factor(), 1.0);

        ctx.set_reflection_enabled(false);
        assert_eq!(ctx.reflection_factor(), 0.0);
        assert_eq!(ctx.transmission_factor(), 1.0);

        ctx.set_transmission_enabled(false);
        assert_eq!(ctx.reflection_factor(), 0.0);
        assert_eq!(ctx.transmission_factor(), 0.0);

        ctx.set_reflection_enabled(true);
        assert_eq!(ctx.reflection_factor(), 1.0);
        assert_eq!(ctx.transmission_factor(), 0.0);
    }
}
