//! CPU reference of the dipole diffusion profile.
//!
//! The GPU splatting shader evaluates the same expressions. The boundary term
//! depends only on `eta`, so the renderer computes it here once per frame and
//! passes it as a uniform; the remaining functions are the testable copy of
//! the per-fragment profile.

use glam::Vec3;

use crate::material::Material;

/// Diffuse Fresnel reflectance `Fdr` for relative index of refraction `eta`.
#[must_use]
pub fn fresnel_diffuse_reflectance(eta: f32) -> f32 {
    -1.440 / (eta * eta) + 0.710 / eta + 0.668 + 0.0636 * eta
}

/// Boundary condition term `A = (1 + Fdr) / (1 - Fdr)`.
#[must_use]
pub fn boundary_term(eta: f32) -> f32 {
    let fdr = fresnel_diffuse_reflectance(eta);
    (1.0 + fdr) / (1.0 - fdr)
}

/// Diffuse reflectance `Rd(r)` of a single color channel at distance `r`.
#[must_use]
pub fn diffuse_reflectance(r: f32, sigma_a: f32, sigmap_s: f32, eta: f32) -> f32 {
    let sigmap_t = sigma_a + sigmap_s;
    let alpha_prime = sigmap_s / sigmap_t;
    let sigma_tr = (3.0 * sigma_a * sigmap_t).sqrt();

    let z_r = 1.0 / sigmap_t;
    let z_v = z_r * (1.0 + 4.0 / 3.0 * boundary_term(eta));

    let r2 = r * r;
    let d_r = (r2 + z_r * z_r).sqrt();
    let d_v = (r2 + z_v * z_v).sqrt();

    let real = z_r * (sigma_tr * d_r + 1.0) * (-sigma_tr * d_r).exp() / (d_r * d_r * d_r);
    let virt = z_v * (sigma_tr * d_v + 1.0) * (-sigma_tr * d_v).exp() / (d_v * d_v * d_v);

    alpha_prime / (4.0 * std::f32::consts::PI) * (real + virt)
}

/// Per-channel `Rd(r)` using the scaled coefficients of `material`.
#[must_use]
pub fn diffuse_reflectance_rgb(r: f32, material: &Material) -> Vec3 {
    let sigma_a = material.scaled_sigma_a();
    let sigmap_s = material.scaled_sigmap_s();
    Vec3::new(
        diffuse_reflectance(r, sigma_a.x, sigmap_s.x, material.eta),
        diffuse_reflectance(r, sigma_a.y, sigmap_s.y, material.eta),
        diffuse_reflectance(r, sigma_a.z, sigmap_s.z, material.eta),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialPreset;
    use proptest::prelude::*;

    #[test]
    fn test_fresnel_for_water_like_media() {
        let fdr = fresnel_diffuse_reflectance(1.3);
        assert!(fdr > 0.4 && fdr < 0.5, "Fdr = {fdr}");
        assert!(boundary_term(1.3) > 1.0);
    }

    #[test]
    fn test_reflectance_is_positive_and_finite() {
        let material = Material::from_preset(MaterialPreset::Skin, 50.0);
        for r in [0.0, 0.01, 0.1] {
            let rd = diffuse_reflectance_rgb(r, &material);
            assert!(rd.is_finite());
            assert!(rd.min_element() > 0.0, "Rd({r}) = {rd}");
        }

        // Far from the sample the strongly absorbed channels underflow to zero.
        let far = diffuse_reflectance_rgb(1.0, &material);
        assert!(far.is_finite());
        assert!(far.min_element() >= 0.0);
        assert!(far.x > 0.0);
    }

    #[test]
    fn test_milk_scatters_red_farther_than_blue() {
        let material = Material::from_preset(MaterialPreset::Milk, 50.0);
        let near = diffuse_reflectance_rgb(0.0, &material);
        let far = diffuse_reflectance_rgb(0.5, &material);
        assert!(far.x / near.x > far.z / near.z);
    }

    proptest! {
        #[test]
        fn prop_reflectance_falls_off(
            r in 0.0f32..2.0,
            dr in 0.01f32..1.0,
            sigma_a in 0.01f32..10.0,
            sigmap_s in 0.01f32..10.0,
        ) {
            let near = diffuse_reflectance(r, sigma_a, sigmap_s, 1.3);
            let far = diffuse_reflectance(r + dr, sigma_a, sigmap_s, 1.3);
            prop_assert!(far <= near);
        }
    }
}
