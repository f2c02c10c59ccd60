//! Hierarchical adaptive placement of diffusion samples.
//!
//! The light-space geometry buffers are reduced into a small image pyramid
//! (level 0 is the coarsest). Every pyramid pixel is tested against a
//! footprint metric that grows as the surface turns away from the light; the
//! acceptance budget doubles at each finer level, so grazing geometry is
//! sampled finely and light-facing geometry coarsely. A top-down pass then
//! removes any pixel already covered by a coarser selection, which partitions
//! the lit surface into non-overlapping sample footprints.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::attribute_image::AttributeImage;
use crate::error::{Result, TranslucentError};

/// Parameters of the sample selection criterion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    /// Number of pyramid levels, including the full-resolution one.
    pub levels: usize,
    /// Footprint metric gain (alpha).
    pub alpha: f32,
    /// World-space footprint radius (Rw).
    pub world_radius: f32,
    /// Pixel-space footprint radius (RPx).
    pub pixel_radius: f32,
    /// Maximum accepted scaled depth gap (z0).
    pub max_depth_gap: f32,
    /// Acceptance budget at the coarsest level.
    pub base_threshold: f32,
    /// Multiplier applied to `max_depth - min_depth`.
    pub depth_gap_scale: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            levels: 3,
            alpha: 30.0,
            world_radius: 1.0,
            pixel_radius: 0.1,
            max_depth_gap: 0.03,
            base_threshold: 256.0,
            depth_gap_scale: 10.0,
        }
    }
}

impl SamplingParams {
    /// Acceptance budget `T` at `level`; doubles with each finer level.
    #[must_use]
    pub fn threshold_for_level(&self, level: usize) -> f32 {
        (0..level).fold(self.base_threshold, |t, _| t * 2.0)
    }

    /// Footprint metric `Mx = alpha * Rw / (RPx * |N . L|)`.
    ///
    /// Infinite when the normal is perpendicular to the light direction.
    #[must_use]
    pub fn footprint_metric(&self, normal: Vec3, light_dir: Vec3) -> f32 {
        self.alpha * self.world_radius / (self.pixel_radius * normal.dot(light_dir).abs())
    }

    /// Whether a pyramid pixel qualifies as a sample at `level`.
    #[must_use]
    pub fn accepts(
        &self,
        level: usize,
        min_depth: f32,
        max_depth: f32,
        position: Vec3,
        normal: Vec3,
        light_position: Vec3,
    ) -> bool {
        let depth_gap = (max_depth - min_depth) * self.depth_gap_scale;
        let light_dir = (light_position - position).normalize_or_zero();
        let metric = self.footprint_metric(normal, light_dir);
        depth_gap < self.max_depth_gap && self.threshold_for_level(level) > metric
    }
}

/// Footprint radius of a sample taken at `level`: `0.5^level`.
#[must_use]
pub fn radius_for_level(level: usize) -> f32 {
    (0..level).fold(1.0, |r, _| r * 0.5)
}

/// The five full-resolution attribute images rendered from the light.
#[derive(Debug, Clone)]
pub struct GeometryImages {
    /// Surface position.
    pub position: AttributeImage<Vec3>,
    /// Surface normal.
    pub normal: AttributeImage<Vec3>,
    /// Texture coordinate.
    pub texcoord: AttributeImage<Vec2>,
    /// Depth of the nearest surface.
    pub min_depth: AttributeImage<f32>,
    /// Depth of the farthest surface.
    pub max_depth: AttributeImage<f32>,
}

impl GeometryImages {
    /// Returns the shared dimensions, or an error if the images disagree.
    pub fn dimensions(&self) -> Result<(usize, usize)> {
        let dims = self.position.dimensions();
        for other in [
            self.normal.dimensions(),
            self.texcoord.dimensions(),
            self.min_depth.dimensions(),
            self.max_depth.dimensions(),
        ] {
            if other != dims {
                return Err(TranslucentError::SizeMismatch {
                    expected: dims.0 * dims.1,
                    actual: other.0 * other.1,
                });
            }
        }
        Ok(dims)
    }
}

/// One level of the sample pyramid.
#[derive(Debug, Clone)]
pub struct PyramidLevel {
    /// Mean position.
    pub position: AttributeImage<Vec3>,
    /// Mean (unnormalized) normal.
    pub normal: AttributeImage<Vec3>,
    /// Mean texture coordinate.
    pub texcoord: AttributeImage<Vec2>,
    /// Block minimum of the near depth.
    pub min_depth: AttributeImage<f32>,
    /// Block maximum of the far depth.
    pub max_depth: AttributeImage<f32>,
    /// Pixels chosen as samples.
    pub selected: AttributeImage<bool>,
}

impl PyramidLevel {
    fn from_images(images: GeometryImages) -> Self {
        let (width, height) = images.position.dimensions();
        Self {
            position: images.position,
            normal: images.normal,
            texcoord: images.texcoord,
            min_depth: images.min_depth,
            max_depth: images.max_depth,
            selected: AttributeImage::new(width, height, false),
        }
    }

    fn downsample(&self) -> Self {
        let position = self.position.downsample(|a, b, c, d| (a + b + c + d) / 4.0);
        let (width, height) = position.dimensions();
        Self {
            position,
            normal: self.normal.downsample(|a, b, c, d| (a + b + c + d) / 4.0),
            texcoord: self.texcoord.downsample(|a, b, c, d| (a + b + c + d) / 4.0),
            min_depth: self.min_depth.downsample(|a, b, c, d| a.min(b).min(c.min(d))),
            max_depth: self.max_depth.downsample(|a, b, c, d| a.max(b).max(c.max(d))),
            selected: AttributeImage::new(width, height, false),
        }
    }

    /// Width and height of this level.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        self.position.dimensions()
    }

    /// Number of selected pixels.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.data().iter().filter(|&&s| s).count()
    }
}

/// A diffusion evaluation point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Surface position.
    pub position: Vec3,
    /// Surface normal (mean of the covered pixels, not renormalized).
    pub normal: Vec3,
    /// Texture coordinate.
    pub texcoord: Vec2,
    /// Footprint radius, `0.5^level`.
    pub radius: f32,
    /// Pyramid level the sample was taken from.
    pub level: usize,
}

/// The flat sample list and its identity draw order.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    /// Samples ordered by level, then row-major within a level.
    pub samples: Vec<Sample>,
    /// `0..samples.len()`.
    pub indices: Vec<u32>,
}

impl SampleSet {
    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample was selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Multi-resolution attribute pyramid with per-level sample selection.
#[derive(Debug, Clone)]
pub struct SamplePyramid {
    levels: Vec<PyramidLevel>,
}

impl SamplePyramid {
    /// Builds `level_count` levels by repeated 2x2 reduction of `images`.
    ///
    /// The input becomes the finest (last) level.
    pub fn build(images: GeometryImages, level_count: usize) -> Result<Self> {
        images.dimensions()?;
        let level_count = level_count.max(1);

        let mut levels = Vec::with_capacity(level_count);
        levels.push(PyramidLevel::from_images(images));
        for _ in 1..level_count {
            let coarser = levels[levels.len() - 1].downsample();
            levels.push(coarser);
        }
        levels.reverse();

        for (l, level) in levels.iter().enumerate() {
            let (w, h) = level.dimensions();
            log::debug!("sample pyramid level {l}: {w}x{h}");
        }

        Ok(Self { levels })
    }

    /// Marks every pixel that passes the depth-gap and footprint tests.
    pub fn select(&mut self, params: &SamplingParams, light_position: Vec3) {
        for (l, level) in self.levels.iter_mut().enumerate() {
            let (width, height) = level.dimensions();
            level.selected = AttributeImage::from_fn(width, height, |x, y| {
                params.accepts(
                    l,
                    level.min_depth.get(x, y),
                    level.max_depth.get(x, y),
                    level.position.get(x, y),
                    level.normal.get(x, y),
                    light_position,
                )
            });
        }
    }

    /// Deselects every pixel whose footprint is already covered by a
    /// selection at a coarser level.
    pub fn enforce_exclusivity(&mut self) {
        let mut parent_covered: Option<AttributeImage<bool>> = None;
        for level in &mut self.levels {
            let (width, height) = level.dimensions();
            let covered = AttributeImage::from_fn(width, height, |x, y| {
                parent_covered
                    .as_ref()
                    .and_then(|parent| parent.get_checked(x / 2, y / 2))
                    .unwrap_or(false)
            });
            level.selected = AttributeImage::from_fn(width, height, |x, y| {
                level.selected.get(x, y) && !covered.get(x, y)
            });
            parent_covered = Some(AttributeImage::from_fn(width, height, |x, y| {
                covered.get(x, y) || level.selected.get(x, y)
            }));
        }
    }

    /// Collects one sample per selected pixel, coarsest level first.
    #[must_use]
    pub fn samples(&self) -> SampleSet {
        let samples: Vec<Sample> = self
            .levels
            .iter()
            .enumerate()
            .flat_map(|(l, level)| {
                let radius = radius_for_level(l);
                level
                    .selected
                    .pixels()
                    .filter(|&(_, _, selected)| selected)
                    .map(move |(x, y, _)| Sample {
                        position: level.position.get(x, y),
                        normal: level.normal.get(x, y),
                        texcoord: level.texcoord.get(x, y),
                        radius,
                        level: l,
                    })
            })
            .collect();
        let indices = (0..samples.len() as u32).collect();
        SampleSet { samples, indices }
    }

    /// All levels, coarsest first.
    #[must_use]
    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }

    /// The level at `index` (0 = coarsest).
    #[must_use]
    pub fn level(&self, index: usize) -> Option<&PyramidLevel> {
        self.levels.get(index)
    }

    /// Number of levels.
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// The selection mask of a level as an 8-bit image (255 = selected).
    #[must_use]
    pub fn selection_mask_image(&self, level: usize) -> Option<image::GrayImage> {
        let level = self.levels.get(level)?;
        let (width, height) = level.dimensions();
        Some(image::GrayImage::from_fn(
            width as u32,
            height as u32,
            |x, y| image::Luma([if level.selected.get(x as usize, y as usize) { 255 } else { 0 }]),
        ))
    }
}

/// Runs the full selection: pyramid construction, per-level acceptance,
/// exclusivity, and sample materialization.
pub fn generate_samples(
    images: GeometryImages,
    params: &SamplingParams,
    light_position: Vec3,
) -> Result<(SamplePyramid, SampleSet)> {
    let mut pyramid = SamplePyramid::build(images, params.levels)?;
    pyramid.select(params, light_position);
    pyramid.enforce_exclusivity();
    let set = pyramid.samples();

    for (l, level) in pyramid.levels().iter().enumerate() {
        log::info!(
            "level {l}: {} samples (radius {})",
            level.selected_count(),
            radius_for_level(l)
        );
    }
    if set.is_empty() {
        log::warn!("no diffusion samples were selected");
    } else {
        log::info!("generated {} diffusion samples", set.len());
    }

    Ok((pyramid, set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// A flat square in the z = 0 plane whose normals point at the light.
    fn flat_quad(size: usize, light: Vec3) -> GeometryImages {
        let position = AttributeImage::from_fn(size, size, |x, y| {
            Vec3::new(
                x as f32 / size as f32 - 0.5,
                y as f32 / size as f32 - 0.5,
                0.0,
            )
        });
        let normal = AttributeImage::from_fn(size, size, |x, y| {
            (light - position.get(x, y)).normalize()
        });
        GeometryImages {
            texcoord: AttributeImage::from_fn(size, size, |x, y| {
                Vec2::new(x as f32 / size as f32, y as f32 / size as f32)
            }),
            position,
            normal,
            min_depth: AttributeImage::new(size, size, 0.5),
            max_depth: AttributeImage::new(size, size, 0.5),
        }
    }

    #[test]
    fn test_threshold_doubles() {
        let params = SamplingParams::default();
        assert_eq!(params.threshold_for_level(0), 256.0);
        for l in 0..6 {
            assert_eq!(
                params.threshold_for_level(l + 1),
                2.0 * params.threshold_for_level(l)
            );
        }
    }

    #[test]
    fn test_radius_for_level() {
        assert_eq!(radius_for_level(0), 1.0);
        assert_eq!(radius_for_level(1), 0.5);
        assert_eq!(radius_for_level(2), 0.25);
    }

    #[test]
    fn test_footprint_metric_facing_light() {
        let params = SamplingParams::default();
        let metric = params.footprint_metric(Vec3::Z, Vec3::Z);
        assert!((metric - 300.0).abs() < 1e-3);
        assert!(params.footprint_metric(Vec3::X, Vec3::Z).is_infinite());
    }

    #[test]
    fn test_pyramid_shapes() {
        let pyramid = SamplePyramid::build(flat_quad(20, Vec3::Z * 10.0), 3).unwrap();
        assert_eq!(pyramid.level_count(), 3);
        assert_eq!(pyramid.level(0).unwrap().dimensions(), (5, 5));
        assert_eq!(pyramid.level(1).unwrap().dimensions(), (10, 10));
        assert_eq!(pyramid.level(2).unwrap().dimensions(), (20, 20));
    }

    #[test]
    fn test_mismatched_images_rejected() {
        let mut images = flat_quad(8, Vec3::Z);
        images.max_depth = AttributeImage::new(4, 4, 0.0);
        assert!(SamplePyramid::build(images, 3).is_err());
    }

    #[test]
    fn test_flat_quad_suppresses_finest_level() {
        let light = Vec3::new(0.0, 0.0, 1.0e6);
        let (pyramid, set) =
            generate_samples(flat_quad(16, light), &SamplingParams::default(), light).unwrap();

        // Mx = 300 everywhere: rejected at T = 256, accepted at T = 512.
        assert_eq!(pyramid.level(0).unwrap().selected_count(), 0);
        assert_eq!(pyramid.level(1).unwrap().selected_count(), 64);
        assert_eq!(pyramid.level(2).unwrap().selected_count(), 0);
        assert_eq!(set.len(), 64);
        assert!(set.samples.iter().all(|s| s.radius == 0.5));
    }

    #[test]
    fn test_flat_quad_coarsest_takes_all() {
        let light = Vec3::new(0.0, 0.0, 1.0e6);
        let params = SamplingParams {
            base_threshold: 512.0,
            ..SamplingParams::default()
        };
        let (pyramid, set) = generate_samples(flat_quad(16, light), &params, light).unwrap();

        assert_eq!(pyramid.level(0).unwrap().selected_count(), 16);
        assert_eq!(pyramid.level(1).unwrap().selected_count(), 0);
        assert_eq!(pyramid.level(2).unwrap().selected_count(), 0);
        assert_eq!(set.len(), 16);
    }

    #[test]
    fn test_background_is_never_selected() {
        let light = Vec3::new(0.0, 0.0, 10.0);
        let mut images = flat_quad(8, light);
        images.normal = AttributeImage::new(8, 8, Vec3::ZERO);
        images.position = AttributeImage::new(8, 8, Vec3::ZERO);
        let (_, set) = generate_samples(images, &SamplingParams::default(), light).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_thick_regions_are_rejected() {
        let light = Vec3::new(0.0, 0.0, 1.0e6);
        let mut images = flat_quad(8, light);
        // Gap of 0.01 scales to 0.1 > z0.
        images.max_depth = AttributeImage::new(8, 8, 0.51);
        let (_, set) = generate_samples(images, &SamplingParams::default(), light).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_grazing_pixels_refine() {
        let light = Vec3::new(0.0, 0.0, 1.0e6);
        let mut images = flat_quad(16, light);
        // Tilt the left half so that |N.L| = 0.4: Mx = 750, accepted only at T = 1024.
        let tilted = Vec3::new(0.0, (1.0f32 - 0.16).sqrt(), 0.4);
        images.normal =
            AttributeImage::from_fn(16, 16, |x, _| if x < 8 { tilted } else { Vec3::Z });
        let (pyramid, set) = generate_samples(images, &SamplingParams::default(), light).unwrap();

        assert_eq!(pyramid.level(0).unwrap().selected_count(), 0);
        assert_eq!(pyramid.level(1).unwrap().selected_count(), 32);
        assert_eq!(pyramid.level(2).unwrap().selected_count(), 128);
        assert_eq!(set.len(), 160);
        assert!(set.samples[..32].iter().all(|s| s.level == 1));
        assert!(set.samples[32..].iter().all(|s| s.level == 2 && s.radius == 0.25));
    }

    #[test]
    fn test_sample_attributes_and_indices() {
        let light = Vec3::new(0.0, 0.0, 1.0e6);
        let (pyramid, set) =
            generate_samples(flat_quad(8, light), &SamplingParams::default(), light).unwrap();
        assert_eq!(set.indices, (0..set.len() as u32).collect::<Vec<_>>());

        let level = pyramid.level(1).unwrap();
        let first = set.samples[0];
        assert_eq!(first.position, level.position.get(0, 0));
        assert_eq!(first.normal, level.normal.get(0, 0));
        assert_eq!(first.texcoord, level.texcoord.get(0, 0));
    }

    #[test]
    fn test_odd_dimensions_do_not_panic() {
        let light = Vec3::new(0.0, 0.0, 1.0e6);
        let (pyramid, _) =
            generate_samples(flat_quad(9, light), &SamplingParams::default(), light).unwrap();
        assert_eq!(pyramid.level(0).unwrap().dimensions(), (2, 2));
        assert_eq!(pyramid.level(2).unwrap().dimensions(), (9, 9));
    }

    #[test]
    fn test_selection_mask_image() {
        let light = Vec3::new(0.0, 0.0, 1.0e6);
        let (pyramid, _) =
            generate_samples(flat_quad(8, light), &SamplingParams::default(), light).unwrap();
        let mask = pyramid.selection_mask_image(1).unwrap();
        assert_eq!(mask.dimensions(), (4, 4));
        assert!(mask.pixels().all(|p| p.0[0] == 255));
        assert!(pyramid.selection_mask_image(3).is_none());
    }

    fn random_images(size: usize, values: &[f32]) -> GeometryImages {
        let at = |i: usize| values[i % values.len()];
        GeometryImages {
            position: AttributeImage::from_fn(size, size, |x, y| {
                Vec3::new(x as f32 * 0.01, y as f32 * 0.01, at(x + y * size))
            }),
            normal: AttributeImage::from_fn(size, size, |x, y| {
                let i = 3 * (x + y * size);
                Vec3::new(at(i), at(i + 1), at(i + 2).abs() + 0.05).normalize()
            }),
            texcoord: AttributeImage::new(size, size, Vec2::ZERO),
            min_depth: AttributeImage::from_fn(size, size, |x, y| at(x * 7 + y).abs() * 0.001),
            max_depth: AttributeImage::from_fn(size, size, |x, y| {
                at(x * 7 + y).abs() * 0.001 + at(x + y * 5).abs() * 0.004
            }),
        }
    }

    proptest! {
        #[test]
        fn prop_selection_is_exclusive(
            size in 4usize..24,
            values in proptest::collection::vec(-1.0f32..1.0, 64),
        ) {
            let light = Vec3::new(0.0, 0.0, 5.0);
            let (pyramid, set) =
                generate_samples(random_images(size, &values), &SamplingParams::default(), light)
                    .unwrap();
            let levels = pyramid.levels();
            for l in 1..levels.len() {
                for (x, y, selected) in levels[l].selected.pixels() {
                    if !selected {
                        continue;
                    }
                    // No ancestor at any coarser level may be selected.
                    let (mut px, mut py) = (x, y);
                    for coarser in (0..l).rev() {
                        px /= 2;
                        py /= 2;
                        let parent = levels[coarser].selected.get_checked(px, py);
                        prop_assert_ne!(parent, Some(true));
                    }
                }
            }

            let total: usize = levels.iter().map(PyramidLevel::selected_count).sum();
            prop_assert_eq!(total, set.len());
        }

        #[test]
        fn prop_radius_matches_level(
            size in 4usize..24,
            values in proptest::collection::vec(-1.0f32..1.0, 64),
        ) {
            let light = Vec3::new(0.0, 0.0, 5.0);
            let (_, set) =
                generate_samples(random_images(size, &values), &SamplingParams::default(), light)
                    .unwrap();
            for pair in set.samples.windows(2) {
                prop_assert!(pair[0].level <= pair[1].level);
                if pair[0].level < pair[1].level {
                    prop_assert!(pair[0].radius > pair[1].radius);
                }
            }
            for sample in &set.samples {
                prop_assert_eq!(sample.radius, 0.5f32.powi(sample.level as i32));
            }
        }
    }
}
