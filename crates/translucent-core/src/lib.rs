//! Core types for translucent-rs.
//!
//! This crate holds everything that does not need a GPU:
//! - [`ArcballController`] for pointer driven model/view transforms
//! - [`SamplePyramid`] and [`generate_samples`] for hierarchical sample placement
//! - [`Material`] presets and the [`RenderContext`] control surface
//! - [`Options`] loaded from JSON

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Options structs legitimately have several boolean flags
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
// Pixel coordinates and counts move between usize, u32 and f32
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::similar_names)]

pub mod arcball;
pub mod attribute_image;
pub mod context;
pub mod dipole;
pub mod error;
pub mod material;
pub mod mesh;
pub mod options;
pub mod sampling;

pub use arcball::{ArcballController, ArcballMode, PointerButton, PointerEvent};
pub use attribute_image::AttributeImage;
pub use context::RenderContext;
pub use error::{Result, TranslucentError};
pub use material::{parse_material_scale, Material, MaterialPreset, DEFAULT_MATERIAL_SCALE};
pub use mesh::{Mesh, Vertex};
pub use options::{CameraConfig, LightConfig, Options, SplatConfig};
pub use sampling::{
    generate_samples, radius_for_level, GeometryImages, PyramidLevel, Sample, SamplePyramid,
    SampleSet, SamplingParams,
};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
