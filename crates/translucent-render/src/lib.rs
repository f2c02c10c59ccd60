//! Rendering backend for translucent-rs.
//!
//! This crate provides the wgpu passes of the subsurface pipeline:
//! - [`GeometryBufferPass`] rasterizing attribute buffers from the light or the camera
//! - [`DiffusionPass`] splatting dipole diffusion from every sample
//! - [`CompositePass`] combining reflection and transmission
//! - [`RenderLoop`] owning the resources and sequencing the passes

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// GPU sizes and pixel counts move between u32, usize and f32
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]

pub mod buffer;
pub mod composite_pass;
pub mod diffusion_pass;
pub mod engine;
pub mod error;
pub mod gbuffer_pass;
pub mod readback;
pub mod render_loop;
pub mod screenshot;
pub mod texture;

pub use buffer::{GpuSample, MeshBuffers, SampleBuffers};
pub use composite_pass::{CompositePass, CompositeUniforms};
pub use diffusion_pass::{DiffusionPass, SplatUniforms};
pub use engine::{RenderEngine, HEADLESS_FORMAT};
pub use error::{RenderError, RenderResult};
pub use gbuffer_pass::{
    read_geometry_images, GBufferFormats, GBufferTargets, GBufferUniforms, GeometryBufferPass,
};
pub use render_loop::RenderLoop;
pub use screenshot::{save_image, ScreenshotError};
pub use texture::{white_image, DiffuseTexture, RenderTarget};
