//! translucent-rs: real-time translucent material rendering.
//!
//! A mesh is rasterized once from a fixed light, an adaptive sample hierarchy
//! is placed over the lit surface, and every frame the samples are splatted
//! with a dipole diffusion profile and composited with direct reflection.
//!
//! # Quick Start
//!
//! ```no_run
//! use translucent::{assets, Scene};
//!
//! let scene = Scene {
//!     mesh: assets::load_mesh("bunny.obj").unwrap(),
//!     texture: assets::load_texture(None).unwrap(),
//!     options: translucent::Options::default(),
//! };
//! translucent::run(scene).unwrap();
//! ```

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod app;
pub mod assets;
pub mod cli;
pub mod error;
pub mod headless;

pub use error::{AppError, Result};
pub use headless::{dump_selection_masks, render_to_file, render_to_image, render_with_context};
pub use translucent_core::{
    ArcballController, Material, MaterialPreset, Mesh, Options, RenderContext,
};

use image::RgbaImage;

/// Everything loaded before rendering starts.
pub struct Scene {
    pub mesh: Mesh,
    pub texture: RgbaImage,
    pub options: Options,
}

/// Opens the viewer window and blocks until it is closed.
pub fn run(scene: Scene) -> Result<()> {
    let _ = env_logger::try_init();
    app::run_app(scene)
}
