//! Rendering without a window.
//!
//! Useful for integration tests and for producing stills from the command line.

use std::path::Path;

use pollster::FutureExt;

use translucent_core::{ArcballController, RenderContext};
use translucent_render::{save_image, RenderEngine, RenderLoop};

use crate::error::Result;
use crate::Scene;

/// Renders one frame of `scene` at the initial camera pose.
///
/// Returns `width * height * 4` bytes of RGBA, rows top to bottom.
pub fn render_to_image(scene: &Scene, width: u32, height: u32) -> Result<Vec<u8>> {
    let context = RenderContext::from_options(&scene.options);
    render_with_context(scene, &context, width, height)
}

/// Like [`render_to_image`], with an explicit material and toggle state.
pub fn render_with_context(
    scene: &Scene,
    context: &RenderContext,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let engine = RenderEngine::new_headless(width, height).block_on()?;
    let render_loop = RenderLoop::initialize(&engine, &scene.mesh, &scene.texture, &scene.options)?;
    let arcball = ArcballController::new(&scene.options.camera, width, height);
    Ok(render_loop.render_to_image(
        &engine,
        context,
        arcball.model_matrix(),
        arcball.view_matrix(),
    )?)
}

/// Renders one frame and saves it as PNG or JPEG.
pub fn render_to_file(
    scene: &Scene,
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
) -> Result<()> {
    let pixels = render_to_image(scene, width, height)?;
    save_image(path, &pixels, width, height)?;
    Ok(())
}

/// Places the samples for `scene` and writes one selection mask per pyramid
/// level as `level_<n>.png` into `dir`.
pub fn dump_selection_masks(scene: &Scene, dir: impl AsRef<Path>) -> Result<usize> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let engine = RenderEngine::new_headless(1, 1).block_on()?;
    let render_loop = RenderLoop::initialize(&engine, &scene.mesh, &scene.texture, &scene.options)?;
    let pyramid = render_loop.pyramid();
    for level in 0..pyramid.level_count() {
        if let Some(mask) = pyramid.selection_mask_image(level) {
            let path = dir.join(format!("level_{level}.png"));
            mask.save(&path)?;
            log::info!("wrote {}", path.display());
        }
    }
    Ok(pyramid.level_count())
}
