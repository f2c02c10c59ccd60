//! Resource ownership and per-frame pass sequencing.
//!
//! Construction runs the one-time work (light G-buffer, readback, sample
//! placement); every later frame only runs the view G-buffer, the splat and
//! the composite.

use glam::{Mat4, Vec3};
use image::RgbaImage;

use translucent_core::{
    generate_samples, CameraConfig, Mesh, Options, RenderContext, SamplePyramid,
};

use crate::buffer::{MeshBuffers, SampleBuffers};
use crate::composite_pass::CompositePass;
use crate::diffusion_pass::DiffusionPass;
use crate::engine::RenderEngine;
use crate::error::RenderResult;
use crate::gbuffer_pass::{read_geometry_images, GBufferTargets, GeometryBufferPass};
use crate::readback::read_texture;
use crate::texture::{DiffuseTexture, RenderTarget};

/// Everything the renderer owns between frames.
pub struct RenderLoop {
    gbuffer_pass: GeometryBufferPass,
    view_targets: GBufferTargets,
    diffusion_pass: DiffusionPass,
    composite_pass: CompositePass,
    mesh: MeshBuffers,
    samples: SampleBuffers,
    texture: DiffuseTexture,
    pyramid: SamplePyramid,
    camera: CameraConfig,
    light_position: Vec3,
    width: u32,
    height: u32,
}

impl RenderLoop {
    /// Creates all GPU resources, renders the light-view G-buffer and places
    /// the diffusion samples.
    pub fn initialize(
        engine: &RenderEngine,
        mesh: &Mesh,
        texture: &RgbaImage,
        options: &Options,
    ) -> RenderResult<Self> {
        let (width, height) = engine.dimensions();
        let device = &engine.device;

        let gbuffer_pass = GeometryBufferPass::new(engine)?;
        let diffusion_pass = DiffusionPass::new(engine, width, height)?;
        let composite_pass = CompositePass::new(engine, width, height)?;
        let mesh_buffers = MeshBuffers::new(device, mesh);
        let texture = DiffuseTexture::new(device, &engine.queue, texture);

        let (pyramid, samples) =
            Self::place_samples(engine, &gbuffer_pass, &mesh_buffers, options)?;

        let view_targets =
            gbuffer_pass.create_targets(device, "view G-buffer", width, height, false);

        let mut render_loop = Self {
            gbuffer_pass,
            view_targets,
            diffusion_pass,
            composite_pass,
            mesh: mesh_buffers,
            samples,
            texture,
            pyramid,
            camera: options.camera.clone(),
            light_position: options.light.position,
            width,
            height,
        };
        render_loop.bind(device);
        Ok(render_loop)
    }

    fn place_samples(
        engine: &RenderEngine,
        gbuffer_pass: &GeometryBufferPass,
        mesh: &MeshBuffers,
        options: &Options,
    ) -> RenderResult<(SamplePyramid, SampleBuffers)> {
        let size = options.light.map_size;
        let targets =
            gbuffer_pass.create_targets(&engine.device, "light G-buffer", size, size, true);
        gbuffer_pass.render(engine, &targets, mesh, options.light.view_projection());
        let images = read_geometry_images(engine, &targets)?;
        log::info!("light G-buffer complete ({size}x{size})");

        let (pyramid, set) =
            generate_samples(images, &options.sampling, options.light.position)?;
        let samples = SampleBuffers::new(&engine.device, &set, &options.splat);
        Ok((pyramid, samples))
    }

    fn bind(&mut self, device: &wgpu::Device) {
        self.diffusion_pass
            .bind(device, &self.samples, &self.view_targets.position.view);
        self.composite_pass
            .bind(device, &self.texture, self.diffusion_pass.accumulation_view());
    }

    /// Recreates the viewport-sized targets. The sample set is kept.
    pub fn resize(&mut self, engine: &RenderEngine, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return;
        }
        let device = &engine.device;
        self.width = width;
        self.height = height;
        self.view_targets = self
            .gbuffer_pass
            .create_targets(device, "view G-buffer", width, height, false);
        self.diffusion_pass.resize(device, width, height);
        self.composite_pass.resize(device, width, height);
        self.bind(device);
        log::debug!("render targets resized to {width}x{height}");
    }

    /// Projection for the current viewport.
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.camera
            .projection(self.width as f32 / self.height.max(1) as f32)
    }

    /// Renders one frame into `output`.
    pub fn render_frame(
        &self,
        engine: &RenderEngine,
        output: &wgpu::TextureView,
        context: &RenderContext,
        model: Mat4,
        view: Mat4,
    ) {
        let model_view = view * model;
        let projection = self.projection();
        let mvp = projection * model_view;

        let mut encoder = engine
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        self.gbuffer_pass
            .encode(&engine.queue, &mut encoder, &self.view_targets, &self.mesh, mvp);

        self.diffusion_pass.update_uniforms(
            &engine.queue,
            context.material(),
            model_view,
            projection,
            self.light_position,
        );
        self.diffusion_pass.encode(&mut encoder, &self.samples);

        self.composite_pass
            .update_uniforms(&engine.queue, mvp, self.light_position, context);
        self.composite_pass.encode(&mut encoder, output, &self.mesh);

        engine.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Renders one frame off-screen and returns tightly packed RGBA8 pixels.
    pub fn render_to_image(
        &self,
        engine: &RenderEngine,
        context: &RenderContext,
        model: Mat4,
        view: Mat4,
    ) -> RenderResult<Vec<u8>> {
        let target = RenderTarget::new(
            &engine.device,
            "offscreen frame",
            self.width,
            self.height,
            engine.output_format(),
            wgpu::TextureUsages::COPY_SRC,
        );
        self.render_frame(engine, &target.view, context, model, view);
        let mut pixels = read_texture(&engine.device, &engine.queue, &target.texture)?;
        if matches!(
            target.format,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        ) {
            for chunk in pixels.chunks_exact_mut(4) {
                chunk.swap(0, 2);
            }
        }
        Ok(pixels)
    }

    /// Number of diffusion samples being splatted.
    #[must_use]
    pub fn sample_count(&self) -> u32 {
        self.samples.sample_count
    }

    /// The pyramid the samples were selected from.
    #[must_use]
    pub fn pyramid(&self) -> &SamplePyramid {
        &self.pyramid
    }

    /// Current viewport size.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
