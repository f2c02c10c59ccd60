//! Geometry buffer rasterization.
//!
//! The same program fills two kinds of target sets: the fixed-size light
//! view G-buffer read back once for sample placement, and the viewport-sized
//! camera view G-buffer re-rendered every frame for the diffusion lookup.

use glam::{Mat4, Vec2, Vec3};

use translucent_core::{AttributeImage, GeometryImages};

use crate::buffer::{create_uniform_buffer, vertex_layout, write_uniform, MeshBuffers};
use crate::engine::RenderEngine;
use crate::error::{RenderError, RenderResult};
use crate::readback::{decode_float_texels, read_texture};
use crate::texture::RenderTarget;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
pub const POSITION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const TEXCOORD_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Float;

/// Half-precision stand-ins for adapters that cannot render to 32-bit floats.
pub const DEPTH_FORMAT_HALF: wgpu::TextureFormat = wgpu::TextureFormat::R16Float;
pub const POSITION_FORMAT_HALF: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Attachment formats of a G-buffer, in shader location order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GBufferFormats {
    pub depth: wgpu::TextureFormat,
    pub position: wgpu::TextureFormat,
    pub normal: wgpu::TextureFormat,
    pub texcoord: wgpu::TextureFormat,
}

impl GBufferFormats {
    /// Picks full-precision depth and position when `renderable` accepts
    /// them, half precision otherwise. Returns `None` when even the half
    /// formats are rejected.
    pub fn select(renderable: impl Fn(wgpu::TextureFormat) -> bool) -> Option<Self> {
        let pick = |full: wgpu::TextureFormat, half: wgpu::TextureFormat| {
            if renderable(full) {
                Some(full)
            } else if renderable(half) {
                log::warn!("{full:?} is not renderable, falling back to {half:?}");
                Some(half)
            } else {
                None
            }
        };
        let formats = Self {
            depth: pick(DEPTH_FORMAT, DEPTH_FORMAT_HALF)?,
            position: pick(POSITION_FORMAT, POSITION_FORMAT_HALF)?,
            normal: NORMAL_FORMAT,
            texcoord: TEXCOORD_FORMAT,
        };
        [formats.normal, formats.texcoord]
            .into_iter()
            .all(&renderable)
            .then_some(formats)
    }

    /// Queries the adapter for render-attachment support.
    pub fn for_adapter(adapter: &wgpu::Adapter) -> RenderResult<Self> {
        Self::select(|format| {
            adapter
                .get_texture_format_features(format)
                .allowed_usages
                .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
        })
        .ok_or_else(|| {
            RenderError::PipelineCreationFailed(
                "adapter cannot render to any float G-buffer format".to_string(),
            )
        })
    }
}

/// GPU representation of the G-buffer uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct GBufferUniforms {
    pub mvp: [[f32; 4]; 4],
    /// 0 = nearest surface, 1 = farthest surface.
    pub is_max_depth: u32,
    pub _padding: [u32; 3],
}

impl GBufferUniforms {
    #[must_use]
    pub fn new(mvp: Mat4, is_max_depth: bool) -> Self {
        Self {
            mvp: mvp.to_cols_array_2d(),
            is_max_depth: u32::from(is_max_depth),
            _padding: [0; 3],
        }
    }
}

/// One set of G-buffer attachments with its own uniforms.
pub struct GBufferTargets {
    pub min_depth: RenderTarget,
    pub position: RenderTarget,
    pub normal: RenderTarget,
    pub texcoord: RenderTarget,
    /// Present only for target sets that record the farthest surface.
    pub max_depth: Option<RenderTarget>,
    pub depth: RenderTarget,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GBufferTargets {
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.position.size()
    }
}

/// Pipelines for the nearest-surface and farthest-surface rasterizations.
pub struct GeometryBufferPass {
    formats: GBufferFormats,
    min_pipeline: wgpu::RenderPipeline,
    max_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl GeometryBufferPass {
    pub fn new(engine: &RenderEngine) -> RenderResult<Self> {
        let formats = GBufferFormats::for_adapter(&engine.adapter)?;
        let shader =
            engine.create_shader_module("G-Buffer Shader", include_str!("shaders/gbuffer.wgsl"))?;

        let bind_group_layout =
            engine
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("G-Buffer Bind Group Layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

        let pipeline_layout =
            engine
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("G-Buffer Pipeline Layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    push_constant_ranges: &[],
                });

        let target = |format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
        };
        let min_targets = [
            target(formats.depth),
            target(formats.position),
            target(formats.normal),
            target(formats.texcoord),
        ];
        let max_targets = [target(formats.depth), None, None, None];

        let create = |label: &str, targets: &[Option<wgpu::ColorTargetState>]| {
            engine.validated(label, |device| {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(label),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_main"),
                        buffers: &[vertex_layout()],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_main"),
                        targets,
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        cull_mode: None,
                        ..Default::default()
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: wgpu::TextureFormat::Depth32Float,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::Less,
                        stencil: wgpu::StencilState::default(),
                        bias: wgpu::DepthBiasState::default(),
                    }),
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                    cache: None,
                })
            })
        };

        let min_pipeline = create("G-Buffer Pipeline", &min_targets)?;
        let max_pipeline = create("G-Buffer Max Depth Pipeline", &max_targets)?;

        Ok(Self {
            formats,
            min_pipeline,
            max_pipeline,
            bind_group_layout,
        })
    }

    /// Allocates a target set of the given size.
    pub fn create_targets(
        &self,
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        with_max_depth: bool,
    ) -> GBufferTargets {
        let color = |name: &str, format| {
            RenderTarget::new(
                device,
                &format!("{label} {name}"),
                width,
                height,
                format,
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_SRC,
            )
        };

        let uniform_buffer = create_uniform_buffer(
            device,
            &GBufferUniforms::new(Mat4::IDENTITY, false),
            &format!("{label} uniforms"),
        );
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        GBufferTargets {
            min_depth: color("min depth", self.formats.depth),
            position: color("position", self.formats.position),
            normal: color("normal", self.formats.normal),
            texcoord: color("texcoord", self.formats.texcoord),
            max_depth: with_max_depth.then(|| color("max depth", self.formats.depth)),
            depth: RenderTarget::depth(device, &format!("{label} depth"), width, height),
            uniform_buffer,
            bind_group,
        }
    }

    /// Records the nearest-surface pass into `encoder`.
    pub fn encode(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        targets: &GBufferTargets,
        mesh: &MeshBuffers,
        mvp: Mat4,
    ) {
        write_uniform(queue, &targets.uniform_buffer, &GBufferUniforms::new(mvp, false));

        // Depth is cleared to the far plane; all other attributes to zero so
        // that background pixels carry a zero normal and zero coverage.
        let depth_clear = wgpu::Color::WHITE;
        let attachment = |view, clear| {
            Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("G-Buffer Pass"),
            color_attachments: &[
                attachment(&targets.min_depth.view, depth_clear),
                attachment(&targets.position.view, wgpu::Color::TRANSPARENT),
                attachment(&targets.normal.view, wgpu::Color::TRANSPARENT),
                attachment(&targets.texcoord.view, wgpu::Color::TRANSPARENT),
            ],
            depth_stencil_attachment: Some(depth_attachment(&targets.depth.view)),
            ..Default::default()
        });
        render_pass.set_pipeline(&self.min_pipeline);
        render_pass.set_bind_group(0, &targets.bind_group, &[]);
        mesh.draw(&mut render_pass);
    }

    /// Renders both the nearest- and farthest-surface passes and waits for
    /// them. Each pass is its own submission so the depth-mode uniform can
    /// change in between.
    pub fn render(
        &self,
        engine: &RenderEngine,
        targets: &GBufferTargets,
        mesh: &MeshBuffers,
        mvp: Mat4,
    ) {
        let mut encoder = engine
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("G-Buffer Encoder"),
            });
        self.encode(&engine.queue, &mut encoder, targets, mesh, mvp);
        engine.queue.submit(std::iter::once(encoder.finish()));

        let Some(max_depth) = &targets.max_depth else {
            return;
        };

        write_uniform(
            &engine.queue,
            &targets.uniform_buffer,
            &GBufferUniforms::new(mvp, true),
        );
        let mut encoder = engine
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("G-Buffer Max Depth Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("G-Buffer Max Depth Pass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: &max_depth.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    }),
                    None,
                    None,
                    None,
                ],
                depth_stencil_attachment: Some(depth_attachment(&targets.depth.view)),
                ..Default::default()
            });
            render_pass.set_pipeline(&self.max_pipeline);
            render_pass.set_bind_group(0, &targets.bind_group, &[]);
            mesh.draw(&mut render_pass);
        }
        engine.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn depth_attachment(view: &wgpu::TextureView) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(1.0),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    }
}

/// Reads a target set back into the five attribute images.
///
/// Without a farthest-surface target, the maximum depth equals the minimum.
pub fn read_geometry_images(
    engine: &RenderEngine,
    targets: &GBufferTargets,
) -> RenderResult<GeometryImages> {
    let (width, height) = targets.size();
    let (width, height) = (width as usize, height as usize);
    let read = |target: &RenderTarget| -> RenderResult<Vec<f32>> {
        let bytes = read_texture(&engine.device, &engine.queue, &target.texture)?;
        Ok(decode_float_texels(target.format, &bytes))
    };

    let min_depth = read(&targets.min_depth)?;
    let max_depth = match &targets.max_depth {
        Some(target) => read(target)?,
        None => min_depth.clone(),
    };
    let position: Vec<Vec3> = read(&targets.position)?
        .chunks_exact(4)
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();
    let normal: Vec<Vec3> = read(&targets.normal)?
        .chunks_exact(4)
        .map(|n| Vec3::new(n[0], n[1], n[2]))
        .collect();
    let texcoord: Vec<Vec2> = read(&targets.texcoord)?
        .chunks_exact(2)
        .map(|t| Vec2::new(t[0], t[1]))
        .collect();

    Ok(GeometryImages {
        position: AttributeImage::from_vec(width, height, position)?,
        normal: AttributeImage::from_vec(width, height, normal)?,
        texcoord: AttributeImage::from_vec(width, height, texcoord)?,
        min_depth: AttributeImage::from_vec(width, height, min_depth)?,
        max_depth: AttributeImage::from_vec(width, height, max_depth)?,
    })
}
