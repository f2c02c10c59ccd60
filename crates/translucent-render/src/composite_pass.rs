//! Final composite of direct reflection and accumulated diffusion.

use glam::{Mat4, Vec3};

use translucent_core::RenderContext;

use crate::buffer::{create_uniform_buffer, vertex_layout, write_uniform, MeshBuffers};
use crate::engine::RenderEngine;
use crate::error::RenderResult;
use crate::texture::{DiffuseTexture, RenderTarget};

/// Constant term added to the diffuse lighting of the reflection.
pub const AMBIENT: f32 = 0.1;

/// GPU representation of the composite uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct CompositeUniforms {
    pub mvp: [[f32; 4]; 4],
    pub light_position: [f32; 4],
    pub reflection_factor: f32,
    pub transmission_factor: f32,
    pub ambient: f32,
    pub _padding: f32,
}

impl CompositeUniforms {
    #[must_use]
    pub fn new(mvp: Mat4, light_position: Vec3, context: &RenderContext) -> Self {
        Self {
            mvp: mvp.to_cols_array_2d(),
            light_position: light_position.extend(1.0).to_array(),
            reflection_factor: context.reflection_factor(),
            transmission_factor: context.transmission_factor(),
            ambient: AMBIENT,
            _padding: 0.0,
        }
    }
}

/// Mesh shading pipeline writing the final color.
pub struct CompositePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    depth: RenderTarget,
    bind_group: Option<wgpu::BindGroup>,
}

impl CompositePass {
    pub fn new(engine: &RenderEngine, width: u32, height: u32) -> RenderResult<Self> {
        let device = &engine.device;
        let shader = engine
            .create_shader_module("Composite Shader", include_str!("shaders/composite.wgsl"))?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Bind Group Layout"),
            entries: &[
                // Uniforms
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Diffuse texture
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Diffuse sampler
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                // Diffusion accumulation map
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Composite Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let output_format = engine.output_format();
        let pipeline = engine.validated("Composite Pipeline", |device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Composite Pipeline"),
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
                    targets: &[Some(wgpu::ColorTargetState {
                        format: output_format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
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
        })?;

        let uniform_buffer = create_uniform_buffer(
            device,
            &CompositeUniforms::new(Mat4::IDENTITY, Vec3::ZERO, &RenderContext::default()),
            "Composite Uniforms",
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            depth: RenderTarget::depth(device, "composite depth", width, height),
            bind_group: None,
        })
    }

    /// Recreates the depth buffer. Call [`Self::bind`] afterwards.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth = RenderTarget::depth(device, "composite depth", width, height);
        self.bind_group = None;
    }

    /// Binds the diffuse texture and the diffusion accumulation map.
    pub fn bind(
        &mut self,
        device: &wgpu::Device,
        texture: &DiffuseTexture,
        diffusion_map: &wgpu::TextureView,
    ) {
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(diffusion_map),
                },
            ],
        }));
    }

    /// Uploads the camera transform, light position and toggle factors.
    pub fn update_uniforms(
        &self,
        queue: &wgpu::Queue,
        mvp: Mat4,
        light_position: Vec3,
        context: &RenderContext,
    ) {
        write_uniform(
            queue,
            &self.uniform_buffer,
            &CompositeUniforms::new(mvp, light_position, context),
        );
    }

    /// Clears `output` to black and draws the shaded mesh into it.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        mesh: &MeshBuffers,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Composite Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        let Some(bind_group) = &self.bind_group else {
            return;
        };
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        mesh.draw(&mut render_pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<CompositeUniforms>(), 96);
    }

    #[test]
    fn test_factors_follow_toggles() {
        let mut context = RenderContext::default();
        let on = CompositeUniforms::new(Mat4::IDENTITY, Vec3::ZERO, &context);
        assert_eq!((on.reflection_factor, on.transmission_factor), (1.0, 1.0));

        context.set_reflection_enabled(false);
        context.set_transmission_enabled(false);
        let off = CompositeUniforms::new(Mat4::IDENTITY, Vec3::ZERO, &context);
        assert_eq!((off.reflection_factor, off.transmission_factor), (0.0, 0.0));
    }
}
