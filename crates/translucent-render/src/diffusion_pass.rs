//! Additive dipole splatting into the diffusion accumulation buffer.

use glam::{Mat4, Vec3};

use translucent_core::dipole::boundary_term;
use translucent_core::Material;

use crate::buffer::{create_uniform_buffer, write_uniform, SampleBuffers};
use crate::engine::RenderEngine;
use crate::error::RenderResult;
use crate::texture::RenderTarget;

/// Accumulation buffer format (float, blendable).
pub const ACCUMULATION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// GPU representation of the splat uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct SplatUniforms {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub light_position: [f32; 4],
    /// Scaled absorption coefficient.
    pub sigma_a: [f32; 4],
    /// Scaled reduced scattering coefficient.
    pub sigmap_s: [f32; 4],
    pub eta: f32,
    /// Uniform scale of the model-view transform, applied to splat radii.
    pub view_scale: f32,
    /// Dipole boundary term `A` for `eta`.
    pub boundary: f32,
    pub _padding: f32,
}

impl SplatUniforms {
    #[must_use]
    pub fn new(
        material: &Material,
        model_view: Mat4,
        projection: Mat4,
        light_position: Vec3,
    ) -> Self {
        Self {
            model_view: model_view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            light_position: light_position.extend(1.0).to_array(),
            sigma_a: material.scaled_sigma_a().extend(0.0).to_array(),
            sigmap_s: material.scaled_sigmap_s().extend(0.0).to_array(),
            eta: material.eta,
            view_scale: model_view.x_axis.truncate().length(),
            boundary: boundary_term(material.eta),
            _padding: 0.0,
        }
    }
}

/// Splat pipeline and the accumulation buffer it renders into.
pub struct DiffusionPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    accumulation: RenderTarget,
    bind_group: Option<wgpu::BindGroup>,
}

impl DiffusionPass {
    pub fn new(engine: &RenderEngine, width: u32, height: u32) -> RenderResult<Self> {
        let device = &engine.device;
        let shader = engine
            .create_shader_module("Dipole Splat Shader", include_str!("shaders/dipole.wgsl"))?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Dipole Splat Bind Group Layout"),
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
                // Samples
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // View-space position map
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
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
            label: Some("Dipole Splat Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let additive = wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        };

        let pipeline = engine.validated("Dipole Splat Pipeline", |device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Dipole Splat Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[SampleBuffers::instance_layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ACCUMULATION_FORMAT,
                        blend: Some(wgpu::BlendState {
                            color: additive,
                            alpha: additive,
                        }),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        })?;

        let uniform_buffer = create_uniform_buffer(
            device,
            &SplatUniforms::new(&Material::default(), Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ZERO),
            "Dipole Splat Uniforms",
        );

        Ok(Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            accumulation: Self::create_accumulation(device, width, height),
            bind_group: None,
        })
    }

    fn create_accumulation(device: &wgpu::Device, width: u32, height: u32) -> RenderTarget {
        RenderTarget::new(
            device,
            "diffusion accumulation",
            width,
            height,
            ACCUMULATION_FORMAT,
            wgpu::TextureUsages::TEXTURE_BINDING,
        )
    }

    /// Recreates the accumulation buffer. Call [`Self::bind`] afterwards.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.accumulation = Self::create_accumulation(device, width, height);
        self.bind_group = None;
    }

    /// Binds the sample list and the view-space position map.
    pub fn bind(
        &mut self,
        device: &wgpu::Device,
        samples: &SampleBuffers,
        view_position: &wgpu::TextureView,
    ) {
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Dipole Splat Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: samples.sample_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(view_position),
                },
            ],
        }));
    }

    /// Uploads the active material and the current transforms.
    pub fn update_uniforms(
        &self,
        queue: &wgpu::Queue,
        material: &Material,
        model_view: Mat4,
        projection: Mat4,
        light_position: Vec3,
    ) {
        write_uniform(
            queue,
            &self.uniform_buffer,
            &SplatUniforms::new(material, model_view, projection, light_position),
        );
    }

    /// Clears the accumulation buffer and splats every sample into it.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, samples: &SampleBuffers) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Dipole Splat Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.accumulation.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });

        let Some(bind_group) = &self.bind_group else {
            return;
        };
        if samples.sample_count == 0 {
            return;
        }

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.set_vertex_buffer(0, samples.index_buffer.slice(..));
        render_pass.draw(0..6, 0..samples.sample_count);
    }

    /// The accumulated diffusion map.
    #[must_use]
    pub fn accumulation_view(&self) -> &wgpu::TextureView {
        &self.accumulation.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use translucent_core::MaterialPreset;

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<SplatUniforms>(), 192);
    }

    #[test]
    fn test_uniforms_carry_scaled_material() {
        let material = Material::from_preset(MaterialPreset::Skin, 50.0);
        let model_view = Mat4::from_scale(Vec3::splat(5.0));
        let uniforms = SplatUniforms::new(&material, model_view, Mat4::IDENTITY, Vec3::X);
        assert_eq!(uniforms.sigma_a[0], material.scaled_sigma_a().x);
        assert_eq!(uniforms.sigmap_s[2], material.scaled_sigmap_s().z);
        assert_eq!(uniforms.eta, 1.3);
        assert!((uniforms.view_scale - 5.0).abs() < 1e-6);
        assert_eq!(uniforms.boundary, boundary_term(1.3));
        assert!(uniforms.boundary > 1.0);
        assert_eq!(uniforms.light_position, [1.0, 0.0, 0.0, 1.0]);
    }
}
