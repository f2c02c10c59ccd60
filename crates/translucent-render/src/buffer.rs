//! GPU buffers for the mesh and the diffusion sample set.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use translucent_core::{Mesh, SampleSet, SplatConfig, Vertex};

/// Creates a buffer initialized with `data`.
pub fn create_buffer_init<T: Pod>(
    device: &wgpu::Device,
    data: &[T],
    usage: wgpu::BufferUsages,
    label: &str,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage: usage | wgpu::BufferUsages::COPY_DST,
    })
}

/// Creates a uniform buffer holding a single value.
pub fn create_uniform_buffer<T: Pod>(
    device: &wgpu::Device,
    value: &T,
    label: &str,
) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(value),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

/// Overwrites a uniform buffer.
pub fn write_uniform<T: Pod>(queue: &wgpu::Queue, buffer: &wgpu::Buffer, value: &T) {
    queue.write_buffer(buffer, 0, bytemuck::bytes_of(value));
}

/// Vertex buffer layout matching [`Vertex`].
pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// Uploaded mesh geometry.
pub struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl MeshBuffers {
    pub fn new(device: &wgpu::Device, mesh: &Mesh) -> Self {
        Self {
            vertex_buffer: create_buffer_init(
                device,
                mesh.vertices(),
                wgpu::BufferUsages::VERTEX,
                "mesh vertices",
            ),
            index_buffer: create_buffer_init(
                device,
                mesh.indices(),
                wgpu::BufferUsages::INDEX,
                "mesh indices",
            ),
            index_count: mesh.indices().len() as u32,
        }
    }

    /// Binds the buffers and issues the indexed draw.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// A diffusion sample as stored in the splat storage buffer.
///
/// Read in WGSL as a flat `array<f32>` with a stride of 10.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuSample {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub texcoord: [f32; 2],
    /// Object-space splat radius.
    pub splat_radius: f32,
    /// Integration area the sample stands for.
    pub area: f32,
}

/// Number of `f32` values per [`GpuSample`].
pub const GPU_SAMPLE_STRIDE: usize = std::mem::size_of::<GpuSample>() / 4;

impl GpuSample {
    #[must_use]
    pub fn from_sample(sample: &translucent_core::Sample, splat: &SplatConfig) -> Self {
        Self {
            position: sample.position.to_array(),
            normal: sample.normal.to_array(),
            texcoord: sample.texcoord.to_array(),
            splat_radius: splat.splat_radius(sample.radius),
            area: splat.footprint_area(sample.radius),
        }
    }
}

/// Uploaded sample list plus the identity index stream used as instance input.
pub struct SampleBuffers {
    pub sample_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub sample_count: u32,
}

impl SampleBuffers {
    pub fn new(device: &wgpu::Device, samples: &SampleSet, splat: &SplatConfig) -> Self {
        let gpu_samples: Vec<GpuSample> = samples
            .samples
            .iter()
            .map(|s| GpuSample::from_sample(s, splat))
            .collect();
        // Zero-sized buffers cannot be bound; keep one dummy element.
        let gpu_samples = if gpu_samples.is_empty() {
            vec![GpuSample::zeroed()]
        } else {
            gpu_samples
        };
        let indices = if samples.indices.is_empty() {
            vec![0]
        } else {
            samples.indices.clone()
        };

        Self {
            sample_buffer: create_buffer_init(
                device,
                &gpu_samples,
                wgpu::BufferUsages::STORAGE,
                "diffusion samples",
            ),
            index_buffer: create_buffer_init(
                device,
                &indices,
                wgpu::BufferUsages::VERTEX,
                "diffusion sample ids",
            ),
            sample_count: samples.len() as u32,
        }
    }

    /// Per-instance layout of the identity index stream.
    pub fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Uint32];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<u32>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use translucent_core::{Sample, Vec2, Vec3};

    #[test]
    fn test_gpu_sample_layout() {
        assert_eq!(std::mem::size_of::<GpuSample>(), 40);
        assert_eq!(GPU_SAMPLE_STRIDE, 10);
    }

    #[test]
    fn test_gpu_sample_from_sample() {
        let splat = SplatConfig::default();
        let sample = Sample {
            position: Vec3::new(1.0, 2.0, 3.0),
            normal: Vec3::Z,
            texcoord: Vec2::new(0.25, 0.75),
            radius: 0.5,
            level: 1,
        };
        let gpu = GpuSample::from_sample(&sample, &splat);
        assert_eq!(gpu.position, [1.0, 2.0, 3.0]);
        assert_eq!(gpu.texcoord, [0.25, 0.75]);
        assert_eq!(gpu.splat_radius, splat.splat_radius(0.5));
        assert_eq!(gpu.area, splat.footprint_area(0.5));
    }

    #[test]
    fn test_vertex_layout_stride() {
        assert_eq!(vertex_layout().array_stride, 32);
        assert_eq!(SampleBuffers::instance_layout().array_stride, 4);
    }
}
