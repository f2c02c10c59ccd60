//! Copying render targets back to the CPU.

use half::f16;

use crate::error::{RenderError, RenderResult};

/// Bytes per row rounded up to wgpu's copy alignment.
#[must_use]
pub fn aligned_bytes_per_row(width: u32, bytes_per_pixel: u32) -> u32 {
    let unaligned = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// Removes the per-row padding of a copied buffer.
#[must_use]
pub fn strip_row_padding(
    data: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
) -> Vec<u8> {
    let padded = aligned_bytes_per_row(width, bytes_per_pixel) as usize;
    let row_bytes = (width * bytes_per_pixel) as usize;
    let mut result = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * padded;
        result.extend_from_slice(&data[start..start + row_bytes]);
    }
    result
}

/// Reads mip 0 of `texture` into a tightly packed byte vector.
///
/// Blocks until the copy completes.
pub fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> RenderResult<Vec<u8>> {
    let width = texture.width();
    let height = texture.height();
    let bytes_per_pixel = texture
        .format()
        .block_copy_size(None)
        .ok_or(RenderError::BufferMapFailed)?;
    let bytes_per_row = aligned_bytes_per_row(width, bytes_per_pixel);

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback buffer"),
        size: u64::from(bytes_per_row) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::PollType::wait_indefinitely());
    rx.recv()
        .map_err(|_| RenderError::BufferMapFailed)?
        .map_err(|_| RenderError::BufferMapFailed)?;

    let data = buffer_slice.get_mapped_range();
    let result = strip_row_padding(&data, width, height, bytes_per_pixel);
    drop(data);
    buffer.unmap();

    Ok(result)
}

/// Decodes little-endian `f32` texels.
#[must_use]
pub fn decode_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Decodes little-endian half-float texels to `f32`.
#[must_use]
pub fn decode_f16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|b| f16::from_le_bytes([b[0], b[1]]).to_f32())
        .collect()
}

/// Decodes the texels of a float color format, whatever its component width.
#[must_use]
pub fn decode_float_texels(format: wgpu::TextureFormat, bytes: &[u8]) -> Vec<f32> {
    let component_bytes = format
        .block_copy_size(None)
        .map_or(4, |size| size / u32::from(format.components()));
    if component_bytes == 2 {
        decode_f16(bytes)
    } else {
        decode_f32(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_aligned_bytes_per_row() {
        assert_eq!(aligned_bytes_per_row(64, 4), 256);
        assert_eq!(aligned_bytes_per_row(65, 4), 512);
        assert_eq!(aligned_bytes_per_row(1024, 16), 16384);
        assert_eq!(aligned_bytes_per_row(3, 2), 256);
    }

    #[test]
    fn test_strip_row_padding() {
        // 2x2 pixels of 4 bytes, rows padded to 256
        let mut data = vec![0u8; 512];
        data[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        data[256..264].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
        let stripped = strip_row_padding(&data, 2, 2, 4);
        assert_eq!(stripped, (1..=16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_decode_f32() {
        let mut bytes = Vec::new();
        for v in [1.5f32, -2.0, 0.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(decode_f32(&bytes), vec![1.5, -2.0, 0.0]);
    }

    #[test]
    fn test_decode_f16() {
        let mut bytes = Vec::new();
        for v in [0.5f32, -1.0, 1024.0] {
            bytes.extend_from_slice(&f16::from_f32(v).to_le_bytes());
        }
        assert_eq!(decode_f16(&bytes), vec![0.5, -1.0, 1024.0]);
    }

    #[test]
    fn test_decode_follows_component_width() {
        let mut half = Vec::new();
        for v in [0.25f32, 2.0] {
            half.extend_from_slice(&f16::from_f32(v).to_le_bytes());
        }
        assert_eq!(
            decode_float_texels(wgpu::TextureFormat::Rg16Float, &half),
            vec![0.25, 2.0]
        );
        assert_eq!(
            decode_float_texels(wgpu::TextureFormat::R16Float, &half),
            vec![0.25, 2.0]
        );

        let full = 0.75f32.to_le_bytes();
        assert_eq!(decode_float_texels(wgpu::TextureFormat::R32Float, &full), vec![0.75]);
    }

    proptest! {
        #[test]
        fn prop_row_padding_round_trip(
            width in 1u32..200,
            height in 1u32..8,
            bytes_per_pixel in prop::sample::select(vec![2u32, 4, 8, 16]),
        ) {
            let padded = aligned_bytes_per_row(width, bytes_per_pixel);
            prop_assert_eq!(padded % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);
            prop_assert!(padded >= width * bytes_per_pixel);
            prop_assert!(padded - width * bytes_per_pixel < wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

            let data: Vec<u8> = (0..padded * height).map(|i| (i % 251) as u8).collect();
            let stripped = strip_row_padding(&data, width, height, bytes_per_pixel);
            prop_assert_eq!(stripped.len() as u32, width * bytes_per_pixel * height);
            let row = (width * bytes_per_pixel) as usize;
            let last = (height - 1) as usize;
            prop_assert_eq!(
                &stripped[last * row..],
                &data[last * padded as usize..last * padded as usize + row]
            );
        }
    }
}
