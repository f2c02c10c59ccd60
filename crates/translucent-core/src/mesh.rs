//! Indexed triangle meshes.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::error::{Result, TranslucentError};

/// Interleaved vertex as uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub texcoord: [f32; 2],
}

impl Vertex {
    #[must_use]
    pub fn new(position: Vec3, normal: Vec3, texcoord: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            texcoord: texcoord.to_array(),
        }
    }
}

/// A validated triangle mesh with per-vertex normals and texture coordinates.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Creates a mesh, checking that it has at least one triangle and that
    /// every index refers to an existing vertex.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self> {
        if vertices.is_empty() || indices.len() < 3 {
            return Err(TranslucentError::EmptyMesh);
        }
        if indices.len() % 3 != 0 {
            return Err(TranslucentError::SizeMismatch {
                expected: indices.len() - indices.len() % 3,
                actual: indices.len(),
            });
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(TranslucentError::IndexOutOfRange {
                index,
                vertex_count: vertices.len(),
            });
        }
        Ok(Self { vertices, indices })
    }

    /// Builds a mesh from flat attribute arrays (3 floats per position and
    /// normal, 2 per texture coordinate).
    pub fn from_arrays(
        positions: &[f32],
        normals: &[f32],
        texcoords: &[f32],
        indices: Vec<u32>,
    ) -> Result<Self> {
        if positions.is_empty() {
            return Err(TranslucentError::EmptyMesh);
        }
        if normals.is_empty() {
            return Err(TranslucentError::MissingAttribute("normal"));
        }
        if texcoords.is_empty() {
            return Err(TranslucentError::MissingAttribute("texcoord"));
        }

        let count = positions.len() / 3;
        if positions.len() % 3 != 0 {
            return Err(TranslucentError::SizeMismatch {
                expected: count * 3,
                actual: positions.len(),
            });
        }
        if normals.len() != count * 3 {
            return Err(TranslucentError::SizeMismatch {
                expected: count * 3,
                actual: normals.len(),
            });
        }
        if texcoords.len() != count * 2 {
            return Err(TranslucentError::SizeMismatch {
                expected: count * 2,
                actual: texcoords.len(),
            });
        }

        let vertices = positions
            .chunks_exact(3)
            .zip(normals.chunks_exact(3))
            .zip(texcoords.chunks_exact(2))
            .map(|((p, n), t)| Vertex {
                position: [p[0], p[1], p[2]],
                normal: [n[0], n[1], n[2]],
                texcoord: [t[0], t[1]],
            })
            .collect();

        Self::new(vertices, indices)
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds as (min, max).
    #[must_use]
    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(lo, hi), v| {
                let p = Vec3::from_array(v.position);
                (lo.min(p), hi.max(p))
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_arrays() -> (Vec<f32>, Vec<f32>, Vec<f32>, Vec<u32>) {
        (
            vec![-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn test_from_arrays() {
        let (p, n, t, i) = quad_arrays();
        let mesh = Mesh::from_arrays(&p, &n, &t, i).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices()[2].texcoord, [1.0, 1.0]);
        let (lo, hi) = mesh.bounds();
        assert_eq!(lo, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(hi, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_missing_attributes() {
        let (p, n, t, i) = quad_arrays();
        assert!(matches!(
            Mesh::from_arrays(&p, &[], &t, i.clone()),
            Err(TranslucentError::MissingAttribute("normal"))
        ));
        assert!(matches!(
            Mesh::from_arrays(&p, &n, &[], i.clone()),
            Err(TranslucentError::MissingAttribute("texcoord"))
        ));
        assert!(matches!(
            Mesh::from_arrays(&[], &n, &t, i),
            Err(TranslucentError::EmptyMesh)
        ));
    }

    #[test]
    fn test_size_mismatch() {
        let (p, n, t, i) = quad_arrays();
        assert!(matches!(
            Mesh::from_arrays(&p, &n[..9], &t, i),
            Err(TranslucentError::SizeMismatch { expected: 12, actual: 9 })
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let (p, n, t, _) = quad_arrays();
        assert!(matches!(
            Mesh::from_arrays(&p, &n, &t, vec![0, 1, 4]),
            Err(TranslucentError::IndexOutOfRange { index: 4, vertex_count: 4 })
        ));
    }

    #[test]
    fn test_no_triangles() {
        let (p, n, t, _) = quad_arrays();
        assert!(matches!(
            Mesh::from_arrays(&p, &n, &t, vec![]),
            Err(TranslucentError::EmptyMesh)
        ));
    }
}
