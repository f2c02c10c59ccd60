//! Mesh and texture loading.

use std::path::Path;

use image::RgbaImage;

use translucent_core::{Mesh, TranslucentError};
use translucent_render::white_image;

use crate::error::Result;

/// Loads an OBJ file, merging all of its shapes into one mesh.
///
/// Every shape must carry normals and texture coordinates.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    if models.is_empty() {
        return Err(TranslucentError::AssetLoad(format!(
            "{} contains no shapes",
            path.display()
        ))
        .into());
    }

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut texcoords = Vec::new();
    let mut indices = Vec::new();

    for model in &models {
        let mesh = &model.mesh;
        let vertex_offset = (positions.len() / 3) as u32;
        let vertex_count = mesh.positions.len() / 3;
        if vertex_count > 0 && mesh.normals.is_empty() {
            return Err(TranslucentError::MissingAttribute("normal").into());
        }
        if vertex_count > 0 && mesh.texcoords.is_empty() {
            return Err(TranslucentError::MissingAttribute("texcoord").into());
        }

        positions.extend_from_slice(&mesh.positions);
        normals.extend_from_slice(&mesh.normals);
        texcoords.extend_from_slice(&mesh.texcoords);
        indices.extend(mesh.indices.iter().map(|i| i + vertex_offset));
    }

    let mesh = Mesh::from_arrays(&positions, &normals, &texcoords, indices)?;
    log::info!(
        "loaded {} ({} shapes, {} vertices, {} triangles)",
        path.display(),
        models.len(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Loads the diffuse texture, or a 1x1 white image when no path is given.
pub fn load_texture(path: Option<&Path>) -> Result<RgbaImage> {
    let Some(path) = path else {
        log::info!("no diffuse texture given, using white");
        return Ok(white_image());
    };
    let image = image::open(path)?.to_rgba8();
    log::info!(
        "loaded texture {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_textured_quad() {
        let path = write_temp(
            "translucent_quad.obj",
            "v -1 -1 0\nv 1 -1 0\nv 1 1 0\nv -1 1 0\n\
             vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
             vn 0 0 1\n\
             f 1/1/1 2/2/1 3/3/1\nf 1/1/1 3/3/1 4/4/1\n",
        );
        let mesh = load_mesh(&path).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.vertices().iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_normals_rejected() {
        let path = write_temp(
            "translucent_no_normals.obj",
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n",
        );
        let result = load_mesh(&path);
        assert!(matches!(
            result,
            Err(AppError::Core(TranslucentError::MissingAttribute("normal")))
        ));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_file() {
        assert!(load_mesh("/nonexistent/mesh.obj").is_err());
    }

    #[test]
    fn test_default_texture_is_white() {
        let image = load_texture(None).unwrap();
        assert_eq!(image.dimensions(), (1, 1));
        assert_eq!(image.get_pixel(0, 0).0, [255; 4]);
    }
}
