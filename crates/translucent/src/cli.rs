//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use translucent_core::Options;

use crate::error::Result;

/// Real-time translucent material viewer.
#[derive(Parser, Debug)]
#[command(
    name = "translucent",
    about = "Real-time translucent material viewer",
    long_about = "Renders a textured OBJ mesh with screen-space subsurface diffusion.\n\n\
                  Keys: 1 = milk, 2 = skin, R = toggle reflection, T = toggle transmission,\n\
                  [ / ] = shrink / grow material scale, Esc = quit."
)]
pub struct CliArgs {
    /// OBJ mesh with normals and texture coordinates.
    #[arg(short, long, value_name = "FILE.obj")]
    pub mesh: PathBuf,

    /// Diffuse color texture. A white texture is used when omitted.
    #[arg(short, long, value_name = "IMAGE")]
    pub texture: Option<PathBuf>,

    /// JSON options file. Missing fields keep their defaults.
    #[arg(short, long, value_name = "FILE.json")]
    pub config: Option<PathBuf>,

    /// Render one frame without a window and save it to this file.
    #[arg(short, long, value_name = "FILE.png")]
    pub screenshot: Option<PathBuf>,

    /// Viewport width; defaults to the configured window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Viewport height; defaults to the configured window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Write the per-level sample selection masks into this directory.
    #[arg(long, value_name = "DIR")]
    pub dump_masks: Option<PathBuf>,
}

impl CliArgs {
    /// Loads the options file (if any) and applies size overrides.
    pub fn options(&self) -> Result<Options> {
        let mut options = match &self.config {
            Some(path) => Options::from_json_file(path)?,
            None => Options::default(),
        };
        if let Some(width) = self.width {
            options.window_width = width;
        }
        if let Some(height) = self.height {
            options.window_height = height;
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_arguments() {
        let args = CliArgs::try_parse_from(["translucent", "--mesh", "bunny.obj"]).unwrap();
        assert_eq!(args.mesh, PathBuf::from("bunny.obj"));
        assert!(args.texture.is_none());
        let options = args.options().unwrap();
        assert_eq!(options.window_width, 1000);
        assert_eq!(options.window_height, 600);
    }

    #[test]
    fn test_size_overrides() {
        let args = CliArgs::try_parse_from([
            "translucent",
            "-m",
            "bunny.obj",
            "--screenshot",
            "out.png",
            "--width",
            "320",
            "--height",
            "240",
        ])
        .unwrap();
        let options = args.options().unwrap();
        assert_eq!((options.window_width, options.window_height), (320, 240));
        assert_eq!(args.screenshot, Some(PathBuf::from("out.png")));
    }

    #[test]
    fn test_mesh_is_required() {
        assert!(CliArgs::try_parse_from(["translucent"]).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let args = CliArgs::try_parse_from([
            "translucent",
            "--mesh",
            "bunny.obj",
            "--config",
            "/nonexistent/options.json",
        ])
        .unwrap();
        assert!(args.options().is_err());
    }
}
