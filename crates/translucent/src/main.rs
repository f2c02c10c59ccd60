use std::process;

use clap::Parser;

use translucent::cli::CliArgs;
use translucent::{assets, Scene};

fn main() {
    env_logger::init();

    if let Err(e) = run(&CliArgs::parse()) {
        log::error!("{e}");
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> translucent::Result<()> {
    let options = args.options()?;
    let scene = Scene {
        mesh: assets::load_mesh(&args.mesh)?,
        texture: assets::load_texture(args.texture.as_deref())?,
        options,
    };

    if let Some(dir) = &args.dump_masks {
        translucent::dump_selection_masks(&scene, dir)?;
    }

    if let Some(path) = &args.screenshot {
        let (width, height) = (scene.options.window_width, scene.options.window_height);
        return translucent::render_to_file(&scene, path, width, height);
    }

    translucent::run(scene)
}
