//! Application window and event loop management.

mod input;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec2;
use pollster::FutureExt;
use winit::{
    dpi::LogicalSize,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use translucent_core::{ArcballController, PointerEvent, RenderContext};
use translucent_render::{RenderEngine, RenderError, RenderLoop};

use crate::error::{AppError, Result};
use crate::Scene;

pub use input::{pointer_button, wheel_delta, KeyCommand, MATERIAL_SCALE_STEP};

/// The viewer application state.
pub struct App {
    scene: Scene,
    window: Option<Arc<Window>>,
    engine: Option<RenderEngine>,
    render_loop: Option<RenderLoop>,
    arcball: ArcballController,
    context: RenderContext,
    // Pointer events are queued as they arrive and applied once per frame
    pending_input: VecDeque<PointerEvent>,
    cursor: Vec2,
    last_frame: Option<Instant>,
    close_requested: bool,
    error: Option<AppError>,
}

impl App {
    /// Creates the application; graphics are set up when the event loop resumes.
    pub fn new(scene: Scene) -> Self {
        let options = &scene.options;
        let arcball =
            ArcballController::new(&options.camera, options.window_width, options.window_height);
        let context = RenderContext::from_options(options);
        Self {
            scene,
            window: None,
            engine: None,
            render_loop: None,
            arcball,
            context,
            pending_input: VecDeque::new(),
            cursor: Vec2::ZERO,
            last_frame: None,
            close_requested: false,
            error: None,
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let options = &self.scene.options;
        let window_attributes = Window::default_attributes()
            .with_title("translucent")
            .with_inner_size(LogicalSize::new(options.window_width, options.window_height));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .map_err(|e| AppError::Window(e.to_string()))?,
        );

        let engine = RenderEngine::new_windowed(window.clone()).block_on()?;
        let render_loop =
            RenderLoop::initialize(&engine, &self.scene.mesh, &self.scene.texture, options)?;
        log::info!("splatting {} diffusion samples", render_loop.sample_count());

        let (width, height) = engine.dimensions();
        self.arcball.set_viewport(width, height);

        self.window = Some(window);
        self.engine = Some(engine);
        self.render_loop = Some(render_loop);
        Ok(())
    }

    /// Records a fatal error and asks the event loop to stop.
    fn fail(&mut self, error: AppError) {
        log::error!("{error}");
        self.error = Some(error);
        self.close_requested = true;
    }

    pub(super) fn queue_pointer_event(&mut self, event: PointerEvent) {
        self.pending_input.push_back(event);
    }

    fn drain_input(&mut self) {
        while let Some(event) = self.pending_input.pop_front() {
            self.arcball.handle_event(event);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let (Some(engine), Some(render_loop)) = (&mut self.engine, &mut self.render_loop) {
            engine.resize(width, height);
            render_loop.resize(engine, width, height);
        }
        if width > 0 && height > 0 {
            self.arcball.set_viewport(width, height);
        }
    }

    /// Renders and presents a single frame.
    fn render(&mut self) {
        self.drain_input();

        let (Some(engine), Some(render_loop)) = (&mut self.engine, &self.render_loop) else {
            return;
        };
        let Some(surface) = engine.surface.as_ref() else {
            return;
        };

        let output = match surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                engine.resize(engine.width, engine.height);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Surface out of memory");
                self.error = Some(RenderError::SurfaceConfigurationFailed.into());
                self.close_requested = true;
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout");
                return;
            }
            Err(wgpu::SurfaceError::Other) => {
                log::warn!("Surface error: other");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        render_loop.render_frame(
            engine,
            &view,
            &self.context,
            self.arcball.model_matrix(),
            self.arcball.view_matrix(),
        );
        output.present();

        let now = Instant::now();
        if let (Some(last), Some(window)) = (self.last_frame, &self.window) {
            if let Some(title) = fps_title(now.duration_since(last)) {
                window.set_title(&title);
            }
        }
        self.last_frame = Some(now);
    }
}

/// Window title showing the instantaneous frame rate.
pub fn fps_title(frame_time: Duration) -> Option<String> {
    let seconds = frame_time.as_secs_f64();
    (seconds > 0.0).then(|| format!("FPS: {:.2}", 1.0 / seconds))
}

/// Runs the viewer until the window is closed.
pub fn run_app(scene: Scene) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(scene);
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
