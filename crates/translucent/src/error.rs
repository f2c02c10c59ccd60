//! Application-level error type.

use thiserror::Error;

use translucent_core::TranslucentError;
use translucent_render::{RenderError, ScreenshotError};

/// Errors surfaced by the viewer. Every variant is fatal at the binary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] TranslucentError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),

    #[error("failed to load mesh: {0}")]
    MeshLoad(#[from] tobj::LoadError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("window error: {0}")]
    Window(String),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for the viewer.
pub type Result<T> = std::result::Result<T, AppError>;
