//! Error types for translucent-rs.

use thiserror::Error;

/// The main error type for translucent-rs core operations.
#[derive(Error, Debug)]
pub enum TranslucentError {
    /// The mesh has no vertices or no triangles.
    #[error("mesh is empty - at least one triangle is required")]
    EmptyMesh,

    /// A required per-vertex attribute array is missing.
    #[error("mesh is missing the '{0}' attribute")]
    MissingAttribute(&'static str),

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A triangle index refers to a vertex that does not exist.
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    /// A material preset with the given name does not exist.
    #[error("unknown material '{0}'")]
    UnknownMaterial(String),

    /// An external asset could not be loaded.
    #[error("asset load error: {0}")]
    AssetLoad(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for translucent-rs operations.
pub type Result<T> = std::result::Result<T, TranslucentError>;
