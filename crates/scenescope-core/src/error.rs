//! Error types for scenescope.

use thiserror::Error;

/// The main error type for scenescope operations.
///
/// Each failure kind is its own variant so callers can match on it instead of
/// inspecting message text.
#[derive(Error, Debug)]
pub enum ScenescopeError {
    /// Scenescope has not been initialized.
    #[error("scenescope not initialized - call scenescope::init() first")]
    NotInitialized,

    /// A subsystem that is already live was initialized again.
    #[error("scenescope already initialized")]
    DoubleInitialization,

    /// A structure with the given name is already registered.
    #[error("structure name '{0}' is already in use")]
    NameCollision(String),

    /// No structure with the given name is registered.
    #[error("no structure named '{0}' is registered")]
    NotFound(String),

    /// A GPU resource could not be allocated, rendered or read back.
    #[error("GPU resource error: {0}")]
    GpuResource(String),

    /// Geometry handed to a structure constructor is inconsistent.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for scenescope operations.
pub type Result<T> = std::result::Result<T, ScenescopeError>;
