//! Rendering error types.

use scenescope_core::ScenescopeError;
use thiserror::Error;

use crate::screenshot::ScreenshotError;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create surface.
    #[error("failed to create surface: {0}")]
    SurfaceCreationFailed(#[from] wgpu::CreateSurfaceError),

    /// Surface lost.
    #[error("surface lost")]
    SurfaceLost,

    /// Surface outdated.
    #[error("surface outdated")]
    SurfaceOutdated,

    /// Out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// Timeout waiting for GPU.
    #[error("timeout waiting for GPU")]
    Timeout,

    /// The pick buffer has not been allocated yet.
    #[error("pick buffer not allocated")]
    PickBufferNotAllocated,

    /// The adapter cannot render into the pick buffer format.
    #[error("picking is unavailable: the adapter cannot render {0:?}")]
    PickUnsupported(wgpu::TextureFormat),

    /// A pick query addressed a pixel outside the pick buffer.
    #[error("pick position ({x}, {y}) is outside the {width}x{height} pick buffer")]
    PickOutOfBounds {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
        /// Pick buffer width.
        width: u32,
        /// Pick buffer height.
        height: u32,
    },

    /// Mapping a readback buffer failed.
    #[error("GPU buffer mapping failed: {0}")]
    BufferMapFailed(String),

    /// The GPU reported an error while executing a pass.
    #[error("GPU error during {pass} (frame {frame}): {message}")]
    Gpu {
        /// Frame number the error was captured in.
        frame: u64,
        /// Pass that raised it.
        pass: &'static str,
        /// Driver message.
        message: String,
    },

    /// Writing a screenshot failed.
    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

impl From<wgpu::SurfaceError> for RenderError {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost => RenderError::SurfaceLost,
            wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
            wgpu::SurfaceError::Timeout => RenderError::Timeout,
            _ => RenderError::SurfaceOutdated,
        }
    }
}

impl From<RenderError> for ScenescopeError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Screenshot(ScreenshotError::IoError(io)) => ScenescopeError::IoError(io),
            other => ScenescopeError::GpuResource(other.to_string()),
        }
    }
}
