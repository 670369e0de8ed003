//! Rendering backend for scenescope.
//!
//! This crate provides the wgpu-based rendering engine, including:
//! - device, surface and depth target management
//! - the off-screen pick buffer and its readback
//! - the scene/pick pipelines and their WGSL shader
//! - camera and screenshot support

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

pub mod camera;
pub mod draw;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod pick_buffer;
pub mod pipelines;
pub mod screenshot;

pub use camera::Camera;
pub use draw::{DrawContext, FrameParams};
pub use engine::RenderEngine;
pub use error::{RenderError, RenderResult};
pub use geometry::{CameraUniforms, DrawUniforms, GeometryKind, GpuGeometry, Vertex};
pub use pick_buffer::PickBuffer;
pub use pipelines::{is_pick_renderable, DrawTarget, Pipelines, DEPTH_FORMAT, PICK_FORMAT};
pub use screenshot::{image_from_pixels, save_image, ScreenshotCounter, ScreenshotError};
