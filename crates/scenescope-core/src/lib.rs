//! Core abstractions for scenescope.
//!
//! This crate provides the GPU-agnostic parts of the viewer:
//! - [`Structure`] trait for geometric objects (meshes, point clouds, etc.)
//! - [`Registry`] and the owned session [`Context`]
//! - scene extent aggregation ([`SceneExtent`])
//! - pick index encoding, allocation and the selection state machine
//! - configuration [`Options`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Options structs legitimately have many boolean flags
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extent;
pub mod options;
pub mod palette;
pub mod pick;
pub mod registry;
pub mod selection;
pub mod state;
pub mod structure;

#[cfg(test)]
mod test_support;

pub use error::{Result, ScenescopeError};
pub use extent::SceneExtent;
pub use options::Options;
pub use palette::Palette;
pub use pick::{
    color_to_index, index_to_color, index_to_limbs, offset_limbs, PickIndexAllocator, PickRange,
    MAX_ELEMENTS_PER_STRUCTURE,
};
pub use registry::Registry;
pub use selection::{PickState, Selection};
pub use state::Context;
pub use structure::{RenderContext, Structure, StructureType};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
