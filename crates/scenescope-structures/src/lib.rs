//! Structure implementations for scenescope.
//!
//! This crate provides the concrete geometric structures:
//! - Point clouds
//! - Surface meshes (polygons, fan-triangulated)
//! - Camera views
//! - Ray sets

// Graphics code intentionally uses casts for indices, colors, and coordinates
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod bounds;
pub mod camera_view;
mod gpu;
pub mod point_cloud;
pub mod ray_set;
pub mod surface_mesh;

pub use camera_view::{CameraParameters, CameraView};
pub use point_cloud::PointCloud;
pub use ray_set::{RayPoint, RaySet};
pub use surface_mesh::{MeshElement, SurfaceMesh};
