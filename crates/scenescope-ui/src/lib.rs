//! UI layer for scenescope using egui.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]

pub mod integration;
pub mod panels;
pub mod structure_ui;

pub use integration::EguiIntegration;
pub use panels::*;
pub use structure_ui::*;
