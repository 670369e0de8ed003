//! Structure trait and related types.
//!
//! A [`Structure`] represents a geometric object in the scene, such as a point cloud,
//! surface mesh, camera view or ray set. The registry owns structures as
//! `Box<dyn Structure>` and drives them through this contract: drawing, pick
//! drawing, extent reporting and UI building.

use std::any::Any;
use std::fmt;

use glam::Vec3;

use crate::pick::PickRange;

/// The category a structure belongs to.
///
/// The declaration order is the category order used for drawing, picking and
/// the structures panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StructureType {
    /// A set of points.
    PointCloud,
    /// A polygonal surface mesh.
    SurfaceMesh,
    /// A camera frustum.
    CameraView,
    /// A set of polyline rays.
    RaySet,
}

impl StructureType {
    /// All categories, in category order.
    pub const ALL: [StructureType; 4] = [
        StructureType::PointCloud,
        StructureType::SurfaceMesh,
        StructureType::CameraView,
        StructureType::RaySet,
    ];

    /// Returns the human-readable category name.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            StructureType::PointCloud => "Point Cloud",
            StructureType::SurfaceMesh => "Surface Mesh",
            StructureType::CameraView => "Camera View",
            StructureType::RaySet => "Ray Set",
        }
    }
}

impl fmt::Display for StructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Render context handed to structures while drawing.
///
/// Implemented by the render backend; structures downcast it to the concrete
/// backend type. Kept abstract here so the core crate stays GPU-agnostic.
pub trait RenderContext {
    /// Returns the concrete context for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A geometric object that can be visualized and picked.
///
/// Names are unique across every category. UI methods receive the UI handle
/// as `&mut dyn Any` (an `egui::Ui` in practice) so the core does not depend
/// on a UI toolkit.
pub trait Structure: Any {
    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to self as `Any` for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the unique name of this structure.
    fn name(&self) -> &str;

    /// Returns the category of this structure.
    fn structure_type(&self) -> StructureType;

    /// Returns the axis-aligned bounding box `(min, max)` in world coordinates.
    ///
    /// Structures without spatial extent return a non-finite box, which the
    /// extent aggregator ignores.
    fn bounding_box(&self) -> (Vec3, Vec3);

    /// Returns a characteristic length scale (`>= 0`).
    fn length_scale(&self) -> f32;

    /// Returns whether this structure is currently drawn.
    fn is_enabled(&self) -> bool;

    /// Sets whether this structure is drawn.
    fn set_enabled(&mut self, enabled: bool);

    /// Draws this structure during the main render pass.
    fn draw(&mut self, ctx: &mut dyn RenderContext);

    /// Draws this structure into the pick buffer, colouring every selectable
    /// element with the encoding of its global pick index.
    fn draw_pick(&mut self, ctx: &mut dyn RenderContext);

    /// Builds the UI panel for this structure.
    fn build_ui(&mut self, ui: &mut dyn Any);

    /// Builds the UI describing one picked element.
    fn build_pick_ui(&self, ui: &mut dyn Any, local_index: u64);

    /// Builds UI shared by every structure of this category.
    ///
    /// Called on the first structure of a category only.
    fn build_shared_ui(&mut self, _ui: &mut dyn Any) {}

    /// Returns how many pickable elements this structure has.
    fn num_pick_elements(&self) -> u64;

    /// Returns the global pick index range claimed by this structure.
    fn pick_range(&self) -> Option<PickRange>;

    /// Stores the global pick index range claimed for this structure.
    fn set_pick_range(&mut self, range: Option<PickRange>);

    /// Drops GPU buffers so they are rebuilt on the next draw.
    ///
    /// Needed when the structure is drawn with a different device.
    fn release_gpu_resources(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_order() {
        let mut types = vec![
            StructureType::RaySet,
            StructureType::PointCloud,
            StructureType::CameraView,
            StructureType::SurfaceMesh,
        ];
        types.sort();
        assert_eq!(types, StructureType::ALL.to_vec());
    }

    #[test]
    fn test_display_uses_type_name() {
        assert_eq!(StructureType::PointCloud.to_string(), "Point Cloud");
        assert_eq!(StructureType::RaySet.to_string(), "Ray Set");
    }
}
