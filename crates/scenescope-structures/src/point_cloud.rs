//! Point cloud structure.

use std::any::Any;

use glam::Vec3;
use scenescope_core::{PickRange, RenderContext, Structure, StructureType};
use scenescope_render::{DrawContext, DrawUniforms, GeometryKind, Vertex};

use crate::bounds::{bounds_of, diagonal};
use crate::gpu::LazyGeometry;

/// A point cloud structure.
///
/// Points are drawn as camera-facing discs. Every point is one pick element.
pub struct PointCloud {
    name: String,
    points: Vec<Vec3>,
    enabled: bool,
    base_color: Vec3,
    /// Point radius relative to the scene length scale.
    point_radius: f32,
    pick_range: Option<PickRange>,
    geometry: LazyGeometry,
}

impl PointCloud {
    /// Creates a new point cloud.
    pub fn new(name: impl Into<String>, points: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            points,
            enabled: true,
            base_color: Vec3::new(0.2, 0.5, 0.8),
            point_radius: 0.005,
            pick_range: None,
            geometry: LazyGeometry::default(),
        }
    }

    /// Returns the number of points.
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Returns the points.
    #[must_use]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Replaces the point positions.
    ///
    /// Changing the number of points changes the number of pick elements; do
    /// this through `Context::with_structure_mut` so the pick range follows.
    pub fn update_points(&mut self, points: Vec<Vec3>) {
        self.points = points;
        self.geometry.invalidate();
    }

    /// Returns the base color.
    #[must_use]
    pub fn base_color(&self) -> Vec3 {
        self.base_color
    }

    /// Sets the base color.
    pub fn set_base_color(&mut self, color: Vec3) -> &mut Self {
        self.base_color = color;
        self
    }

    /// Returns the point radius relative to the scene length scale.
    #[must_use]
    pub fn point_radius(&self) -> f32 {
        self.point_radius
    }

    /// Sets the point radius relative to the scene length scale.
    pub fn set_point_radius(&mut self, radius: f32) -> &mut Self {
        self.point_radius = radius.max(0.0);
        self
    }

    fn draw_points(&mut self, ctx: &mut dyn RenderContext) {
        let Some(ctx) = DrawContext::from_context(ctx) else {
            return;
        };
        let radius = self.point_radius * ctx.params().length_scale;
        let uniforms = DrawUniforms::new(self.base_color, self.pick_range, radius, false);
        let points = &self.points;
        self.geometry
            .draw(ctx, GeometryKind::Sprites, &self.name, &uniforms, || {
                points
                    .iter()
                    .enumerate()
                    .map(|(i, &p)| Vertex::new(p, Vec3::ONE, i as u32))
                    .collect()
            });
    }
}

impl Structure for PointCloud {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn structure_type(&self) -> StructureType {
        StructureType::PointCloud
    }

    fn bounding_box(&self) -> (Vec3, Vec3) {
        bounds_of(self.points.iter().copied())
    }

    fn length_scale(&self) -> f32 {
        diagonal(self.bounding_box())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn draw(&mut self, ctx: &mut dyn RenderContext) {
        self.draw_points(ctx);
    }

    fn draw_pick(&mut self, ctx: &mut dyn RenderContext) {
        // Same sprites; the pick pipeline colors them by element.
        self.draw_points(ctx);
    }

    fn build_ui(&mut self, ui: &mut dyn Any) {
        let Some(ui) = scenescope_ui::as_egui(ui) else {
            return;
        };
        let mut color = self.base_color.to_array();
        let mut radius = self.point_radius;
        if scenescope_ui::build_point_cloud_ui(ui, self.points.len(), &mut radius, &mut color) {
            self.base_color = Vec3::from_array(color);
            self.set_point_radius(radius);
        }
    }

    fn build_pick_ui(&self, ui: &mut dyn Any, local_index: u64) {
        let Some(ui) = scenescope_ui::as_egui(ui) else {
            return;
        };
        let Some(&point) = usize::try_from(local_index)
            .ok()
            .and_then(|i| self.points.get(i))
        else {
            return;
        };
        scenescope_ui::build_element_info(
            ui,
            &format!("Point #{local_index}"),
            &[("Position", scenescope_ui::format_vec3(point))],
        );
    }

    fn num_pick_elements(&self) -> u64 {
        self.points.len() as u64
    }

    fn pick_range(&self) -> Option<PickRange> {
        self.pick_range
    }

    fn set_pick_range(&mut self, range: Option<PickRange>) {
        self.pick_range = range;
    }

    fn release_gpu_resources(&mut self) {
        self.geometry.invalidate();
    }
}
