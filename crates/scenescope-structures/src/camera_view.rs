//! Camera view structure: a camera frustum drawn as a wireframe widget.

use std::any::Any;

use glam::Vec3;
use scenescope_core::{PickRange, RenderContext, Structure, StructureType};
use scenescope_render::{DrawContext, DrawUniforms, GeometryKind, Vertex};

use crate::gpu::{segment, LazyGeometry};

/// Intrinsics and extrinsics of a pinhole camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParameters {
    /// Camera position in world space.
    pub position: Vec3,
    /// Look direction (normalized).
    pub look_dir: Vec3,
    /// Up direction (normalized).
    pub up_dir: Vec3,
    /// Vertical field of view in degrees.
    pub fov_vertical_degrees: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
}

impl CameraParameters {
    /// Creates camera parameters from vectors.
    pub fn new(
        position: Vec3,
        look_dir: Vec3,
        up_dir: Vec3,
        fov_vertical_degrees: f32,
        aspect_ratio: f32,
    ) -> Self {
        Self {
            position,
            look_dir: look_dir.normalize_or(Vec3::NEG_Z),
            up_dir: up_dir.normalize_or(Vec3::Y),
            fov_vertical_degrees,
            aspect_ratio,
        }
    }

    /// Creates camera parameters for a camera looking at a target.
    pub fn look_at(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov_vertical_degrees: f32,
        aspect_ratio: f32,
    ) -> Self {
        Self::new(position, target - position, up, fov_vertical_degrees, aspect_ratio)
    }

    /// Gets the camera frame as (look, up, right), with `up` re-orthogonalized.
    pub fn camera_frame(&self) -> (Vec3, Vec3, Vec3) {
        let right = self.look_dir.cross(self.up_dir).normalize_or(Vec3::X);
        let up = right.cross(self.look_dir).normalize_or(Vec3::Y);
        (self.look_dir, up, right)
    }
}

impl Default for CameraParameters {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y, 60.0, 16.0 / 9.0)
    }
}

/// Points of the frustum widget.
#[derive(Debug, Clone, Copy)]
struct Frustum {
    root: Vec3,
    /// upper left, upper right, lower right, lower left
    corners: [Vec3; 4],
    /// left, right, top of the orientation triangle above the frame
    triangle: [Vec3; 3],
}

impl Frustum {
    fn new(params: &CameraParameters, focal: f32) -> Self {
        let root = params.position;
        let (look, up, right) = params.camera_frame();
        let center = root + look * focal;

        let half_height = focal * (params.fov_vertical_degrees.to_radians() / 2.0).tan();
        let frame_up = up * half_height;
        let frame_right = right * (params.aspect_ratio * half_height);

        Self {
            root,
            corners: [
                center + frame_up - frame_right,
                center + frame_up + frame_right,
                center - frame_up + frame_right,
                center - frame_up - frame_right,
            ],
            triangle: [
                center + frame_up * 1.2 - frame_right * 0.7,
                center + frame_up * 1.2 + frame_right * 0.7,
                center + frame_up * 2.0,
            ],
        }
    }

    fn wireframe(&self) -> Vec<Vertex> {
        let color = Vec3::ONE;
        let mut vertices = Vec::with_capacity(22);
        for i in 0..4 {
            let next = self.corners[(i + 1) % 4];
            vertices.extend(segment(self.root, self.corners[i], color, 0));
            vertices.extend(segment(self.corners[i], next, color, 0));
        }
        for i in 0..3 {
            vertices.extend(segment(self.triangle[i], self.triangle[(i + 1) % 3], color, 0));
        }
        vertices
    }

    /// Solid sides and frame, so the whole widget is clickable.
    fn solid(&self) -> Vec<Vertex> {
        let v = |p| Vertex::new(p, Vec3::ONE, 0);
        let [ul, ur, lr, ll] = self.corners;
        let mut vertices = Vec::with_capacity(21);
        for i in 0..4 {
            vertices.extend([v(self.root), v(self.corners[i]), v(self.corners[(i + 1) % 4])]);
        }
        vertices.extend([v(ul), v(ur), v(lr), v(ul), v(lr), v(ll)]);
        vertices.extend(self.triangle.map(v));
        vertices
    }
}

/// A camera view structure.
///
/// The widget is scaled by the scene length scale. The whole widget is a
/// single pick element.
pub struct CameraView {
    name: String,
    params: CameraParameters,
    enabled: bool,
    color: Vec3,
    /// Frustum depth relative to the scene length scale.
    widget_focal_length: f32,
    pick_range: Option<PickRange>,
    wireframe: LazyGeometry,
    solid: LazyGeometry,
    /// Focal length the current geometry was built with.
    built_focal: f32,
}

impl CameraView {
    /// Creates a new camera view.
    pub fn new(name: impl Into<String>, params: CameraParameters) -> Self {
        Self {
            name: name.into(),
            params,
            enabled: true,
            color: Vec3::new(0.1, 0.1, 0.1),
            widget_focal_length: 0.05,
            pick_range: None,
            wireframe: LazyGeometry::default(),
            solid: LazyGeometry::default(),
            built_focal: 0.0,
        }
    }

    /// Returns the camera parameters.
    #[must_use]
    pub fn params(&self) -> &CameraParameters {
        &self.params
    }

    /// Sets the camera parameters.
    pub fn set_params(&mut self, params: CameraParameters) -> &mut Self {
        self.params = params;
        self.invalidate();
        self
    }

    /// Returns the widget color.
    #[must_use]
    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Sets the widget color.
    pub fn set_color(&mut self, color: Vec3) -> &mut Self {
        self.color = color;
        self
    }

    /// Returns the frustum depth relative to the scene length scale.
    #[must_use]
    pub fn widget_focal_length(&self) -> f32 {
        self.widget_focal_length
    }

    /// Sets the frustum depth relative to the scene length scale.
    pub fn set_widget_focal_length(&mut self, length: f32) -> &mut Self {
        self.widget_focal_length = length.max(0.0);
        self.invalidate();
        self
    }

    fn invalidate(&mut self) {
        self.wireframe.invalidate();
        self.solid.invalidate();
    }

    /// Drops geometry built for a different scene scale and returns the frustum.
    fn frustum_for(&mut self, ctx: &DrawContext) -> Frustum {
        let focal = self.widget_focal_length * ctx.params().length_scale;
        if (focal - self.built_focal).abs() > f32::EPSILON * focal.abs().max(1.0) {
            self.invalidate();
            self.built_focal = focal;
        }
        Frustum::new(&self.params, focal)
    }
}

impl Structure for CameraView {
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
        StructureType::CameraView
    }

    fn bounding_box(&self) -> (Vec3, Vec3) {
        // The frustum size depends on the scene scale, so only the root counts.
        (self.params.position, self.params.position)
    }

    fn length_scale(&self) -> f32 {
        0.0
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn draw(&mut self, ctx: &mut dyn RenderContext) {
        let Some(ctx) = DrawContext::from_context(ctx) else {
            return;
        };
        let frustum = self.frustum_for(ctx);
        let uniforms = DrawUniforms::new(self.color, self.pick_range, 0.0, false);
        self.wireframe.draw(ctx, GeometryKind::Lines, &self.name, &uniforms, || {
            frustum.wireframe()
        });
    }

    fn draw_pick(&mut self, ctx: &mut dyn RenderContext) {
        let Some(ctx) = DrawContext::from_context(ctx) else {
            return;
        };
        let frustum = self.frustum_for(ctx);
        let uniforms = DrawUniforms::new(self.color, self.pick_range, 0.0, false);
        self.solid
            .draw(ctx, GeometryKind::Triangles, &self.name, &uniforms, || frustum.solid());
        self.wireframe.draw(ctx, GeometryKind::Lines, &self.name, &uniforms, || {
            frustum.wireframe()
        });
    }

    fn build_ui(&mut self, ui: &mut dyn Any) {
        let Some(ui) = scenescope_ui::as_egui(ui) else {
            return;
        };
        let mut color = self.color.to_array();
        let mut focal = self.widget_focal_length;
        if scenescope_ui::build_camera_view_ui(ui, &mut color, &mut focal) {
            self.set_color(Vec3::from_array(color));
            self.set_widget_focal_length(focal);
        }
    }

    fn build_pick_ui(&self, ui: &mut dyn Any, _local_index: u64) {
        let Some(ui) = scenescope_ui::as_egui(ui) else {
            return;
        };
        let p = &self.params;
        scenescope_ui::build_element_info(
            ui,
            "Camera",
            &[
                ("Position", scenescope_ui::format_vec3(p.position)),
                ("Look dir", scenescope_ui::format_vec3(p.look_dir)),
                ("Up dir", scenescope_ui::format_vec3(p.up_dir)),
                ("FoV (vert)", format!("{:.1}°", p.fov_vertical_degrees)),
                ("Aspect", format!("{:.3}", p.aspect_ratio)),
            ],
        );
    }

    fn build_shared_ui(&mut self, ui: &mut dyn Any) {
        if let Some(ui) = scenescope_ui::as_egui(ui) {
            ui.weak("Widgets scale with the scene length");
        }
    }

    fn num_pick_elements(&self) -> u64 {
        1
    }

    fn pick_range(&self) -> Option<PickRange> {
        self.pick_range
    }

    fn set_pick_range(&mut self, range: Option<PickRange>) {
        self.pick_range = range;
    }

    fn release_gpu_resources(&mut self) {
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CameraParameters {
        CameraParameters::look_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y, 90.0, 2.0)
    }

    #[test]
    fn test_camera_frame_is_orthonormal() {
        let p = CameraParameters::new(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, -3.0),
            Vec3::new(0.0, 1.0, 0.5),
            60.0,
            1.0,
        );
        let (look, up, right) = p.camera_frame();
        assert!(look.dot(up).abs() < 1e-5);
        assert!(look.dot(right).abs() < 1e-5);
        assert!((up.length() - 1.0).abs() < 1e-5);
        assert!((right - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_frustum_corners() {
        let frustum = Frustum::new(&params(), 1.0);
        assert_eq!(frustum.root, Vec3::new(0.0, 0.0, 5.0));
        // 90 degree vertical fov at depth 1: half height 1, half width 2.
        let ul = frustum.corners[0];
        assert!((ul - Vec3::new(-2.0, 1.0, 4.0)).length() < 1e-5);
        let lr = frustum.corners[2];
        assert!((lr - Vec3::new(2.0, -1.0, 4.0)).length() < 1e-5);
    }

    #[test]
    fn test_frustum_geometry_is_one_element() {
        let frustum = Frustum::new(&params(), 0.5);
        let wire = frustum.wireframe();
        assert_eq!(wire.len(), 22);
        let solid = frustum.solid();
        assert_eq!(solid.len() % 3, 0);
        assert!(wire.iter().chain(&solid).all(|v| v.element == 0));
    }

    #[test]
    fn test_camera_view_extent() {
        let view = CameraView::new("cam", params());
        let root = Vec3::new(0.0, 0.0, 5.0);
        assert_eq!(view.bounding_box(), (root, root));
        assert_eq!(view.length_scale(), 0.0);
        assert_eq!(view.num_pick_elements(), 1);
    }

    #[test]
    fn test_degenerate_directions_fall_back() {
        let p = CameraParameters::new(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, 60.0, 1.0);
        let (look, up, right) = p.camera_frame();
        assert!(look.is_finite() && up.is_finite() && right.is_finite());
    }
}
