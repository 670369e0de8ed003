//! Lazy GPU geometry shared by the structures.

use glam::Vec3;
use scenescope_render::{DrawContext, DrawUniforms, GeometryKind, GpuGeometry, Vertex};

/// A lazily uploaded vertex list.
///
/// Built on first draw from the vertices the owning structure supplies and
/// dropped by [`LazyGeometry::invalidate`] whenever those vertices change.
#[derive(Default)]
pub(crate) struct LazyGeometry {
    geometry: Option<GpuGeometry>,
}

impl LazyGeometry {
    /// Uploads the vertices if needed, writes the uniforms and draws.
    pub(crate) fn draw(
        &mut self,
        ctx: &mut DrawContext,
        kind: GeometryKind,
        label: &str,
        uniforms: &DrawUniforms,
        build: impl FnOnce() -> Vec<Vertex>,
    ) {
        let geometry = self.geometry.get_or_insert_with(|| {
            let vertices = build();
            log::debug!("uploading {} vertices for '{label}'", vertices.len());
            GpuGeometry::new(ctx.device(), ctx.draw_layout(), kind, &vertices, label)
        });
        geometry.set_uniforms(ctx.queue(), uniforms);
        ctx.draw(geometry);
    }

    pub(crate) fn invalidate(&mut self) {
        self.geometry = None;
    }

    pub(crate) fn is_built(&self) -> bool {
        self.geometry.is_some()
    }
}

/// Two vertices of one line segment.
pub(crate) fn segment(a: Vec3, b: Vec3, color: Vec3, element: u32) -> [Vertex; 2] {
    [Vertex::new(a, color, element), Vertex::new(b, color, element)]
}

/// Lambert-style shade of `color` for a face normal, lit from the viewer's
/// default direction.
pub(crate) fn shade(color: Vec3, normal: Vec3) -> Vec3 {
    let light = Vec3::new(0.3, 0.5, 0.8).normalize();
    let intensity = 0.35 + 0.65 * normal.dot(light).abs();
    color * intensity
}
