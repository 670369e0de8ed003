//! Render context handed to structures while a pass is open.

use std::any::Any;

use scenescope_core::RenderContext;

use crate::geometry::{GeometryKind, GpuGeometry};
use crate::pipelines::{DrawTarget, Pipelines};

/// Per-frame values structures need to size and color themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    /// Background clear color.
    pub background: glam::Vec3,
    /// Scene length scale.
    pub length_scale: f32,
    /// Default point radius, relative to the length scale.
    pub point_radius: f32,
    /// Draw pick colors into the display target.
    pub debug_pick: bool,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            background: glam::Vec3::ONE,
            length_scale: 1.0,
            point_radius: 0.005,
            debug_pick: false,
        }
    }
}

/// The concrete [`RenderContext`] of the wgpu backend.
///
/// Structures downcast to this through [`RenderContext::as_any_mut`], build
/// their [`GpuGeometry`] lazily with [`DrawContext::device`] and issue draws
/// with [`DrawContext::draw`].
pub struct DrawContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipelines: Pipelines,
    camera_bind_group: wgpu::BindGroup,
    pass: wgpu::RenderPass<'static>,
    target: DrawTarget,
    params: FrameParams,
}

impl DrawContext {
    pub(crate) fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        pipelines: Pipelines,
        camera_bind_group: wgpu::BindGroup,
        pass: wgpu::RenderPass<'static>,
        target: DrawTarget,
        params: FrameParams,
    ) -> Self {
        Self {
            device,
            queue,
            pipelines,
            camera_bind_group,
            pass,
            target,
            params,
        }
    }

    /// Downcasts a generic render context.
    pub fn from_context(ctx: &mut dyn RenderContext) -> Option<&mut DrawContext> {
        ctx.as_any_mut().downcast_mut::<DrawContext>()
    }

    /// The device geometry is created on.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The queue uniform writes go to.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Layout for [`GpuGeometry::new`].
    pub fn draw_layout(&self) -> &wgpu::BindGroupLayout {
        self.pipelines.draw_layout()
    }

    /// The target of the open pass.
    pub fn target(&self) -> DrawTarget {
        self.target
    }

    /// Per-frame parameters.
    pub fn params(&self) -> &FrameParams {
        &self.params
    }

    /// Issues one draw of the geometry with its current uniforms.
    pub fn draw(&mut self, geometry: &GpuGeometry) {
        if geometry.vertex_count() == 0 {
            return;
        }
        let Some(set) = self.pipelines.set(self.target) else {
            return;
        };
        let pipeline = set.get(geometry.kind());
        self.pass.set_pipeline(pipeline);
        self.pass.set_bind_group(0, &self.camera_bind_group, &[]);
        self.pass.set_bind_group(1, geometry.bind_group(), &[]);
        self.pass.set_vertex_buffer(0, geometry.vertex_buffer().slice(..));
        match geometry.kind() {
            GeometryKind::Sprites => self.pass.draw(0..6, 0..geometry.vertex_count()),
            GeometryKind::Triangles | GeometryKind::Lines => {
                self.pass.draw(0..geometry.vertex_count(), 0..1);
            }
        }
    }
}

impl RenderContext for DrawContext {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
