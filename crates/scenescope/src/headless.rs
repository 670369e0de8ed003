//! Off-screen rendering and picking without a window.
//!
//! Useful for integration tests, batch screenshots and pick queries issued
//! from code.

use pollster::FutureExt;
use scenescope_core::{Context, Result, Selection};
use scenescope_render::{Camera, RenderEngine};

use crate::picking;

/// A render engine drawing into off-screen targets.
pub struct HeadlessRenderer {
    engine: RenderEngine,
}

impl HeadlessRenderer {
    /// Creates a headless GPU context of `width` x `height` pixels with the
    /// camera framed on the scene.
    ///
    /// Structures drop GPU buffers built for any other device.
    pub fn new(ctx: &mut Context, width: u32, height: u32) -> Result<Self> {
        let engine = RenderEngine::new_headless(width, height).block_on()?;
        for structure in ctx.structures_mut() {
            structure.release_gpu_resources();
        }
        let mut renderer = Self { engine };
        renderer.resize(width, height);
        renderer.frame_scene(ctx);
        Ok(renderer)
    }

    /// Resizes the viewport. The pick buffer follows on the next query.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.engine.resize(width, height);
    }

    /// Returns the viewport dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        self.engine.dimensions()
    }

    /// Returns the current pick buffer size, if one has been allocated.
    pub fn pick_buffer_size(&self) -> Option<(u32, u32)> {
        self.engine.pick_buffer_size()
    }

    /// Points the camera at the scene extent.
    pub fn frame_scene(&mut self, ctx: &Context) {
        let extent = ctx.extent();
        let (min, max) = extent.bounding_box;
        self.engine.camera.look_at_box(min, max, extent.length_scale);
    }

    pub fn camera(&self) -> &Camera {
        &self.engine.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.engine.camera
    }

    /// Renders one frame of the scene, without UI.
    pub fn render(&mut self, ctx: &mut Context) -> Result<image::RgbaImage> {
        self.engine.begin_frame();
        let params = picking::frame_params(ctx);
        Ok(self.engine.render_to_image(ctx.structures_mut(), params)?)
    }

    /// Runs a pick query at device pixel `(x, y)`.
    pub fn pick(
        &mut self,
        ctx: &mut Context,
        x: u32,
        y: u32,
        is_double_click: bool,
    ) -> Result<Option<Selection>> {
        self.engine.begin_frame();
        picking::query(&mut self.engine, ctx, x, y, is_double_click)
    }
}
