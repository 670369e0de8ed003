//! Application window and event loop management.

mod input;
mod render;

use std::sync::Arc;
use std::time::Instant;

use scenescope_core::{Context, ScenescopeError};
use scenescope_render::{Camera, RenderEngine, ScreenshotCounter};
use scenescope_ui::EguiIntegration;
use winit::window::Window;

use crate::interaction::PointerTracker;

/// The user callback drawn in its own window every frame.
pub(crate) type UserCallback<'a> = &'a mut (dyn FnMut(&mut egui::Ui) + 'static);

/// The windowed viewer, borrowing the session state while it runs.
pub(crate) struct App<'a> {
    ctx: &'a mut Context,
    user_callback: Option<UserCallback<'a>>,
    screenshots: &'a mut ScreenshotCounter,
    window: Option<Arc<Window>>,
    engine: Option<RenderEngine>,
    egui: Option<EguiIntegration>,
    pointer: PointerTracker,
    /// Camera to start from, typically the one of a previous `show`.
    initial_camera: Option<Camera>,
    camera_fitted: bool,
    last_frame: Option<Instant>,
    frame_time_ms: f32,
    /// Camera at the time the window closed.
    final_camera: Option<Camera>,
    /// Error that stopped the event loop.
    fatal: Option<ScenescopeError>,
}

impl<'a> App<'a> {
    pub(crate) fn new(
        ctx: &'a mut Context,
        user_callback: Option<UserCallback<'a>>,
        screenshots: &'a mut ScreenshotCounter,
        initial_camera: Option<Camera>,
    ) -> Self {
        let pointer = PointerTracker::new(ctx.options.click_drag_threshold);
        Self {
            ctx,
            user_callback,
            screenshots,
            window: None,
            engine: None,
            egui: None,
            pointer,
            camera_fitted: initial_camera.is_some(),
            initial_camera,
            last_frame: None,
            frame_time_ms: 0.0,
            final_camera: None,
            fatal: None,
        }
    }

    /// Consumes the app, returning the last camera and any fatal error.
    pub(crate) fn finish(self) -> (Option<Camera>, Option<ScenescopeError>) {
        let camera = self
            .final_camera
            .or_else(|| self.engine.map(|engine| engine.camera));
        (camera, self.fatal)
    }

    /// Points the camera at the scene extent.
    fn reset_view(&mut self) {
        if let Some(engine) = &mut self.engine {
            let extent = self.ctx.extent();
            let (min, max) = extent.bounding_box;
            engine.camera.look_at_box(min, max, extent.length_scale);
        }
    }

    /// Drops GPU state. Structures rebuild their buffers on the next device.
    fn release_gpu(&mut self) {
        if let Some(engine) = self.engine.take() {
            self.final_camera = Some(engine.camera);
        }
        self.egui = None;
        self.window = None;
        for structure in self.ctx.structures_mut() {
            structure.release_gpu_resources();
        }
    }
}
