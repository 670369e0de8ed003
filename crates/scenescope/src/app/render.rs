use std::time::Instant;

use scenescope_render::{save_image, FrameParams, RenderError};
use winit::event_loop::ActiveEventLoop;

use super::App;
use crate::picking;

impl App<'_> {
    /// Renders a single frame: scene pass, then UI on top, then present.
    pub(super) fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if let Some(last) = self.last_frame {
            self.frame_time_ms = now.duration_since(last).as_secs_f32() * 1000.0;
        }
        self.last_frame = Some(now);

        // Frame the scene on the first frame that has something to show.
        if !self.camera_fitted && self.ctx.num_structures() > 0 {
            self.reset_view();
            self.camera_fitted = true;
        }
        self.pointer
            .set_click_drag_threshold(self.ctx.options.click_drag_threshold);

        let (Some(window), Some(engine), Some(egui)) =
            (self.window.as_ref(), self.engine.as_mut(), self.egui.as_mut())
        else {
            return;
        };

        engine.begin_frame();
        let frame = match engine.acquire_frame() {
            Ok(frame) => frame,
            Err(RenderError::SurfaceLost | RenderError::SurfaceOutdated | RenderError::Timeout) => {
                // Reconfigured or transient; try again next frame.
                return;
            }
            Err(err) => {
                log::error!("{}{err}", self.ctx.options.print_prefix);
                self.fatal = Some(err.into());
                event_loop.exit();
                return;
            }
        };

        egui.begin_frame(window);
        let actions = scenescope_ui::build_left_panel(&egui.context, self.ctx, self.frame_time_ms);
        if let Some(callback) = self.user_callback.as_deref_mut() {
            scenescope_ui::build_user_window(&egui.context, "Controls", |ui| callback(ui));
        }
        scenescope_ui::build_selection_panel(&egui.context, self.ctx);
        let output = egui.end_frame(window);

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let params = picking::frame_params(self.ctx);

        engine.push_error_scope();
        let mut encoder = engine
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        engine.encode_scene(&mut encoder, &view, self.ctx.structures_mut(), params);
        egui.render(
            &engine.device,
            &engine.queue,
            &mut encoder,
            &view,
            [engine.width, engine.height],
            output,
        );
        engine.queue.submit(std::iter::once(encoder.finish()));
        // Logged by the engine; a failed frame never stops the loop.
        let _ = engine.pop_error_scope("frame");

        window.pre_present_notify();
        frame.present();

        if actions.reset_view {
            self.reset_view();
        }
        if actions.screenshot {
            self.take_screenshot();
        }
    }

    /// Renders the scene without UI and writes the next numbered screenshot.
    fn take_screenshot(&mut self) {
        let Some(engine) = &mut self.engine else {
            return;
        };
        let path = self.screenshots.next_path();
        let params = FrameParams {
            debug_pick: false,
            ..picking::frame_params(self.ctx)
        };
        let result = engine
            .render_to_image(self.ctx.structures_mut(), params)
            .and_then(|image| save_image(&path, &image).map_err(RenderError::from));
        match result {
            Ok(()) if self.ctx.options.logs_info() => {
                log::info!("saved screenshot to {}", path.display());
            }
            Ok(()) => {}
            Err(err) => log::error!("{}screenshot failed: {err}", self.ctx.options.print_prefix),
        }
    }
}
