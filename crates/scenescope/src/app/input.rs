use std::sync::Arc;
use std::time::Instant;

use pollster::FutureExt;
use scenescope_core::ScenescopeError;
use scenescope_render::{Camera, RenderEngine};
use scenescope_ui::EguiIntegration;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use super::App;
use crate::interaction::{PointerAction, PointerButton};
use crate::picking;

/// Scroll pixels per zoom step.
const PIXELS_PER_SCROLL_LINE: f64 = 50.0;

impl App<'_> {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ScenescopeError) {
        log::error!("{}{err}", self.ctx.options.print_prefix);
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn apply_pointer_action(&mut self, action: PointerAction) {
        let Some(engine) = &mut self.engine else {
            return;
        };
        match action {
            PointerAction::None => {}
            PointerAction::Orbit(delta) => engine.camera.orbit(delta.x, delta.y),
            PointerAction::Pan(delta) => engine.camera.pan(delta.x, delta.y),
            PointerAction::Click {
                x,
                y,
                is_double_click,
            } => match picking::query(engine, self.ctx, x, y, is_double_click) {
                Ok(Some(selection)) => log::debug!(
                    "selected {} '{}' element {}",
                    selection.structure_type,
                    selection.structure_name,
                    selection.local_index
                ),
                Ok(None) => log::debug!("selection cleared"),
                Err(err) => log::error!(
                    "{}pick query at ({x}, {y}) failed: {err}",
                    self.ctx.options.print_prefix
                ),
            },
        }
    }
}

impl ApplicationHandler for App<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.ctx.options.program_name.clone())
            .with_inner_size(LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                let err = ScenescopeError::GpuResource(format!("failed to create window: {err}"));
                self.fail(event_loop, err);
                return;
            }
        };

        let mut engine = match RenderEngine::new_windowed(window.clone()).block_on() {
            Ok(engine) => engine,
            Err(err) => {
                self.fail(event_loop, err.into());
                return;
            }
        };
        if self.ctx.options.logs_info() {
            log::info!("using adapter {}", engine.adapter_description());
        }
        if let Some(camera) = self.initial_camera.take() {
            engine.camera = Camera {
                aspect_ratio: engine.camera.aspect_ratio,
                ..camera
            };
        }

        // Buffers from an earlier device are useless on this one.
        for structure in self.ctx.structures_mut() {
            structure.release_gpu_resources();
        }

        let egui = EguiIntegration::new(&engine.device, engine.surface_format(), &window);

        window.request_redraw();
        self.window = Some(window);
        self.engine = Some(engine);
        self.egui = Some(egui);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };
        let ui_claims = match &mut self.egui {
            Some(egui) => {
                egui.handle_event(&window, &event);
                egui.wants_pointer_input()
            }
            None => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                self.release_gpu();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(engine) = &mut self.engine {
                    engine.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
                window.request_redraw();
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.pointer.set_shift(modifiers.state().shift_key());
            }
            WindowEvent::CursorMoved { position, .. } => {
                let size = window.inner_size();
                let action = self.pointer.moved(
                    (position.x, position.y),
                    (size.width, size.height),
                    ui_claims,
                );
                self.apply_pointer_action(action);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Left,
                    MouseButton::Right => PointerButton::Right,
                    _ => return,
                };
                let pressed = state == ElementState::Pressed;
                let action = self.pointer.button(button, pressed, ui_claims, Instant::now());
                self.apply_pointer_action(action);
            }
            WindowEvent::MouseWheel { delta, .. } if !ui_claims => {
                #[allow(clippy::cast_possible_truncation)]
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_SCROLL_LINE) as f32,
                };
                if let Some(engine) = &mut self.engine {
                    engine.camera.zoom(amount);
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.release_gpu();
    }
}
