//! egui glue for the viewer window: winit input in, wgpu paint jobs out.

use egui_wgpu::{Renderer, RendererOptions, ScreenDescriptor};
use winit::event::WindowEvent;
use winit::window::Window;

/// egui context, winit input state and wgpu renderer for one window.
pub struct EguiIntegration {
    pub context: egui::Context,
    state: egui_winit::State,
    renderer: Renderer,
}

impl EguiIntegration {
    /// Creates the integration for `window`, painting into `target_format`.
    #[must_use]
    pub fn new(device: &wgpu::Device, target_format: wgpu::TextureFormat, window: &Window) -> Self {
        let context = egui::Context::default();
        context.set_visuals(egui::Visuals::light());

        let state = egui_winit::State::new(
            context.clone(),
            context.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let renderer = Renderer::new(device, target_format, RendererOptions::default());

        Self {
            context,
            state,
            renderer,
        }
    }

    /// Feeds a window event to egui. Returns whether egui consumed it.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Returns whether the UI claims the pointer, so the camera and picking
    /// should ignore it.
    #[must_use]
    pub fn wants_pointer_input(&self) -> bool {
        self.context.wants_pointer_input() || self.context.is_pointer_over_area()
    }

    /// Starts a UI pass with the input gathered since the last one.
    pub fn begin_frame(&mut self, window: &Window) {
        let input = self.state.take_egui_input(window);
        self.context.begin_pass(input);
    }

    /// Finishes the UI pass and applies cursor and clipboard changes.
    pub fn end_frame(&mut self, window: &Window) -> egui::FullOutput {
        let mut output = self.context.end_pass();
        let platform_output = std::mem::take(&mut output.platform_output);
        self.state.handle_platform_output(window, platform_output);
        output
    }

    /// Paints `output` over the contents of `view`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        size_in_pixels: [u32; 2],
        output: egui::FullOutput,
    ) {
        let screen = ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: output.pixels_per_point,
        };
        let jobs = self.context.tessellate(output.shapes, output.pixels_per_point);

        self.upload_textures(device, queue, &output.textures_delta);
        self.renderer
            .update_buffers(device, queue, encoder, &jobs, &screen);

        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("UI Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            ..Default::default()
        });
        // egui-wgpu takes a pass without the encoder lifetime.
        let mut pass = pass.forget_lifetime();
        self.renderer.render(&mut pass, &jobs, &screen);
        drop(pass);

        for id in &output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }

    fn upload_textures(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        delta: &egui::TexturesDelta,
    ) {
        for (id, image) in &delta.set {
            self.renderer.update_texture(device, queue, *id, image);
        }
    }
}
