//! The main rendering engine.

use std::sync::Arc;

use scenescope_core::Structure;
use wgpu::util::DeviceExt;

use crate::camera::Camera;
use crate::draw::{DrawContext, FrameParams};
use crate::error::{RenderError, RenderResult};
use crate::geometry::CameraUniforms;
use crate::pick_buffer::PickBuffer;
use crate::pipelines::{is_pick_renderable, DrawTarget, Pipelines, DEPTH_FORMAT, PICK_FORMAT};
use crate::screenshot::image_from_pixels;

/// Format of off-screen color targets (headless frames and screenshots).
const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// The main rendering engine backed by wgpu.
pub struct RenderEngine {
    /// The wgpu instance.
    pub instance: wgpu::Instance,
    /// The wgpu adapter.
    pub adapter: wgpu::Adapter,
    /// The wgpu device.
    pub device: wgpu::Device,
    /// The wgpu queue.
    pub queue: wgpu::Queue,
    /// The render surface (None for headless).
    pub surface: Option<wgpu::Surface<'static>>,
    /// Surface configuration.
    pub surface_config: wgpu::SurfaceConfiguration,
    /// Main camera.
    pub camera: Camera,
    /// Current viewport width.
    pub width: u32,
    /// Current viewport height.
    pub height: u32,
    depth_view: wgpu::TextureView,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    pipelines: Pipelines,
    pick: PickBuffer,
    frame: u64,
}

impl RenderEngine {
    /// Creates a new windowed render engine.
    pub async fn new_windowed(window: Arc<winit::window::Window>) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });

        let surface = instance.create_surface(window.clone())?;
        let (adapter, device, queue) = Self::request_device(&instance, Some(&surface)).await?;

        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::AdapterCreationFailed)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        Self::assemble(
            instance,
            adapter,
            device,
            queue,
            Some(surface),
            surface_config,
        )
    }

    /// Creates a new headless render engine.
    pub async fn new_headless(width: u32, height: u32) -> RenderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..wgpu::InstanceDescriptor::default()
        });
        let (adapter, device, queue) = Self::request_device(&instance, None).await?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format: OFFSCREEN_FORMAT,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        Self::assemble(instance, adapter, device, queue, None, surface_config)
    }

    async fn request_device(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'static>>,
    ) -> RenderResult<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| RenderError::AdapterCreationFailed)?;

        let info = adapter.get_info();
        log::debug!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("scenescope device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        Ok((adapter, device, queue))
    }

    #[allow(clippy::cast_precision_loss)]
    fn assemble(
        instance: wgpu::Instance,
        adapter: wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: Option<wgpu::Surface<'static>>,
        surface_config: wgpu::SurfaceConfiguration,
    ) -> RenderResult<Self> {
        let (width, height) = (surface_config.width, surface_config.height);
        let pick_renderable = is_pick_renderable(&adapter.get_texture_format_features(PICK_FORMAT));
        if !pick_renderable {
            log::warn!(
                "adapter '{}' cannot render {PICK_FORMAT:?}; picking is disabled",
                adapter.get_info().name
            );
        }

        push_scopes(&device);
        let depth_view = Self::create_depth_view(&device, width, height);
        let pipelines = Pipelines::new(&device, surface_config.format, pick_renderable);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera uniforms"),
            contents: bytemuck::cast_slice(&[CameraUniforms::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: pipelines.camera_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });
        let pick = PickBuffer::new(&device);
        pop_scopes(&device, 0, "engine setup")?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            surface,
            surface_config,
            camera: Camera::new(width as f32 / height as f32),
            width,
            height,
            depth_view,
            camera_buffer,
            camera_bind_group,
            pipelines,
            pick,
            frame: 0,
        })
    }

    /// Returns the name and backend of the adapter in use.
    #[must_use]
    pub fn adapter_description(&self) -> String {
        let info = self.adapter.get_info();
        format!("{} ({:?})", info.name, info.backend)
    }

    /// Resizes the render target.
    ///
    /// The pick buffer follows on the next pick query.
    #[allow(clippy::cast_precision_loss)]
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.width = width;
        self.height = height;
        self.surface_config.width = width;
        self.surface_config.height = height;

        if let Some(ref surface) = self.surface {
            surface.configure(&self.device, &self.surface_config);
        }

        self.depth_view = Self::create_depth_view(&self.device, width, height);
        self.camera.set_aspect_ratio(width as f32 / height as f32);
    }

    fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Updates camera uniforms.
    pub fn update_camera_uniforms(&self) {
        let uniforms = CameraUniforms {
            view_proj: self.camera.view_projection_matrix().to_cols_array_2d(),
            right: self.camera.right().extend(0.0).to_array(),
            up: self.camera.screen_up().extend(0.0).to_array(),
        };
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Returns the viewport dimensions.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the color format of the display target.
    #[must_use]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Returns the number of frames started so far.
    #[must_use]
    pub fn frame_number(&self) -> u64 {
        self.frame
    }

    /// Marks the start of a new frame.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
    }

    /// Opens an error scope; GPU errors until the matching
    /// [`RenderEngine::pop_error_scope`] are reported there.
    pub fn push_error_scope(&self) {
        push_scopes(&self.device);
    }

    /// Closes the error scope and reports the first captured error.
    pub fn pop_error_scope(&self, pass: &'static str) -> RenderResult<()> {
        pop_scopes(&self.device, self.frame, pass)
    }

    /// Acquires the next surface texture.
    ///
    /// A lost or outdated surface is reconfigured before the error is returned,
    /// so the next frame can succeed.
    pub fn acquire_frame(&mut self) -> RenderResult<wgpu::SurfaceTexture> {
        let surface = self.surface.as_ref().ok_or(RenderError::SurfaceLost)?;
        match surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(err) => {
                if matches!(err, wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) {
                    surface.configure(&self.device, &self.surface_config);
                }
                Err(err.into())
            }
        }
    }

    fn draw_context(
        &self,
        pass: wgpu::RenderPass<'static>,
        target: DrawTarget,
        params: FrameParams,
    ) -> DrawContext {
        DrawContext::new(
            self.device.clone(),
            self.queue.clone(),
            self.pipelines.clone(),
            self.camera_bind_group.clone(),
            pass,
            target,
            params,
        )
    }

    /// Records the scene pass into `view`.
    ///
    /// Clears to the background color; every enabled structure draws itself,
    /// or its pick encoding when `params.debug_pick` is set.
    pub fn encode_scene<'s>(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        structures: impl Iterator<Item = &'s mut dyn Structure>,
        params: FrameParams,
    ) {
        self.update_camera_uniforms();
        let bg = params.background;
        let pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(bg.x),
                            g: f64::from(bg.y),
                            b: f64::from(bg.z),
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            })
            .forget_lifetime();

        let target = if params.debug_pick {
            DrawTarget::DebugPick
        } else {
            DrawTarget::Scene
        };
        let mut ctx = self.draw_context(pass, target, params);
        for structure in structures {
            if !structure.is_enabled() {
                continue;
            }
            if params.debug_pick {
                structure.draw_pick(&mut ctx);
            } else {
                structure.draw(&mut ctx);
            }
        }
    }

    /// Renders every enabled structure's pick encoding into the pick buffer
    /// and waits for the GPU to finish.
    ///
    /// The pick buffer is (re)allocated to the current viewport size first.
    pub fn render_pick_pass<'s>(
        &mut self,
        structures: impl Iterator<Item = &'s mut dyn Structure>,
        params: FrameParams,
    ) -> RenderResult<()> {
        if !self.pipelines.supports_pick() {
            return Err(RenderError::PickUnsupported(PICK_FORMAT));
        }

        self.push_error_scope();
        self.pick
            .ensure_allocated(&self.device, self.width, self.height);
        self.update_camera_uniforms();
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pick Pass Encoder"),
            });
        match self.pick.begin_pass(&mut encoder) {
            Ok(pass) => {
                let mut ctx = self.draw_context(pass.forget_lifetime(), DrawTarget::Pick, params);
                for structure in structures {
                    if structure.is_enabled() {
                        structure.draw_pick(&mut ctx);
                    }
                }
            }
            Err(err) => {
                let _ = self.pop_error_scope("pick pass");
                return Err(err);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.pop_error_scope("pick pass")?;

        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|_| RenderError::Timeout)?;
        Ok(())
    }

    /// Reads one raw pick-buffer pixel at device coordinates `(x, y)`.
    pub fn read_pick_pixel(&self, x: u32, y: u32) -> RenderResult<[f32; 4]> {
        self.pick.read_pixel(&self.device, &self.queue, x, y)
    }

    /// Returns the allocated pick buffer size.
    #[must_use]
    pub fn pick_buffer_size(&self) -> Option<(u32, u32)> {
        self.pick.size()
    }

    /// Renders the scene without UI into an off-screen target and reads it back.
    pub fn render_to_image<'s>(
        &mut self,
        structures: impl Iterator<Item = &'s mut dyn Structure>,
        params: FrameParams,
    ) -> RenderResult<image::RgbaImage> {
        let (width, height) = (self.width, self.height);
        let format = self.surface_config.format;
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("screenshot texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let unpadded = width * 4;
        let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("screenshot buffer"),
            size: u64::from(padded) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        self.push_error_scope();
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Screenshot Encoder"),
            });
        self.encode_scene(&mut encoder, &view, structures, params);
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));
        self.pop_error_scope("screenshot")?;

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|_| RenderError::Timeout)?;
        rx.recv()
            .map_err(|e| RenderError::BufferMapFailed(e.to_string()))?
            .map_err(|e| RenderError::BufferMapFailed(e.to_string()))?;

        let mut pixels = Vec::with_capacity((unpadded * height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in data.chunks(padded as usize) {
                pixels.extend_from_slice(&row[..unpadded as usize]);
            }
        }
        buffer.unmap();

        let bgra = matches!(
            format,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb
        );
        Ok(image_from_pixels(pixels, width, height, bgra)?)
    }
}

fn push_scopes(device: &wgpu::Device) {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
}

fn pop_scopes(device: &wgpu::Device, frame: u64, pass: &'static str) -> RenderResult<()> {
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    match validation.or(out_of_memory) {
        None => Ok(()),
        Some(err) => {
            let err = RenderError::Gpu {
                frame,
                pass,
                message: err.to_string(),
            };
            log::error!("{err}");
            Err(err)
        }
    }
}
