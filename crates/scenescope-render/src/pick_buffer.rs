//! Off-screen pick buffer: allocation, pick pass and single-pixel readback.

use crate::error::{RenderError, RenderResult};
use crate::pipelines::{DEPTH_FORMAT, PICK_FORMAT};

/// Bytes per pixel of [`PICK_FORMAT`].
const PICK_PIXEL_BYTES: u64 = 16;

struct PickTargets {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

/// Color + depth attachments the pick pass renders into.
///
/// Allocated lazily and reallocated whenever the requested size changes.
pub struct PickBuffer {
    targets: Option<PickTargets>,
    staging: wgpu::Buffer,
    size: Option<(u32, u32)>,
}

impl PickBuffer {
    /// Creates an unallocated pick buffer.
    pub fn new(device: &wgpu::Device) -> Self {
        // Single pixel readback; copies must use 256-byte aligned rows.
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick Staging Buffer"),
            size: u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self {
            targets: None,
            staging,
            size: None,
        }
    }

    /// Returns the allocated size, or `None` before the first allocation.
    #[must_use]
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    /// Allocates (or reallocates) the attachments for the given size.
    ///
    /// Does nothing if already allocated at that size. Zero dimensions are
    /// clamped to 1.
    pub fn ensure_allocated(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.size == Some((width, height)) && self.targets.is_some() {
            return;
        }

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Pick Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PICK_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Pick Depth Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("allocated {width}x{height} pick buffer");
        self.targets = Some(PickTargets {
            color,
            color_view,
            depth_view,
        });
        self.size = Some((width, height));
    }

    /// Begins the pick pass: clears color to `(0,0,0,0)` and depth to 1.0.
    pub fn begin_pass<'a>(
        &'a self,
        encoder: &'a mut wgpu::CommandEncoder,
    ) -> RenderResult<wgpu::RenderPass<'a>> {
        let targets = self
            .targets
            .as_ref()
            .ok_or(RenderError::PickBufferNotAllocated)?;

        Ok(encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Pick Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &targets.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT), // index 0
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        }))
    }

    /// Reads back one pixel, unmodified.
    ///
    /// `(x, y)` is in device pixels from the top-left corner, which is also
    /// the texture origin. Blocks until the GPU has finished.
    pub fn read_pixel(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        x: u32,
        y: u32,
    ) -> RenderResult<[f32; 4]> {
        let targets = self
            .targets
            .as_ref()
            .ok_or(RenderError::PickBufferNotAllocated)?;
        let (width, height) = self.size.ok_or(RenderError::PickBufferNotAllocated)?;
        if x >= width || y >= height {
            return Err(RenderError::PickOutOfBounds {
                x,
                y,
                width,
                height,
            });
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Pick Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &targets.color,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = self.staging.slice(..PICK_PIXEL_BYTES);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|_| RenderError::Timeout)?;
        rx.recv()
            .map_err(|e| RenderError::BufferMapFailed(e.to_string()))?
            .map_err(|e| RenderError::BufferMapFailed(e.to_string()))?;

        let pixel = {
            let data = slice.get_mapped_range();
            bytemuck::pod_read_unaligned::<[f32; 4]>(&data[..16])
        };
        self.staging.unmap();
        Ok(pixel)
    }
}
