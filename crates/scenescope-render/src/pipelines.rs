//! Render pipelines for the scene, pick and debug-pick targets.

use crate::geometry::{CameraUniforms, DrawUniforms, GeometryKind, Vertex};

/// Color format of the pick buffer.
pub const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Depth format shared by every pass.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Which target a draw goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawTarget {
    /// Normal shaded scene.
    Scene,
    /// Pick encoding into the pick buffer.
    Pick,
    /// Pick encoding into the display surface.
    DebugPick,
}

/// One pipeline per geometry kind.
#[derive(Clone)]
pub struct PipelineSet {
    triangles: wgpu::RenderPipeline,
    lines: wgpu::RenderPipeline,
    sprites: wgpu::RenderPipeline,
}

impl PipelineSet {
    /// Returns the pipeline for a geometry kind.
    pub fn get(&self, kind: GeometryKind) -> &wgpu::RenderPipeline {
        match kind {
            GeometryKind::Triangles => &self.triangles,
            GeometryKind::Lines => &self.lines,
            GeometryKind::Sprites => &self.sprites,
        }
    }
}

/// All pipelines plus the bind group layouts they share.
#[derive(Clone)]
pub struct Pipelines {
    camera_layout: wgpu::BindGroupLayout,
    draw_layout: wgpu::BindGroupLayout,
    scene: PipelineSet,
    /// `None` when the adapter cannot render into [`PICK_FORMAT`].
    pick: Option<PipelineSet>,
    debug_pick: PipelineSet,
}

/// Returns whether a format with these features can back the pick buffer.
pub fn is_pick_renderable(features: &wgpu::TextureFormatFeatures) -> bool {
    features.allowed_usages.contains(
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
    )
}

fn uniform_layout(device: &wgpu::Device, label: &str, size: usize) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(size as u64),
            },
            count: None,
        }],
    })
}

impl Pipelines {
    /// Compiles the shaders and builds every pipeline.
    ///
    /// The pick pipelines are skipped unless `pick_renderable`; see
    /// [`is_pick_renderable`].
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        pick_renderable: bool,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let camera_layout = uniform_layout(
            device,
            "Camera Bind Group Layout",
            std::mem::size_of::<CameraUniforms>(),
        );
        let draw_layout = uniform_layout(
            device,
            "Draw Bind Group Layout",
            std::mem::size_of::<DrawUniforms>(),
        );

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &draw_layout],
            push_constant_ranges: &[],
        });

        let build_set = |format: wgpu::TextureFormat, pick: bool, label: &str| {
            let build =
                |kind| build_pipeline(device, &layout, &shader, label, format, kind, pick);
            PipelineSet {
                triangles: build(GeometryKind::Triangles),
                lines: build(GeometryKind::Lines),
                sprites: build(GeometryKind::Sprites),
            }
        };

        Self {
            scene: build_set(surface_format, false, "Scene Pipeline"),
            pick: pick_renderable.then(|| build_set(PICK_FORMAT, true, "Pick Pipeline")),
            debug_pick: build_set(surface_format, true, "Debug Pick Pipeline"),
            camera_layout,
            draw_layout,
        }
    }

    /// Returns the pipelines for a target, if it is supported.
    pub fn set(&self, target: DrawTarget) -> Option<&PipelineSet> {
        match target {
            DrawTarget::Scene => Some(&self.scene),
            DrawTarget::Pick => self.pick.as_ref(),
            DrawTarget::DebugPick => Some(&self.debug_pick),
        }
    }

    /// Returns whether the pick pass can run.
    pub fn supports_pick(&self) -> bool {
        self.pick.is_some()
    }

    /// Layout of the camera bind group (group 0).
    pub fn camera_layout(&self) -> &wgpu::BindGroupLayout {
        &self.camera_layout
    }

    /// Layout of the per-draw bind group (group 1).
    pub fn draw_layout(&self) -> &wgpu::BindGroupLayout {
        &self.draw_layout
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    label: &str,
    format: wgpu::TextureFormat,
    kind: GeometryKind,
    pick: bool,
) -> wgpu::RenderPipeline {
    let (vs_entry, step_mode, topology) = match kind {
        GeometryKind::Triangles => (
            "vs_mesh",
            wgpu::VertexStepMode::Vertex,
            wgpu::PrimitiveTopology::TriangleList,
        ),
        GeometryKind::Lines => (
            "vs_mesh",
            wgpu::VertexStepMode::Vertex,
            wgpu::PrimitiveTopology::LineList,
        ),
        GeometryKind::Sprites => (
            "vs_sprite",
            wgpu::VertexStepMode::Instance,
            wgpu::PrimitiveTopology::TriangleList,
        ),
    };
    let fs_entry = match (pick, kind == GeometryKind::Sprites) {
        (false, false) => "fs_color",
        (false, true) => "fs_sprite_color",
        (true, false) => "fs_pick",
        (true, true) => "fs_sprite_pick",
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(vs_entry),
            buffers: &[Vertex::layout(step_mode)],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None, // pick values must be written unmodified
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            cull_mode: None,
            ..wgpu::PrimitiveState::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(allowed_usages: wgpu::TextureUsages) -> wgpu::TextureFormatFeatures {
        wgpu::TextureFormatFeatures {
            allowed_usages,
            flags: wgpu::TextureFormatFeatureFlags::empty(),
        }
    }

    #[test]
    fn test_pick_format_needs_render_and_copy() {
        // What a GL adapter without float render targets reports for Rgba32Float.
        let sample_only = features(
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_SRC,
        );
        assert!(!is_pick_renderable(&sample_only));

        let no_copy = features(wgpu::TextureUsages::RENDER_ATTACHMENT);
        assert!(!is_pick_renderable(&no_copy));

        let full = features(
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        assert!(is_pick_renderable(&full));
    }
}
