//! GPU-side geometry and per-draw uniforms.

use glam::Vec3;
use scenescope_core::PickRange;
use wgpu::util::DeviceExt;

/// Camera uniforms for GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Screen-space right, used to expand sprites.
    pub right: [f32; 4],
    /// Screen-space up, used to expand sprites.
    pub up: [f32; 4],
}

impl Default for CameraUniforms {
    fn default() -> Self {
        Self {
            view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            right: [1.0, 0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0, 0.0],
        }
    }
}

/// One vertex (or, for sprites, one instance).
///
/// `element` is the structure-local pick element the vertex belongs to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub element: u32,
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Uint32];

    /// Creates a vertex.
    #[must_use]
    pub fn new(position: Vec3, color: Vec3, element: u32) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
            element,
        }
    }

    pub(crate) fn layout(step_mode: wgpu::VertexStepMode) -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// How a vertex list is rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// Every three vertices form a triangle.
    Triangles,
    /// Every two vertices form a line segment.
    Lines,
    /// Every vertex is the center of a camera-facing disc.
    Sprites,
}

/// Per-draw uniforms.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[allow(clippy::pub_underscore_fields)]
pub struct DrawUniforms {
    pub base_color: [f32; 4],
    /// First global pick index of the structure, as 22-bit limbs.
    pub pick_base: [u32; 4],
    /// x: sprite radius in world units, y: 1.0 to use vertex colors.
    pub params: [f32; 4],
}

impl DrawUniforms {
    /// Builds uniforms for one draw.
    #[must_use]
    pub fn new(
        base_color: Vec3,
        pick_range: Option<PickRange>,
        sprite_radius: f32,
        use_vertex_color: bool,
    ) -> Self {
        let [low, mid, high] = pick_range.map_or([0; 3], |range| range.base_limbs());
        Self {
            base_color: base_color.extend(1.0).to_array(),
            pick_base: [low, mid, high, 0],
            params: [
                sprite_radius,
                if use_vertex_color { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ],
        }
    }
}

/// A vertex buffer plus its own uniform buffer and bind group.
pub struct GpuGeometry {
    kind: GeometryKind,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuGeometry {
    /// Uploads vertices. `layout` is the draw bind group layout of the pipelines.
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        kind: GeometryKind,
        vertices: &[Vertex],
        label: &str,
    ) -> Self {
        // Zero-sized vertex buffers are not allowed; keep one dummy vertex.
        let dummy = [Vertex::new(Vec3::ZERO, Vec3::ZERO, 0)];
        let contents: &[Vertex] = if vertices.is_empty() { &dummy } else { vertices };

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(contents),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[DrawUniforms::new(Vec3::ONE, None, 0.0, false)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            kind,
            vertex_buffer,
            vertex_count: u32::try_from(vertices.len()).unwrap_or(u32::MAX),
            uniform_buffer,
            bind_group,
        }
    }

    /// Writes the per-draw uniforms.
    pub fn set_uniforms(&self, queue: &wgpu::Queue, uniforms: &DrawUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Returns the rasterization kind.
    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Returns the number of vertices (instances for sprites).
    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub(crate) fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub(crate) fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenescope_core::offset_limbs;

    #[test]
    fn test_vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex>(), 28);
        let layout = Vertex::layout(wgpu::VertexStepMode::Vertex);
        assert_eq!(layout.array_stride, 28);
        assert_eq!(layout.attributes[2].offset, 24);
    }

    #[test]
    fn test_uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<DrawUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<CameraUniforms>() % 16, 0);
    }

    #[test]
    fn test_pick_base_matches_range() {
        let range = PickRange {
            start: (1 << 22) + 5,
            len: 10,
        };
        let uniforms = DrawUniforms::new(Vec3::ONE, Some(range), 0.1, false);
        let base = [uniforms.pick_base[0], uniforms.pick_base[1], uniforms.pick_base[2]];
        assert_eq!(base, [5, 1, 0]);
        assert_eq!(
            offset_limbs(base, 3),
            scenescope_core::index_to_limbs(range.start + 3)
        );
    }
}
