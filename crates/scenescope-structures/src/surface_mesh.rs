//! Surface mesh structure.

use std::any::Any;

use glam::Vec3;
use scenescope_core::{
    PickRange, RenderContext, Result, ScenescopeError, Structure, StructureType,
};
use scenescope_render::{DrawContext, DrawUniforms, GeometryKind, Vertex};

use crate::bounds::{bounds_of, diagonal};
use crate::gpu::{segment, shade, LazyGeometry};

/// Vertex pick discs, relative to the scene point radius.
const VERTEX_PICK_RADIUS_FACTOR: f32 = 0.75;

/// A polygonal surface mesh.
///
/// Faces are arbitrary polygons, fan-triangulated for drawing. Pick elements
/// are all vertices followed by all faces: local index `i < num_vertices` is
/// vertex `i`, otherwise face `i - num_vertices`.
pub struct SurfaceMesh {
    name: String,
    data: MeshData,
    enabled: bool,
    surface_color: Vec3,
    show_edges: bool,
    edge_color: Vec3,
    pick_range: Option<PickRange>,
    face_geometry: LazyGeometry,
    edge_geometry: LazyGeometry,
    vertex_geometry: LazyGeometry,
}

impl SurfaceMesh {
    /// Creates a new surface mesh.
    ///
    /// Fails with [`ScenescopeError::InvalidGeometry`] if a face has fewer than
    /// three vertices or refers to a vertex that does not exist.
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vec3>,
        faces: Vec<Vec<u32>>,
    ) -> Result<Self> {
        let name = name.into();
        validate_faces(&name, vertices.len(), &faces)?;
        Ok(Self {
            name,
            data: MeshData { vertices, faces },
            enabled: true,
            surface_color: Vec3::new(0.2, 0.5, 0.8),
            show_edges: false,
            edge_color: Vec3::new(0.0, 0.0, 0.0),
            pick_range: None,
            face_geometry: LazyGeometry::default(),
            edge_geometry: LazyGeometry::default(),
            vertex_geometry: LazyGeometry::default(),
        })
    }

    /// Creates a new triangle mesh.
    pub fn from_triangles(
        name: impl Into<String>,
        vertices: Vec<Vec3>,
        triangles: &[[u32; 3]],
    ) -> Result<Self> {
        let faces = triangles.iter().map(|t| t.to_vec()).collect();
        Self::new(name, vertices, faces)
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.data.vertices.len()
    }

    /// Returns the number of faces.
    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.data.faces.len()
    }

    /// Returns the vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Vec3] {
        &self.data.vertices
    }

    /// Returns the faces.
    #[must_use]
    pub fn faces(&self) -> &[Vec<u32>] {
        &self.data.faces
    }

    /// Replaces the vertex positions, keeping the connectivity.
    pub fn update_vertices(&mut self, vertices: Vec<Vec3>) -> Result<()> {
        validate_faces(&self.name, vertices.len(), &self.data.faces)?;
        self.data.vertices = vertices;
        self.invalidate();
        Ok(())
    }

    /// Returns the surface color.
    #[must_use]
    pub fn surface_color(&self) -> Vec3 {
        self.surface_color
    }

    /// Sets the surface color.
    pub fn set_surface_color(&mut self, color: Vec3) -> &mut Self {
        self.surface_color = color;
        // Shading is baked into the face vertices.
        self.face_geometry.invalidate();
        self
    }

    /// Returns whether edges are drawn.
    #[must_use]
    pub fn show_edges(&self) -> bool {
        self.show_edges
    }

    /// Sets whether edges are drawn.
    pub fn set_show_edges(&mut self, show: bool) -> &mut Self {
        self.show_edges = show;
        self
    }

    /// Returns the edge color.
    #[must_use]
    pub fn edge_color(&self) -> Vec3 {
        self.edge_color
    }

    /// Sets the edge color.
    pub fn set_edge_color(&mut self, color: Vec3) -> &mut Self {
        self.edge_color = color;
        self
    }

    /// Resolves a local pick index to a vertex or face.
    pub fn pick_element(&self, local_index: u64) -> Option<MeshElement> {
        let index = usize::try_from(local_index).ok()?;
        let nv = self.data.vertices.len();
        if index < nv {
            Some(MeshElement::Vertex(index))
        } else if index - nv < self.data.faces.len() {
            Some(MeshElement::Face(index - nv))
        } else {
            None
        }
    }

    fn invalidate(&mut self) {
        self.face_geometry.invalidate();
        self.edge_geometry.invalidate();
        self.vertex_geometry.invalidate();
    }
}

/// Vertex positions and polygon connectivity.
struct MeshData {
    vertices: Vec<Vec3>,
    faces: Vec<Vec<u32>>,
}

impl MeshData {
    fn face_normal(&self, face: &[u32]) -> Vec3 {
        // Newell's method, robust for non-planar polygons.
        let mut normal = Vec3::ZERO;
        for (i, &a) in face.iter().enumerate() {
            let b = face[(i + 1) % face.len()];
            let p = self.vertices[a as usize];
            let q = self.vertices[b as usize];
            normal += Vec3::new(
                (p.y - q.y) * (p.z + q.z),
                (p.z - q.z) * (p.x + q.x),
                (p.x - q.x) * (p.y + q.y),
            );
        }
        normal.normalize_or_zero()
    }

    /// Fan-triangulated faces; each triangle carries its face's pick element.
    fn triangle_vertices(&self, surface_color: Vec3) -> Vec<Vertex> {
        let nv = self.vertices.len() as u32;
        let mut out = Vec::new();
        for (f, face) in self.faces.iter().enumerate() {
            let color = shade(surface_color, self.face_normal(face));
            let element = nv + f as u32;
            let root = self.vertices[face[0] as usize];
            for pair in face[1..].windows(2) {
                out.extend([
                    Vertex::new(root, color, element),
                    Vertex::new(self.vertices[pair[0] as usize], color, element),
                    Vertex::new(self.vertices[pair[1] as usize], color, element),
                ]);
            }
        }
        out
    }

    fn edge_vertices(&self) -> Vec<Vertex> {
        let nv = self.vertices.len() as u32;
        let mut out = Vec::new();
        for (f, face) in self.faces.iter().enumerate() {
            for (i, &a) in face.iter().enumerate() {
                let b = face[(i + 1) % face.len()];
                out.extend(segment(
                    self.vertices[a as usize],
                    self.vertices[b as usize],
                    Vec3::ONE,
                    nv + f as u32,
                ));
            }
        }
        out
    }

    fn vertex_sprites(&self) -> Vec<Vertex> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, &p)| Vertex::new(p, Vec3::ONE, i as u32))
            .collect()
    }
}

/// A pickable element of a [`SurfaceMesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshElement {
    /// Vertex index.
    Vertex(usize),
    /// Face index.
    Face(usize),
}

fn validate_faces(name: &str, num_vertices: usize, faces: &[Vec<u32>]) -> Result<()> {
    for (f, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            return Err(ScenescopeError::InvalidGeometry(format!(
                "mesh '{name}': face {f} has {} vertices, need at least 3",
                face.len()
            )));
        }
        if let Some(&bad) = face.iter().find(|&&v| v as usize >= num_vertices) {
            return Err(ScenescopeError::InvalidGeometry(format!(
                "mesh '{name}': face {f} refers to vertex {bad}, mesh has {num_vertices}"
            )));
        }
    }
    Ok(())
}

impl Structure for SurfaceMesh {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn structure_type(&self) -> StructureType {
        StructureType::SurfaceMesh
    }

    fn bounding_box(&self) -> (Vec3, Vec3) {
        bounds_of(self.data.vertices.iter().copied())
    }

    fn length_scale(&self) -> f32 {
        diagonal(self.bounding_box())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn draw(&mut self, ctx: &mut dyn RenderContext) {
        let Some(ctx) = DrawContext::from_context(ctx) else {
            return;
        };
        let data = &self.data;
        let color = self.surface_color;
        let uniforms = DrawUniforms::new(color, self.pick_range, 0.0, true);
        let triangles = || data.triangle_vertices(color);
        self.face_geometry
            .draw(ctx, GeometryKind::Triangles, &self.name, &uniforms, triangles);

        if self.show_edges {
            let uniforms = DrawUniforms::new(self.edge_color, self.pick_range, 0.0, false);
            let edges = || data.edge_vertices();
            self.edge_geometry
                .draw(ctx, GeometryKind::Lines, &self.name, &uniforms, edges);
        }
    }

    fn draw_pick(&mut self, ctx: &mut dyn RenderContext) {
        let Some(ctx) = DrawContext::from_context(ctx) else {
            return;
        };
        let data = &self.data;
        let color = self.surface_color;
        let uniforms = DrawUniforms::new(color, self.pick_range, 0.0, false);
        let triangles = || data.triangle_vertices(color);
        self.face_geometry
            .draw(ctx, GeometryKind::Triangles, &self.name, &uniforms, triangles);

        let params = ctx.params();
        let radius = VERTEX_PICK_RADIUS_FACTOR * params.point_radius * params.length_scale;
        let uniforms = DrawUniforms::new(self.surface_color, self.pick_range, radius, false);
        let sprites = || data.vertex_sprites();
        self.vertex_geometry
            .draw(ctx, GeometryKind::Sprites, &self.name, &uniforms, sprites);
    }

    fn build_ui(&mut self, ui: &mut dyn Any) {
        let Some(ui) = scenescope_ui::as_egui(ui) else {
            return;
        };
        let mut color = self.surface_color.to_array();
        let mut show_edges = self.show_edges;
        let mut edge_color = self.edge_color.to_array();
        if scenescope_ui::build_surface_mesh_ui(
            ui,
            self.data.vertices.len(),
            self.data.faces.len(),
            &mut color,
            &mut show_edges,
            &mut edge_color,
        ) {
            let color = Vec3::from_array(color);
            if color != self.surface_color {
                self.set_surface_color(color);
            }
            self.show_edges = show_edges;
            self.edge_color = Vec3::from_array(edge_color);
        }
    }

    fn build_pick_ui(&self, ui: &mut dyn Any, local_index: u64) {
        let Some(ui) = scenescope_ui::as_egui(ui) else {
            return;
        };
        match self.pick_element(local_index) {
            Some(MeshElement::Vertex(v)) => scenescope_ui::build_element_info(
                ui,
                &format!("Vertex #{v}"),
                &[("Position", scenescope_ui::format_vec3(self.data.vertices[v]))],
            ),
            Some(MeshElement::Face(f)) => {
                let face = &self.data.faces[f];
                let indices = face
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                scenescope_ui::build_element_info(
                    ui,
                    &format!("Face #{f}"),
                    &[
                        ("Degree", face.len().to_string()),
                        ("Vertices", indices),
                        ("Normal", scenescope_ui::format_vec3(self.data.face_normal(face))),
                    ],
                );
            }
            None => {}
        }
    }

    fn num_pick_elements(&self) -> u64 {
        (self.data.vertices.len() + self.data.faces.len()) as u64
    }

    fn pick_range(&self) -> Option<PickRange> {
        self.pick_range
    }

    fn set_pick_range(&mut self, range: Option<PickRange>) {
        self.pick_range = range;
    }

    fn release_gpu_resources(&mut self) {
        self.invalidate();
    }
}
