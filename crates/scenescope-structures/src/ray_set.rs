//! Ray set structure: a collection of polyline rays.

use std::any::Any;

use glam::Vec3;
use scenescope_core::{
    PickRange, RenderContext, Result, ScenescopeError, Structure, StructureType,
};
use scenescope_render::{DrawContext, DrawUniforms, GeometryKind, Vertex};

use crate::bounds::{bounds_of, diagonal};
use crate::gpu::{segment, LazyGeometry};

/// How far an infinite segment is drawn, in scene length scales.
const INFINITE_SEGMENT_LENGTH: f32 = 1.0e3;

/// One point of a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayPoint {
    /// Position, or the direction of travel if `is_inf`.
    pub position: Vec3,
    /// The ray leaves the previous point along `position` and never returns.
    pub is_inf: bool,
}

impl RayPoint {
    /// A finite point.
    pub fn point(position: Vec3) -> Self {
        Self {
            position,
            is_inf: false,
        }
    }

    /// An infinite final segment in direction `dir`.
    pub fn infinite(dir: Vec3) -> Self {
        Self {
            position: dir,
            is_inf: true,
        }
    }
}

/// A set of rays, each a polyline that may end in an infinite segment.
///
/// Every ray is one pick element.
pub struct RaySet {
    name: String,
    rays: Vec<Vec<RayPoint>>,
    enabled: bool,
    color: Vec3,
    pick_range: Option<PickRange>,
    geometry: LazyGeometry,
    joints: LazyGeometry,
    /// Scene length scale the current geometry was built with.
    built_scale: f32,
}

impl RaySet {
    /// Creates a new ray set.
    ///
    /// Fails with [`ScenescopeError::InvalidGeometry`] if a ray starts with an
    /// infinite point or has an infinite point anywhere but at its end.
    pub fn new(name: impl Into<String>, rays: Vec<Vec<RayPoint>>) -> Result<Self> {
        let name = name.into();
        validate_rays(&name, &rays)?;
        Ok(Self {
            name,
            rays,
            enabled: true,
            color: Vec3::new(0.9, 0.45, 0.1),
            pick_range: None,
            geometry: LazyGeometry::default(),
            joints: LazyGeometry::default(),
            built_scale: 0.0,
        })
    }

    /// Returns the number of rays.
    #[must_use]
    pub fn num_rays(&self) -> usize {
        self.rays.len()
    }

    /// Returns the rays.
    #[must_use]
    pub fn rays(&self) -> &[Vec<RayPoint>] {
        &self.rays
    }

    /// Returns the ray color.
    #[must_use]
    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Sets the ray color.
    pub fn set_color(&mut self, color: Vec3) -> &mut Self {
        self.color = color;
        self
    }

    fn finite_points(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.rays
            .iter()
            .flatten()
            .filter(|p| !p.is_inf)
            .map(|p| p.position)
    }

    fn invalidate(&mut self) {
        self.geometry.invalidate();
        self.joints.invalidate();
    }

    fn check_scale(&mut self, length_scale: f32) {
        if (length_scale - self.built_scale).abs() > f32::EPSILON * length_scale.max(1.0) {
            // Infinite segments are sized by the scene scale.
            self.geometry.invalidate();
            self.built_scale = length_scale;
        }
    }
}

fn validate_rays(name: &str, rays: &[Vec<RayPoint>]) -> Result<()> {
    for (r, ray) in rays.iter().enumerate() {
        let last = ray.len().saturating_sub(1);
        if let Some(i) = ray.iter().position(|p| p.is_inf) {
            if i == 0 || i != last {
                return Err(ScenescopeError::InvalidGeometry(format!(
                    "ray set '{name}': ray {r} has an infinite point at {i}, \
                     only the last point of a ray may be infinite"
                )));
            }
        }
    }
    Ok(())
}

fn ray_segments(rays: &[Vec<RayPoint>], length_scale: f32) -> Vec<Vertex> {
    let far = INFINITE_SEGMENT_LENGTH * length_scale.max(f32::MIN_POSITIVE);
    let mut out = Vec::new();
    for (r, ray) in rays.iter().enumerate() {
        for pair in ray.windows(2) {
            let start = pair[0].position;
            let end = if pair[1].is_inf {
                start + pair[1].position.normalize_or_zero() * far
            } else {
                pair[1].position
            };
            out.extend(segment(start, end, Vec3::ONE, r as u32));
        }
    }
    out
}

fn ray_joints(rays: &[Vec<RayPoint>]) -> Vec<Vertex> {
    rays.iter()
        .enumerate()
        .flat_map(|(r, ray)| {
            ray.iter()
                .filter(|p| !p.is_inf)
                .map(move |p| Vertex::new(p.position, Vec3::ONE, r as u32))
        })
        .collect()
}

impl Structure for RaySet {
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
        StructureType::RaySet
    }

    fn bounding_box(&self) -> (Vec3, Vec3) {
        bounds_of(self.finite_points())
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
        let scale = ctx.params().length_scale;
        self.check_scale(scale);
        let uniforms = DrawUniforms::new(self.color, self.pick_range, 0.0, false);
        let rays = &self.rays;
        self.geometry.draw(ctx, GeometryKind::Lines, &self.name, &uniforms, || {
            ray_segments(rays, scale)
        });
    }

    fn draw_pick(&mut self, ctx: &mut dyn RenderContext) {
        let Some(ctx) = DrawContext::from_context(ctx) else {
            return;
        };
        let scale = ctx.params().length_scale;
        self.check_scale(scale);
        let uniforms = DrawUniforms::new(self.color, self.pick_range, 0.0, false);
        let rays = &self.rays;
        self.geometry.draw(ctx, GeometryKind::Lines, &self.name, &uniforms, || {
            ray_segments(rays, scale)
        });

        // Lines are one pixel wide; discs at the joints give a larger target.
        let radius = ctx.params().point_radius * scale;
        let uniforms = DrawUniforms::new(self.color, self.pick_range, radius, false);
        self.joints.draw(ctx, GeometryKind::Sprites, &self.name, &uniforms, || {
            ray_joints(rays)
        });
    }

    fn build_ui(&mut self, ui: &mut dyn Any) {
        let Some(ui) = scenescope_ui::as_egui(ui) else {
            return;
        };
        let mut color = self.color.to_array();
        if scenescope_ui::build_ray_set_ui(ui, self.rays.len(), &mut color) {
            self.color = Vec3::from_array(color);
        }
    }

    fn build_pick_ui(&self, ui: &mut dyn Any, local_index: u64) {
        let Some(ui) = scenescope_ui::as_egui(ui) else {
            return;
        };
        let Some(ray) = usize::try_from(local_index)
            .ok()
            .and_then(|i| self.rays.get(i))
        else {
            return;
        };
        let mut rows = vec![("Points", ray.len().to_string())];
        if let Some(first) = ray.first() {
            rows.push(("Origin", scenescope_ui::format_vec3(first.position)));
        }
        if let Some(last) = ray.last().filter(|p| p.is_inf) {
            rows.push(("Escapes along", scenescope_ui::format_vec3(last.position)));
        }
        scenescope_ui::build_element_info(ui, &format!("Ray #{local_index}"), &rows);
    }

    fn num_pick_elements(&self) -> u64 {
        self.rays.len() as u64
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
