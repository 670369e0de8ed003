//! Minimal structure used by unit tests in this crate.

use std::any::Any;

use glam::Vec3;

use crate::pick::PickRange;
use crate::structure::{RenderContext, Structure, StructureType};

pub(crate) struct MockStructure {
    pub name: String,
    pub ty: StructureType,
    pub bbox: (Vec3, Vec3),
    pub length_scale: f32,
    pub elements: u64,
    pub range: Option<PickRange>,
    pub enabled: bool,
}

impl MockStructure {
    pub fn new(name: &str, ty: StructureType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            bbox: (Vec3::ZERO, Vec3::ONE),
            length_scale: 1.0,
            elements: 1,
            range: None,
            enabled: true,
        }
    }

    pub fn with_bbox(mut self, min: Vec3, max: Vec3, length_scale: f32) -> Self {
        self.bbox = (min, max);
        self.length_scale = length_scale;
        self
    }

    pub fn with_elements(mut self, elements: u64) -> Self {
        self.elements = elements;
        self
    }

    pub fn boxed(self) -> Box<dyn Structure> {
        Box::new(self)
    }
}

impl Structure for MockStructure {
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
        self.ty
    }

    fn bounding_box(&self) -> (Vec3, Vec3) {
        self.bbox
    }

    fn length_scale(&self) -> f32 {
        self.length_scale
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn draw(&mut self, _ctx: &mut dyn RenderContext) {}

    fn draw_pick(&mut self, _ctx: &mut dyn RenderContext) {}

    fn build_ui(&mut self, _ui: &mut dyn Any) {}

    fn build_pick_ui(&self, _ui: &mut dyn Any, _local_index: u64) {}

    fn num_pick_elements(&self) -> u64 {
        self.elements
    }

    fn pick_range(&self) -> Option<PickRange> {
        self.range
    }

    fn set_pick_range(&mut self, range: Option<PickRange>) {
        self.range = range;
    }
}
