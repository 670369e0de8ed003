//! Scene extent aggregation.

use glam::Vec3;

use crate::structure::Structure;

/// Bounding box, length scale and center of the whole scene.
///
/// Recomputed from the registered structures after every registration or
/// removal; camera framing and size-relative parameters read it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneExtent {
    /// Union of the structures' bounding boxes as `(min, max)`.
    pub bounding_box: (Vec3, Vec3),
    /// Characteristic size of the scene, always finite and positive.
    pub length_scale: f32,
    /// Midpoint of the bounding box.
    pub center: Vec3,
}

impl Default for SceneExtent {
    fn default() -> Self {
        Self::from_structures(std::iter::empty())
    }
}

impl SceneExtent {
    /// Aggregates the extents of a set of structures.
    ///
    /// - the length scale is the largest structure length scale;
    /// - the bounding box is the componentwise union of every bounding box;
    /// - a non-finite union (no structures, or an unbounded structure) is
    ///   replaced by the cube `[-1, 1]^3`;
    /// - a zero length scale falls back to the box diagonal, then to 1.
    pub fn from_structures<'a>(structures: impl IntoIterator<Item = &'a dyn Structure>) -> Self {
        let mut length_scale = 0.0_f32;
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for structure in structures {
            let scale = structure.length_scale();
            if scale.is_finite() {
                length_scale = length_scale.max(scale);
            }

            // An empty (+inf, -inf) box vanishes in the union; anything else
            // non-finite poisons it.
            let (s_min, s_max) = structure.bounding_box();
            min = min.min(s_min);
            max = max.max(s_max);
        }

        if !(min.is_finite() && max.is_finite() && min.cmple(max).all()) {
            min = Vec3::splat(-1.0);
            max = Vec3::splat(1.0);
        }

        if length_scale <= 0.0 {
            length_scale = (max - min).length();
        }
        if !(length_scale.is_finite() && length_scale > 0.0) {
            length_scale = 1.0;
        }

        Self {
            bounding_box: (min, max),
            length_scale,
            center: 0.5 * (min + max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::StructureType;
    use crate::test_support::MockStructure;

    fn extent_of(structures: &[MockStructure]) -> SceneExtent {
        SceneExtent::from_structures(structures.iter().map(|s| s as &dyn Structure))
    }

    #[test]
    fn test_empty_scene_is_unit_cube() {
        let extent = SceneExtent::default();
        assert_eq!(extent.bounding_box, (Vec3::splat(-1.0), Vec3::splat(1.0)));
        assert_eq!(extent.center, Vec3::ZERO);
        assert!((extent.length_scale - 2.0 * 3.0_f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_union_and_max_length_scale() {
        let extent = extent_of(&[
            MockStructure::new("a", StructureType::PointCloud).with_bbox(
                Vec3::ZERO,
                Vec3::ONE,
                1.5,
            ),
            MockStructure::new("b", StructureType::SurfaceMesh).with_bbox(
                Vec3::new(-2.0, 0.5, 0.0),
                Vec3::new(0.0, 3.0, 0.5),
                0.5,
            ),
        ]);
        assert_eq!(
            extent.bounding_box,
            (Vec3::new(-2.0, 0.0, 0.0), Vec3::new(1.0, 3.0, 1.0))
        );
        assert_eq!(extent.length_scale, 1.5);
        assert_eq!(extent.center, Vec3::new(-0.5, 1.5, 0.5));
    }

    #[test]
    fn test_empty_boxes_are_absorbed() {
        let extent = extent_of(&[
            MockStructure::new("cam", StructureType::CameraView).with_bbox(
                Vec3::splat(f32::INFINITY),
                Vec3::splat(f32::NEG_INFINITY),
                0.0,
            ),
            MockStructure::new("pt", StructureType::PointCloud).with_bbox(
                Vec3::new(1.0, 2.0, 3.0),
                Vec3::new(1.0, 2.0, 3.0),
                0.0,
            ),
        ]);
        // A single point: the box is degenerate and the length scale falls back to 1.
        assert_eq!(extent.bounding_box.0, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(extent.length_scale, 1.0);
        assert_eq!(extent.center, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_unbounded_box_falls_back_to_unit_cube() {
        let extent = extent_of(&[
            MockStructure::new("a", StructureType::PointCloud).with_bbox(
                Vec3::ZERO,
                Vec3::splat(5.0),
                5.0,
            ),
            MockStructure::new("inf", StructureType::RaySet).with_bbox(
                Vec3::splat(f32::NEG_INFINITY),
                Vec3::splat(f32::INFINITY),
                0.0,
            ),
        ]);
        assert_eq!(extent.bounding_box, (Vec3::splat(-1.0), Vec3::splat(1.0)));
        assert_eq!(extent.center, Vec3::ZERO);
        assert_eq!(extent.length_scale, 5.0);
    }

    #[test]
    fn test_zero_length_scale_uses_diagonal() {
        let extent = extent_of(&[MockStructure::new("r", StructureType::RaySet).with_bbox(
            Vec3::ZERO,
            Vec3::new(3.0, 4.0, 0.0),
            0.0,
        )]);
        assert_eq!(extent.length_scale, 5.0);
    }

    #[test]
    fn test_nan_length_scale_is_ignored() {
        let extent = extent_of(&[MockStructure::new("n", StructureType::PointCloud).with_bbox(
            Vec3::ZERO,
            Vec3::ONE,
            f32::NAN,
        )]);
        assert!((extent.length_scale - 3.0_f32.sqrt()).abs() < 1e-5);
    }
}
