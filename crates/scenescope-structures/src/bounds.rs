//! Bounding box helpers shared by the structures.

use glam::Vec3;

/// The box reported by structures without finite geometry.
///
/// `min > max` on every axis, so the extent aggregator skips it.
pub(crate) const EMPTY_BOX: (Vec3, Vec3) = (Vec3::INFINITY, Vec3::NEG_INFINITY);

/// Componentwise bounds of the finite points, or [`EMPTY_BOX`].
pub(crate) fn bounds_of(points: impl IntoIterator<Item = Vec3>) -> (Vec3, Vec3) {
    points
        .into_iter()
        .filter(|p| p.is_finite())
        .fold(EMPTY_BOX, |(min, max), p| (min.min(p), max.max(p)))
}

/// Length of the box diagonal, or 0 for an empty box.
pub(crate) fn diagonal((min, max): (Vec3, Vec3)) -> f32 {
    if min.cmple(max).all() {
        (max - min).length()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bounds_skip_non_finite() {
        let (min, max) = bounds_of([
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(f32::NAN, 100.0, 0.0),
            Vec3::new(-1.0, 3.0, 4.0),
        ]);
        assert_eq!(min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Vec3::new(1.0, 3.0, 4.0));
    }

    #[test]
    fn test_empty_bounds() {
        let bbox = bounds_of(std::iter::empty());
        assert_eq!(bbox, EMPTY_BOX);
        assert_eq!(diagonal(bbox), 0.0);
    }

    #[test]
    fn test_single_point_has_zero_diagonal() {
        let bbox = bounds_of([Vec3::ONE]);
        assert_eq!(bbox, (Vec3::ONE, Vec3::ONE));
        assert_eq!(diagonal(bbox), 0.0);
    }

    proptest! {
        #[test]
        fn prop_bounds_contain_every_point(
            coords in prop::collection::vec((-1e3f32..1e3, -1e3f32..1e3, -1e3f32..1e3), 1..32),
        ) {
            let points: Vec<Vec3> = coords.iter().map(|&(x, y, z)| Vec3::new(x, y, z)).collect();
            let (min, max) = bounds_of(points.iter().copied());
            for p in &points {
                prop_assert!(min.cmple(*p).all() && p.cmple(max).all());
            }
            prop_assert!(diagonal((min, max)) >= 0.0);
        }
    }
}
