//! Pick index encoding and allocation.
//!
//! Every selectable element in the scene owns one global pick index. Index 0
//! is reserved for the background. The pick pass writes the index into an
//! `Rgba32Float` target as three 22-bit limbs:
//!
//! ```text
//! low  = index         & (2^22 - 1)
//! mid  = (index >> 22) & (2^22 - 1)
//! high =  index >> 44
//! rgb  = (low, mid, high) / 2^22
//! ```
//!
//! Integers below 2^24 and divisions by powers of two are exact in `f32`, so
//! [`color_to_index`] recovers the index bit for bit. The WGSL pick shader
//! implements the same formula (see [`offset_limbs`]).

use std::collections::BTreeMap;

use crate::error::{Result, ScenescopeError};
use crate::structure::StructureType;

/// Number of index bits stored in each colour channel.
pub const PICK_BITS_PER_CHANNEL: u32 = 22;

const LIMB_MASK: u64 = (1 << PICK_BITS_PER_CHANNEL) - 1;
const LIMB_SCALE: f32 = (1u32 << PICK_BITS_PER_CHANNEL) as f32;
/// The high limb only carries the top 20 bits of a `u64`.
const HIGH_LIMB_LIMIT: u64 = 1 << (64 - 2 * PICK_BITS_PER_CHANNEL);

/// Largest element count a single structure may claim.
///
/// The pick shader receives per-element indices as `u32`.
pub const MAX_ELEMENTS_PER_STRUCTURE: u64 = u32::MAX as u64;

/// Splits a global index into its three 22-bit limbs `[low, mid, high]`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn index_to_limbs(index: u64) -> [u32; 3] {
    [
        (index & LIMB_MASK) as u32,
        ((index >> PICK_BITS_PER_CHANNEL) & LIMB_MASK) as u32,
        (index >> (2 * PICK_BITS_PER_CHANNEL)) as u32,
    ]
}

/// Encodes a global index as an RGB pick colour.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn index_to_color(index: u64) -> [f32; 3] {
    index_to_limbs(index).map(|limb| limb as f32 / LIMB_SCALE)
}

/// Decodes an RGB pick colour back into a global index.
///
/// Returns `None` for colours that no index encodes to (non-finite or
/// out-of-range channels, or values between limbs).
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn color_to_index(color: [f32; 3]) -> Option<u64> {
    let mut limbs = [0u64; 3];
    for (limb, channel) in limbs.iter_mut().zip(color) {
        if !channel.is_finite() || !(0.0..1.0).contains(&channel) {
            return None;
        }
        let scaled = channel * LIMB_SCALE;
        let rounded = scaled.round();
        if (scaled - rounded).abs() > 0.25 {
            return None;
        }
        *limb = rounded as u64;
    }
    if limbs[2] >= HIGH_LIMB_LIMIT {
        return None;
    }
    Some(limbs[0] | (limbs[1] << PICK_BITS_PER_CHANNEL) | (limbs[2] << (2 * PICK_BITS_PER_CHANNEL)))
}

/// Adds a per-element offset to a range start given as limbs.
///
/// This is the carry chain the pick shader runs on the GPU; it never exceeds
/// `u32` arithmetic.
#[must_use]
pub fn offset_limbs(base: [u32; 3], element: u32) -> [u32; 3] {
    let mask = LIMB_MASK as u32;
    let low_sum = base[0] + (element & mask);
    let mid_sum = base[1] + (element >> PICK_BITS_PER_CHANNEL) + (low_sum >> PICK_BITS_PER_CHANNEL);
    let high = base[2] + (mid_sum >> PICK_BITS_PER_CHANNEL);
    [low_sum & mask, mid_sum & mask, high]
}

/// A contiguous block of global pick indices owned by one structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickRange {
    /// First global index of the block.
    pub start: u64,
    /// Number of indices in the block.
    pub len: u64,
}

impl PickRange {
    /// Returns whether the global index falls inside this range.
    #[must_use]
    pub fn contains(&self, global_index: u64) -> bool {
        global_index >= self.start && global_index - self.start < self.len
    }

    /// Converts a structure-local element index to its global index.
    #[must_use]
    pub fn global_index(&self, local_index: u64) -> Option<u64> {
        (local_index < self.len).then(|| self.start + local_index)
    }

    /// Converts a global index to the structure-local element index.
    #[must_use]
    pub fn local_index(&self, global_index: u64) -> Option<u64> {
        self.contains(global_index).then(|| global_index - self.start)
    }

    /// Returns the range start as limbs, ready for the pick shader.
    #[must_use]
    pub fn base_limbs(&self) -> [u32; 3] {
        index_to_limbs(self.start)
    }
}

#[derive(Debug, Clone)]
struct RangeOwner {
    range: PickRange,
    name: String,
    structure_type: StructureType,
}

/// Hands out non-overlapping pick ranges and maps indices back to owners.
///
/// Indices are assigned monotonically starting at 1 and are never reused, so
/// a stale index can never resolve to a newer structure.
#[derive(Debug, Clone)]
pub struct PickIndexAllocator {
    next: u64,
    owners: BTreeMap<u64, RangeOwner>,
}

impl Default for PickIndexAllocator {
    fn default() -> Self {
        Self {
            next: 1,
            owners: BTreeMap::new(),
        }
    }
}

impl PickIndexAllocator {
    /// Creates an allocator whose first range starts at index 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `count` consecutive indices for the named structure.
    ///
    /// Fails with [`ScenescopeError::GpuResource`] if the structure has more
    /// elements than the pick shader can address or the index space is
    /// exhausted. A failed claim changes nothing.
    pub fn allocate(
        &mut self,
        name: &str,
        structure_type: StructureType,
        count: u64,
    ) -> Result<PickRange> {
        if count > MAX_ELEMENTS_PER_STRUCTURE {
            return Err(ScenescopeError::GpuResource(format!(
                "structure '{name}' has {count} pickable elements, \
                 more than the {MAX_ELEMENTS_PER_STRUCTURE} a pick pass can encode"
            )));
        }
        let end = self.next.checked_add(count).ok_or_else(|| {
            ScenescopeError::GpuResource(format!(
                "pick index space exhausted while registering '{name}'"
            ))
        })?;

        let range = PickRange {
            start: self.next,
            len: count,
        };
        self.next = end;
        if count > 0 {
            self.owners.insert(
                range.start,
                RangeOwner {
                    range,
                    name: name.to_string(),
                    structure_type,
                },
            );
        }
        log::debug!("pick range [{}, {}) -> '{name}'", range.start, end);
        Ok(range)
    }

    /// Releases a previously claimed range. Its indices stay retired.
    pub fn release(&mut self, range: PickRange) {
        self.owners.remove(&range.start);
    }

    /// Releases every claimed range.
    pub fn release_all(&mut self) {
        self.owners.clear();
    }

    /// Resolves a global index to `(owner name, owner type, local index)`.
    ///
    /// Returns `None` for index 0 and for indices no live range owns.
    #[must_use]
    pub fn resolve(&self, global_index: u64) -> Option<(&str, StructureType, u64)> {
        let (_, owner) = self.owners.range(..=global_index).next_back()?;
        let local = owner.range.local_index(global_index)?;
        Some((owner.name.as_str(), owner.structure_type, local))
    }

    /// Returns the first index the next claim will receive.
    #[must_use]
    pub fn next_index(&self) -> u64 {
        self.next
    }

    /// Returns the number of live ranges.
    #[must_use]
    pub fn live_ranges(&self) -> usize {
        self.owners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_background_is_black() {
        assert_eq!(index_to_color(0), [0.0, 0.0, 0.0]);
        assert_eq!(color_to_index([0.0, 0.0, 0.0]), Some(0));
    }

    #[test]
    fn test_specific_limbs() {
        assert_eq!(index_to_limbs(1), [1, 0, 0]);
        assert_eq!(index_to_limbs((1 << 22) - 1), [(1 << 22) - 1, 0, 0]);
        assert_eq!(index_to_limbs(1 << 22), [0, 1, 0]);
        assert_eq!(index_to_limbs(1 << 44), [0, 0, 1]);
        assert_eq!(index_to_limbs(u64::MAX), [(1 << 22) - 1, (1 << 22) - 1, (1 << 20) - 1]);
    }

    #[test]
    fn test_extreme_indices_roundtrip() {
        for index in [1, 255, 1 << 22, (1 << 44) + 7, u64::MAX - 1, u64::MAX] {
            assert_eq!(color_to_index(index_to_color(index)), Some(index), "index {index}");
        }
    }

    #[test]
    fn test_invalid_colors_rejected() {
        assert_eq!(color_to_index([f32::NAN, 0.0, 0.0]), None);
        assert_eq!(color_to_index([1.0, 0.0, 0.0]), None);
        assert_eq!(color_to_index([-0.5, 0.0, 0.0]), None);
        // Halfway between two limbs is not produced by any index.
        assert_eq!(color_to_index([1.5 / LIMB_SCALE, 0.0, 0.0]), None);
        // High limb beyond the top 20 bits of a u64.
        assert_eq!(color_to_index([0.0, 0.0, 0.5]), None);
    }

    #[test]
    fn test_offset_limbs_carries() {
        let base = index_to_limbs((1 << 22) - 1);
        assert_eq!(offset_limbs(base, 1), index_to_limbs(1 << 22));

        let base = index_to_limbs((1 << 44) - 1);
        assert_eq!(offset_limbs(base, 1), index_to_limbs(1 << 44));

        let base = index_to_limbs(5);
        assert_eq!(offset_limbs(base, u32::MAX), index_to_limbs(5 + u64::from(u32::MAX)));
    }

    #[test]
    fn test_range_conversions() {
        let range = PickRange { start: 10, len: 3 };
        assert!(!range.contains(9));
        assert!(range.contains(10));
        assert!(range.contains(12));
        assert!(!range.contains(13));
        assert_eq!(range.local_index(11), Some(1));
        assert_eq!(range.global_index(2), Some(12));
        assert_eq!(range.global_index(3), None);
    }

    #[test]
    fn test_allocator_starts_at_one_and_never_overlaps() {
        let mut alloc = PickIndexAllocator::new();
        let a = alloc.allocate("a", StructureType::PointCloud, 3).unwrap();
        let b = alloc.allocate("b", StructureType::SurfaceMesh, 5).unwrap();
        assert_eq!(a, PickRange { start: 1, len: 3 });
        assert_eq!(b, PickRange { start: 4, len: 5 });

        assert_eq!(alloc.resolve(0), None);
        assert_eq!(alloc.resolve(1), Some(("a", StructureType::PointCloud, 0)));
        assert_eq!(alloc.resolve(3), Some(("a", StructureType::PointCloud, 2)));
        assert_eq!(alloc.resolve(4), Some(("b", StructureType::SurfaceMesh, 0)));
        assert_eq!(alloc.resolve(9), None);
    }

    #[test]
    fn test_released_indices_are_not_reused() {
        let mut alloc = PickIndexAllocator::new();
        let a = alloc.allocate("a", StructureType::PointCloud, 3).unwrap();
        alloc.release(a);
        assert_eq!(alloc.resolve(2), None);

        let b = alloc.allocate("b", StructureType::PointCloud, 3).unwrap();
        assert_eq!(b.start, 4);
        assert_eq!(alloc.live_ranges(), 1);
    }

    #[test]
    fn test_empty_structures_own_nothing() {
        let mut alloc = PickIndexAllocator::new();
        let empty = alloc.allocate("empty", StructureType::RaySet, 0).unwrap();
        assert_eq!(empty.len, 0);
        assert_eq!(alloc.live_ranges(), 0);
        assert_eq!(alloc.resolve(empty.start), None);
    }

    #[test]
    fn test_oversized_structure_is_gpu_error() {
        let mut alloc = PickIndexAllocator::new();
        let err = alloc
            .allocate("huge", StructureType::PointCloud, MAX_ELEMENTS_PER_STRUCTURE + 1)
            .unwrap_err();
        assert!(matches!(err, ScenescopeError::GpuResource(_)));
        assert_eq!(alloc.next_index(), 1);
    }

    #[test]
    fn test_exhausted_index_space_is_gpu_error() {
        let mut alloc = PickIndexAllocator {
            next: u64::MAX - 2,
            owners: BTreeMap::new(),
        };
        assert!(alloc.allocate("fits", StructureType::PointCloud, 2).is_ok());
        let err = alloc
            .allocate("overflows", StructureType::PointCloud, 2)
            .unwrap_err();
        assert!(matches!(err, ScenescopeError::GpuResource(_)));
    }

    proptest! {
        #[test]
        fn prop_encode_decode_is_bijective(index in any::<u64>()) {
            prop_assert_eq!(color_to_index(index_to_color(index)), Some(index));
        }

        #[test]
        fn prop_shader_offset_matches_encoding(
            start in 1u64..(1u64 << 50),
            element in any::<u32>(),
        ) {
            prop_assert_eq!(
                offset_limbs(index_to_limbs(start), element),
                index_to_limbs(start + u64::from(element))
            );
        }
    }
}
