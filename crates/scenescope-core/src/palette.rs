//! Default colors handed to newly registered structures.

use glam::Vec3;
use rand::Rng;

const PALETTE: [[u8; 3]; 5] = [
    [171, 71, 188],  // purple
    [66, 165, 245],  // light blue
    [38, 166, 154],  // greenish
    [255, 167, 38],  // orange
    [38, 198, 218],  // teal
];

/// Cycles through a small palette of distinguishable colors.
///
/// The starting entry is random so consecutive sessions do not always begin
/// with the same color.
#[derive(Debug, Clone)]
pub struct Palette {
    next: usize,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Palette {
    /// Creates a palette starting at a random entry.
    pub fn new() -> Self {
        Self::starting_at(rand::thread_rng().gen_range(0..PALETTE.len()))
    }

    /// Creates a palette starting at the given entry (wrapped).
    pub fn starting_at(index: usize) -> Self {
        Self {
            next: index % PALETTE.len(),
        }
    }

    /// Returns the next color and advances.
    pub fn next_color(&mut self) -> Vec3 {
        let [r, g, b] = PALETTE[self.next];
        self.next = (self.next + 1) % PALETTE.len();
        Vec3::new(f32::from(r), f32::from(g), f32::from(b)) / 255.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycles_through_all_entries() {
        let mut palette = Palette::starting_at(3);
        let first = palette.next_color();
        for _ in 0..4 {
            assert_ne!(palette.next_color(), first);
        }
        assert_eq!(palette.next_color(), first);
    }

    #[test]
    fn test_colors_in_unit_range() {
        let mut palette = Palette::new();
        for _ in 0..PALETTE.len() {
            let c = palette.next_color();
            assert!(c.cmpge(Vec3::ZERO).all() && c.cmple(Vec3::ONE).all());
        }
    }
}
