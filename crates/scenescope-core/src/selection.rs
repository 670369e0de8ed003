//! Selection state driven by pick queries.

use crate::pick::PickIndexAllocator;
use crate::structure::StructureType;

/// The element a user last picked.
///
/// The structure is referenced by name and type rather than by pointer so the
/// selection can never outlive the structure it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Name of the structure that owns the element.
    pub structure_name: String,
    /// Category of that structure.
    pub structure_type: StructureType,
    /// Element index local to the structure.
    pub local_index: u64,
    /// Global pick index the element was drawn with.
    pub global_index: u64,
    /// Whether the pick came from a double click.
    pub is_double_click: bool,
}

/// Current pick state of a scene.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PickState {
    /// Nothing is selected.
    #[default]
    Empty,
    /// An element is selected.
    Selected(Selection),
}

impl PickState {
    /// Applies the result of a pick query.
    ///
    /// Index 0 (background) clears the selection. An index no live structure
    /// owns also clears it, with a warning, since it can only come from a
    /// stale or corrupted pick buffer.
    pub fn apply_query(
        &mut self,
        global_index: u64,
        is_double_click: bool,
        allocator: &PickIndexAllocator,
    ) -> Option<&Selection> {
        if global_index == 0 {
            *self = PickState::Empty;
            return None;
        }

        match allocator.resolve(global_index) {
            Some((name, structure_type, local_index)) => {
                log::debug!(
                    "picked {structure_type} '{name}' element {local_index} (global {global_index})"
                );
                *self = PickState::Selected(Selection {
                    structure_name: name.to_string(),
                    structure_type,
                    local_index,
                    global_index,
                    is_double_click,
                });
                self.selection()
            }
            None => {
                log::warn!("pick index {global_index} is not owned by any structure");
                *self = PickState::Empty;
                None
            }
        }
    }

    /// Returns the current selection, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            PickState::Empty => None,
            PickState::Selected(selection) => Some(selection),
        }
    }

    /// Returns whether anything is selected.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        matches!(self, PickState::Selected(_))
    }

    /// Clears the selection.
    pub fn clear(&mut self) {
        *self = PickState::Empty;
    }

    /// Clears the selection if it belongs to the named structure.
    pub fn clear_if_owned_by(&mut self, name: &str) {
        if self
            .selection()
            .is_some_and(|s| s.structure_name == name)
        {
            *self = PickState::Empty;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator() -> PickIndexAllocator {
        let mut alloc = PickIndexAllocator::new();
        alloc.allocate("cloud", StructureType::PointCloud, 4).unwrap();
        alloc.allocate("mesh", StructureType::SurfaceMesh, 2).unwrap();
        alloc
    }

    #[test]
    fn test_background_clears() {
        let alloc = allocator();
        let mut state = PickState::default();
        state.apply_query(2, false, &alloc);
        assert!(state.is_selected());

        assert!(state.apply_query(0, false, &alloc).is_none());
        assert_eq!(state, PickState::Empty);
    }

    #[test]
    fn test_selection_records_owner() {
        let alloc = allocator();
        let mut state = PickState::default();
        let selection = state.apply_query(6, true, &alloc).cloned().unwrap();
        assert_eq!(selection.structure_name, "mesh");
        assert_eq!(selection.structure_type, StructureType::SurfaceMesh);
        assert_eq!(selection.local_index, 1);
        assert_eq!(selection.global_index, 6);
        assert!(selection.is_double_click);
    }

    #[test]
    fn test_unowned_index_clears() {
        let alloc = allocator();
        let mut state = PickState::default();
        state.apply_query(1, false, &alloc);
        assert!(state.apply_query(1000, false, &alloc).is_none());
        assert!(!state.is_selected());
    }

    #[test]
    fn test_clear_if_owned_by() {
        let alloc = allocator();
        let mut state = PickState::default();
        state.apply_query(1, false, &alloc);

        state.clear_if_owned_by("mesh");
        assert!(state.is_selected());
        state.clear_if_owned_by("cloud");
        assert!(!state.is_selected());
    }
}
