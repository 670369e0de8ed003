//! Scene state: registry, extent, pick indices and selection.

use glam::Vec3;

use crate::error::{Result, ScenescopeError};
use crate::extent::SceneExtent;
use crate::options::Options;
use crate::palette::Palette;
use crate::pick::PickIndexAllocator;
use crate::registry::Registry;
use crate::selection::{PickState, Selection};
use crate::structure::{Structure, StructureType};

/// All state of one scenescope session.
///
/// Owned by the session handle and lent to the frame loop; every registry
/// mutation keeps the extent, the pick ranges and the selection consistent.
pub struct Context {
    registry: Registry,

    /// Session options.
    pub options: Options,

    extent: SceneExtent,
    pick_indices: PickIndexAllocator,
    pick: PickState,
    palette: Palette,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Context {
    /// Creates an empty context.
    pub fn new(options: Options) -> Self {
        Self {
            registry: Registry::new(),
            options,
            extent: SceneExtent::default(),
            pick_indices: PickIndexAllocator::new(),
            pick: PickState::Empty,
            palette: Palette::new(),
        }
    }

    /// Registers a structure.
    ///
    /// With `replace_if_present` an existing structure of the same name (in
    /// any category) is removed first; otherwise its presence is a
    /// [`ScenescopeError::NameCollision`]. The structure's pick range is
    /// claimed before anything is replaced, so a failure leaves the context
    /// untouched.
    pub fn register_structure(
        &mut self,
        mut structure: Box<dyn Structure>,
        replace_if_present: bool,
    ) -> Result<()> {
        let name = structure.name().to_string();
        if !replace_if_present {
            self.check_name_in_use(&name, true)?;
        }

        let range = self.pick_indices.allocate(
            &name,
            structure.structure_type(),
            structure.num_pick_elements(),
        )?;

        if self.registry.contains(&name) {
            self.detach(&name)?;
        }

        structure.set_pick_range(Some(range));
        if let Err(err) = self.registry.insert(structure) {
            self.pick_indices.release(range);
            return Err(err);
        }

        log::debug!("registered structure '{name}'");
        self.update_extents();
        Ok(())
    }

    /// Checks whether a name is in use in any category.
    ///
    /// With `error_if_used` a used name is reported as
    /// [`ScenescopeError::NameCollision`] instead of `Ok(true)`.
    pub fn check_name_in_use(&self, name: &str, error_if_used: bool) -> Result<bool> {
        let used = self.registry.contains(name);
        if used && error_if_used {
            return Err(ScenescopeError::NameCollision(name.to_string()));
        }
        Ok(used)
    }

    /// Returns whether a name is in use in any category.
    pub fn name_in_use(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Gets a structure by name.
    pub fn structure(&self, name: &str) -> Result<&dyn Structure> {
        self.registry.get(name)
    }

    /// Gets a structure by name for mutation.
    ///
    /// Changes to geometry made through this reference do not update the
    /// extent or pick ranges; use [`Context::with_structure_mut`] for that.
    pub fn structure_mut(&mut self, name: &str) -> Result<&mut dyn Structure> {
        self.registry.get_mut(name)
    }

    /// Gets a structure by name, downcast to its concrete type.
    pub fn get_as<T: Structure>(&self, name: &str) -> Result<&T> {
        self.registry.get_as(name)
    }

    /// Mutable counterpart of [`Context::get_as`].
    pub fn get_as_mut<T: Structure>(&mut self, name: &str) -> Result<&mut T> {
        self.registry.get_as_mut(name)
    }

    /// Runs `f` on a structure of concrete type `T`, then refreshes the
    /// extent and re-claims its pick range if its element count changed.
    ///
    /// # Errors
    ///
    /// Fails if the structure is missing, or if a new pick range cannot be
    /// claimed for its element count. In the latter case the edits made by
    /// `f` are kept and the extent is refreshed, but the structure is left
    /// without a pick range: it still draws, it cannot be picked, and any
    /// selection on it is cleared. The old range is not restored because it
    /// no longer matches the element count. A later call that brings the
    /// count back within bounds claims a fresh range.
    pub fn with_structure_mut<T, R>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R>
    where
        T: Structure,
    {
        let structure = self.registry.get_as_mut::<T>(name)?;
        let result = f(structure);

        let structure = self.registry.get_mut(name)?;
        let count = structure.num_pick_elements();
        let old_range = structure.pick_range();
        if old_range.map_or(true, |r| r.len != count) {
            if let Some(range) = old_range {
                self.pick_indices.release(range);
            }
            self.pick.clear_if_owned_by(name);
            let ty = structure.structure_type();
            match self.pick_indices.allocate(name, ty, count) {
                Ok(range) => structure.set_pick_range(Some(range)),
                Err(err) => {
                    structure.set_pick_range(None);
                    self.update_extents();
                    return Err(err);
                }
            }
        }

        self.update_extents();
        Ok(result)
    }

    /// Removes a structure by name.
    ///
    /// Clears the selection if it points at the structure.
    pub fn remove_structure(&mut self, name: &str) -> Result<Box<dyn Structure>> {
        let removed = self.detach(name)?;
        log::debug!("removed structure '{name}'");
        self.update_extents();
        Ok(removed)
    }

    fn detach(&mut self, name: &str) -> Result<Box<dyn Structure>> {
        let mut removed = self.registry.remove(name)?;
        self.pick.clear_if_owned_by(name);
        if let Some(range) = removed.pick_range() {
            self.pick_indices.release(range);
        }
        removed.set_pick_range(None);
        Ok(removed)
    }

    /// Removes every structure, clears the selection and resets the extent.
    pub fn remove_all_structures(&mut self) {
        self.registry.clear();
        self.pick_indices.release_all();
        self.pick.clear();
        self.update_extents();
        log::debug!("removed all structures");
    }

    /// Recomputes the scene extent from the registered structures.
    pub fn update_extents(&mut self) {
        self.extent = SceneExtent::from_structures(self.registry.iter());
    }

    /// Returns the current scene extent.
    pub fn extent(&self) -> &SceneExtent {
        &self.extent
    }

    /// Returns the scene center.
    pub fn center(&self) -> Vec3 {
        self.extent.center
    }

    /// Returns the registered structures in category then insertion order.
    pub fn structures(&self) -> impl Iterator<Item = &dyn Structure> {
        self.registry.iter()
    }

    /// Mutable counterpart of [`Context::structures`].
    pub fn structures_mut(&mut self) -> impl Iterator<Item = &mut dyn Structure> + '_ {
        self.registry.iter_mut()
    }

    /// Returns the structures of one category for in-place mutation.
    pub fn category_mut(&mut self, ty: StructureType) -> &mut [Box<dyn Structure>] {
        self.registry.category_mut(ty)
    }

    /// Returns the non-empty categories with their structure counts.
    pub fn category_counts(&self) -> impl Iterator<Item = (StructureType, usize)> + '_ {
        self.registry.category_counts()
    }

    /// Returns the number of registered structures.
    pub fn num_structures(&self) -> usize {
        self.registry.len()
    }

    /// Returns the current selection, if any.
    pub fn selection(&self) -> Option<&Selection> {
        self.pick.selection()
    }

    /// Returns the raw pick state.
    pub fn pick_state(&self) -> &PickState {
        &self.pick
    }

    /// Clears the current selection.
    pub fn clear_selection(&mut self) {
        self.pick.clear();
    }

    /// Applies a decoded pick index to the selection state.
    pub fn apply_pick_index(
        &mut self,
        global_index: u64,
        is_double_click: bool,
    ) -> Option<&Selection> {
        self.pick
            .apply_query(global_index, is_double_click, &self.pick_indices)
    }

    /// Returns the pick index allocator.
    pub fn pick_indices(&self) -> &PickIndexAllocator {
        &self.pick_indices
    }

    /// Returns the next default structure color.
    pub fn next_palette_color(&mut self) -> Vec3 {
        self.palette.next_color()
    }

    /// Routes an operation result through the error policy.
    ///
    /// With [`Options::error_on_failure`] the error is returned; otherwise it
    /// is logged as a warning and swallowed.
    pub fn report<T>(&self, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.options.error_on_failure => Err(err),
            Err(err) => {
                log::warn!("{}{err}", self.options.print_prefix);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pick::MAX_ELEMENTS_PER_STRUCTURE;
    use crate::test_support::MockStructure;

    fn cloud(name: &str, max: f32) -> Box<dyn Structure> {
        MockStructure::new(name, StructureType::PointCloud)
            .with_bbox(Vec3::ZERO, Vec3::splat(max), max)
            .with_elements(3)
            .boxed()
    }

    #[test]
    fn test_register_updates_extent_and_claims_range() {
        let mut ctx = Context::default();
        ctx.register_structure(cloud("a", 2.0), false).unwrap();
        assert_eq!(ctx.extent().bounding_box.1, Vec3::splat(2.0));
        assert_eq!(ctx.extent().length_scale, 2.0);

        let range = ctx.structure("a").unwrap().pick_range().unwrap();
        assert_eq!(range.start, 1);
        assert_eq!(range.len, 3);
    }

    #[test]
    fn test_collision_leaves_state_untouched() {
        let mut ctx = Context::default();
        ctx.register_structure(cloud("a", 2.0), false).unwrap();
        let extent = *ctx.extent();
        let next = ctx.pick_indices().next_index();

        let err = ctx.register_structure(cloud("a", 9.0), false).unwrap_err();
        assert!(matches!(err, ScenescopeError::NameCollision(_)));
        assert_eq!(*ctx.extent(), extent);
        assert_eq!(ctx.pick_indices().next_index(), next);
        assert_eq!(ctx.num_structures(), 1);
    }

    #[test]
    fn test_replace_swaps_structure_and_clears_its_selection() {
        let mut ctx = Context::default();
        ctx.register_structure(cloud("a", 2.0), false).unwrap();
        ctx.apply_pick_index(2, false);
        assert!(ctx.selection().is_some());

        ctx.register_structure(cloud("a", 5.0), true).unwrap();
        assert!(ctx.selection().is_none());
        assert_eq!(ctx.num_structures(), 1);
        assert_eq!(ctx.extent().length_scale, 5.0);
        assert_eq!(ctx.structure("a").unwrap().pick_range().unwrap().start, 4);
        // Indices of the replaced structure no longer resolve.
        assert!(ctx.apply_pick_index(2, false).is_none());
    }

    #[test]
    fn test_replace_across_categories() {
        let mut ctx = Context::default();
        ctx.register_structure(cloud("thing", 1.0), false).unwrap();
        let mesh = MockStructure::new("thing", StructureType::SurfaceMesh).boxed();
        ctx.register_structure(mesh, true).unwrap();
        assert_eq!(
            ctx.structure("thing").unwrap().structure_type(),
            StructureType::SurfaceMesh
        );
    }

    #[test]
    fn test_remove_selected_structure_clears_selection() {
        let mut ctx = Context::default();
        ctx.register_structure(cloud("a", 2.0), false).unwrap();
        ctx.register_structure(cloud("b", 1.0), false).unwrap();
        let selected = ctx.apply_pick_index(5, true).cloned().unwrap();
        assert_eq!(selected.structure_name, "b");
        assert_eq!(selected.local_index, 1);

        ctx.remove_structure("a").unwrap();
        assert!(ctx.selection().is_some());
        ctx.remove_structure("b").unwrap();
        assert!(ctx.selection().is_none());
        assert_eq!(*ctx.extent(), SceneExtent::default());

        assert!(matches!(
            ctx.remove_structure("b"),
            Err(ScenescopeError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_all() {
        let mut ctx = Context::default();
        ctx.remove_all_structures();
        ctx.register_structure(cloud("a", 2.0), false).unwrap();
        ctx.apply_pick_index(1, false);
        ctx.remove_all_structures();
        assert_eq!(ctx.num_structures(), 0);
        assert!(ctx.selection().is_none());
        assert_eq!(*ctx.extent(), SceneExtent::default());
    }

    #[test]
    fn test_with_structure_mut_reclaims_range() {
        let mut ctx = Context::default();
        ctx.register_structure(cloud("a", 2.0), false).unwrap();
        ctx.with_structure_mut::<MockStructure, _>("a", |s| {
            s.elements = 10;
            s.bbox.1 = Vec3::splat(4.0);
        })
        .unwrap();

        let range = ctx.structure("a").unwrap().pick_range().unwrap();
        assert_eq!(range.len, 10);
        assert_eq!(range.start, 4);
        assert_eq!(ctx.extent().bounding_box.1, Vec3::splat(4.0));
    }

    #[test]
    fn test_failed_reclaim_keeps_edits_and_drops_range() {
        let mut ctx = Context::default();
        ctx.register_structure(cloud("a", 2.0), false).unwrap();
        let old = ctx.structure("a").unwrap().pick_range().unwrap();
        ctx.apply_pick_index(old.start, false);

        let err = ctx
            .with_structure_mut::<MockStructure, _>("a", |s| {
                s.elements = MAX_ELEMENTS_PER_STRUCTURE + 1;
                s.bbox.1 = Vec3::splat(6.0);
            })
            .unwrap_err();
        assert!(matches!(err, ScenescopeError::GpuResource(_)));

        let structure = ctx.structure("a").unwrap();
        assert_eq!(structure.pick_range(), None);
        assert_eq!(structure.num_pick_elements(), MAX_ELEMENTS_PER_STRUCTURE + 1);
        assert_eq!(ctx.extent().bounding_box.1, Vec3::splat(6.0));
        assert!(ctx.selection().is_none());
        assert_eq!(ctx.pick_indices().resolve(old.start), None);

        // Shrinking back claims a fresh range
        ctx.with_structure_mut::<MockStructure, _>("a", |s| s.elements = 2)
            .unwrap();
        let range = ctx.structure("a").unwrap().pick_range().unwrap();
        assert_eq!(range.len, 2);
        assert!(range.start >= old.start + old.len);
    }

    #[test]
    fn test_check_name_in_use() {
        let mut ctx = Context::default();
        assert!(!ctx.check_name_in_use("a", true).unwrap());
        ctx.register_structure(cloud("a", 1.0), false).unwrap();
        assert!(ctx.check_name_in_use("a", false).unwrap());
        assert!(matches!(
            ctx.check_name_in_use("a", true),
            Err(ScenescopeError::NameCollision(_))
        ));
    }

    #[test]
    fn test_permissive_mode_swallows_errors() {
        let mut ctx = Context::default();
        let err: Result<()> = Err(ScenescopeError::NotFound("x".into()));
        assert!(ctx.report(err).is_err());

        ctx.options.error_on_failure = false;
        let err: Result<()> = Err(ScenescopeError::NotFound("x".into()));
        assert!(matches!(ctx.report(err), Ok(None)));
        assert!(matches!(ctx.report(Ok(3)), Ok(Some(3))));
    }
}
