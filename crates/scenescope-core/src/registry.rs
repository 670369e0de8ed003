//! Structure registry for managing registered structures.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, ScenescopeError};
use crate::structure::{Structure, StructureType};

/// Registry for managing all structures in a scene.
///
/// Structures are grouped by category and kept in insertion order within a
/// category. Names are unique across all categories; a flat name index
/// answers "is this name taken" without walking every category.
#[derive(Default)]
pub struct Registry {
    /// Map from category -> structures in insertion order.
    categories: BTreeMap<StructureType, Vec<Box<dyn Structure>>>,
    /// Map from name -> category.
    names: HashMap<String, StructureType>,
}

impl Registry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a structure with the registry.
    ///
    /// Returns an error if any structure already uses the same name.
    pub fn insert(&mut self, structure: Box<dyn Structure>) -> Result<()> {
        let name = structure.name().to_string();
        if self.names.contains_key(&name) {
            return Err(ScenescopeError::NameCollision(name));
        }

        let ty = structure.structure_type();
        self.names.insert(name, ty);
        self.categories.entry(ty).or_default().push(structure);
        Ok(())
    }

    /// Checks if a structure with the given name exists in any category.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Returns the category of the named structure.
    pub fn type_of(&self, name: &str) -> Option<StructureType> {
        self.names.get(name).copied()
    }

    fn position(&self, name: &str) -> Result<(StructureType, usize)> {
        let ty = self
            .type_of(name)
            .ok_or_else(|| ScenescopeError::NotFound(name.to_string()))?;
        let index = self
            .categories
            .get(&ty)
            .and_then(|list| list.iter().position(|s| s.name() == name))
            .ok_or_else(|| ScenescopeError::NotFound(name.to_string()))?;
        Ok((ty, index))
    }

    /// Gets a reference to a structure by name.
    pub fn get(&self, name: &str) -> Result<&dyn Structure> {
        let (ty, index) = self.position(name)?;
        Ok(self.categories[&ty][index].as_ref())
    }

    /// Gets a mutable reference to a structure by name.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut dyn Structure> {
        let (ty, index) = self.position(name)?;
        self.categories
            .get_mut(&ty)
            .and_then(|list| list.get_mut(index))
            .map(|s| s.as_mut() as &mut dyn Structure)
            .ok_or_else(|| ScenescopeError::NotFound(name.to_string()))
    }

    /// Gets a structure by name, downcast to its concrete type.
    ///
    /// A structure of a different concrete type counts as not found.
    pub fn get_as<T: Structure>(&self, name: &str) -> Result<&T> {
        self.get(name)?
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| ScenescopeError::NotFound(name.to_string()))
    }

    /// Mutable counterpart of [`Registry::get_as`].
    pub fn get_as_mut<T: Structure>(&mut self, name: &str) -> Result<&mut T> {
        self.get_mut(name)?
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| ScenescopeError::NotFound(name.to_string()))
    }

    /// Removes a structure by name and hands it back.
    pub fn remove(&mut self, name: &str) -> Result<Box<dyn Structure>> {
        let (ty, index) = self.position(name)?;
        self.names.remove(name);
        let list = self
            .categories
            .get_mut(&ty)
            .ok_or_else(|| ScenescopeError::NotFound(name.to_string()))?;
        let removed = list.remove(index);
        if list.is_empty() {
            self.categories.remove(&ty);
        }
        Ok(removed)
    }

    /// Removes all structures from the registry.
    pub fn clear(&mut self) {
        self.categories.clear();
        self.names.clear();
    }

    /// Returns an iterator over all structures, in category then insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Structure> {
        self.categories
            .values()
            .flat_map(|list| list.iter())
            .map(|s| s.as_ref())
    }

    /// Returns a mutable iterator over all structures, in the same order as [`Registry::iter`].
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut dyn Structure> + '_ {
        self.categories
            .values_mut()
            .flat_map(|list| list.iter_mut())
            .map(|s| s.as_mut() as &mut dyn Structure)
    }

    /// Returns all structures of one category, in insertion order.
    pub fn iter_category(&self, ty: StructureType) -> impl Iterator<Item = &dyn Structure> {
        self.categories
            .get(&ty)
            .into_iter()
            .flat_map(|list| list.iter())
            .map(|s| s.as_ref())
    }

    /// Returns the structures of one category for in-place mutation.
    pub fn category_mut(&mut self, ty: StructureType) -> &mut [Box<dyn Structure>] {
        self.categories
            .get_mut(&ty)
            .map_or(&mut [], |list| list.as_mut_slice())
    }

    /// Returns the non-empty categories with their structure counts.
    pub fn category_counts(&self) -> impl Iterator<Item = (StructureType, usize)> + '_ {
        self.categories.iter().map(|(ty, list)| (*ty, list.len()))
    }

    /// Returns the total number of registered structures.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
