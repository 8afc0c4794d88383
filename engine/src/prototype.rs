//! Type-erased deferred component construction: [`Prototype`] and the per-type [`Applier`] it
//! holds, for bulk entity setup (`Registry::create_entity_with`) and entity cloning.
//!
//! Grounded on the reference engine's `ecs::prototype::Applier` / `Blueprint`, which the teacher
//! itself describes as "a value bag you can stamp onto any number of entities". The Rust
//! rendition collapses the original's "construction arguments" tuple into the component value
//! itself: since [`ComponentStorage::assign`](crate::component::ComponentStorage::assign) takes a
//! ready-built `T` rather than a variadic constructor call, an applier simply owns one `T` and
//! clones it out on each application.

use std::any::Any;

use crate::component::Component;
use crate::entity::EntityId;
use crate::registry::Registry;
use crate::sparse::SparseMap;
use crate::type_family::{FamilyId, TypeFamily};

/// Object-safe, type-erased operations [`Prototype`] needs from an [`Applier<T>`] without
/// knowing `T`.
trait ApplierBase: Send + Sync {
    fn apply_to_entity(&self, registry: &Registry, id: EntityId, override_existing: bool);
    fn clone_box(&self) -> Box<dyn ApplierBase>;
    fn as_any(&self) -> &dyn Any;
}

/// A captured component value of type `T`, ready to be stamped onto any number of entities.
#[derive(Clone)]
pub struct Applier<T> {
    value: T,
}

impl<T: Component> Applier<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// Overwrite `component` in place with this applier's captured value. Always succeeds —
    /// the `bool` return exists for parity with the trait used elsewhere in this module to mark
    /// "was a value applied".
    pub fn apply_to_component(&self, component: &mut T) -> bool {
        *component = self.value.clone();
        true
    }
}

impl<T: Component> ApplierBase for Applier<T> {
    fn apply_to_entity(&self, registry: &Registry, id: EntityId, override_existing: bool) {
        if override_existing {
            registry.assign_component(id, self.value.clone());
        } else {
            registry.ensure_component(id, self.value.clone());
        }
    }

    fn clone_box(&self) -> Box<dyn ApplierBase> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A set of deferred component constructors, keyed by component [`FamilyId`], that can be
/// stamped onto an entity in one call.
///
/// `Prototype` is `Clone`, not `Copy` — applying a prototype never needs to "empty" it
/// afterward (the distilled spec's "prototype after move is empty" invariant is satisfied
/// structurally by Rust's move semantics: a `Prototype` passed by value to
/// `Registry::create_entity_with` is simply gone from the caller's scope, there is no
/// moved-from-but-still-readable state to account for).
#[derive(Default)]
pub struct Prototype {
    appliers: SparseMap<FamilyId, Box<dyn ApplierBase>, FamilyId>,
}

impl Clone for Prototype {
    fn clone(&self) -> Self {
        let mut appliers = SparseMap::new();
        for (family, applier) in self.appliers.iter() {
            appliers.insert(*family, applier.clone_box());
        }
        Self { appliers }
    }
}

impl Prototype {
    pub fn new() -> Self {
        Self {
            appliers: SparseMap::new(),
        }
    }

    /// Record (or replace) the applier for `T`, returning `self` for chaining.
    pub fn component<T: Component>(mut self, value: T) -> Self {
        let family = TypeFamily::<T>::id();
        self.appliers
            .insert_or_assign(family, Box::new(Applier::new(value)));
        self
    }

    /// Whether an applier for `T` is recorded.
    pub fn has_component<T: Component>(&self) -> bool {
        self.appliers.contains(&TypeFamily::<T>::id())
    }

    /// Union this prototype with `other`. On a collision (both define `T`), `other`'s applier
    /// wins if `override_existing` is true, otherwise this prototype's applier is kept.
    pub fn merge_with(mut self, other: &Prototype, override_existing: bool) -> Self {
        for (family, applier) in other.appliers.iter() {
            if override_existing || !self.appliers.contains(family) {
                self.appliers.insert_or_assign(*family, applier.clone_box());
            }
        }
        self
    }

    /// Apply every recorded applier to `id`. With `override_existing = false`, any component
    /// already present on the entity is left untouched (P8).
    pub fn apply_to_entity(&self, registry: &Registry, id: EntityId, override_existing: bool) {
        for (_, applier) in self.appliers.iter() {
            applier.apply_to_entity(registry, id, override_existing);
        }
    }

    /// If this prototype recorded an applier for `T`, overwrite `component` in place and return
    /// `true`; otherwise leave it untouched and return `false`.
    pub fn apply_to_component<T: Component>(&self, component: &mut T) -> bool {
        let family = TypeFamily::<T>::id();
        let Some(applier) = self.appliers.get(&family) else {
            return false;
        };
        let typed = applier
            .as_any()
            .downcast_ref::<Applier<T>>()
            .expect("family id collision: applier type mismatch");
        typed.apply_to_component(component)
    }

    pub fn len(&self) -> usize {
        self.appliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appliers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: i32,
        y: i32,
    }
    impl Component for Position {}

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        x: i32,
        y: i32,
    }
    impl Component for Velocity {}

    #[test]
    fn apply_to_entity_assigns_every_recorded_component() {
        // Given (S2)
        let registry = Registry::new();
        let proto = Prototype::new()
            .component(Position { x: 9, y: 9 })
            .component(Velocity { x: 1, y: 1 });
        let e = registry.create_entity().unwrap();

        // When
        proto.apply_to_entity(&registry, e.id(), true);

        // Then
        assert_eq!(
            registry.get_component::<Position>(e.id()),
            Ok(Position { x: 9, y: 9 })
        );
        assert_eq!(
            registry.get_component::<Velocity>(e.id()),
            Ok(Velocity { x: 1, y: 1 })
        );
    }

    #[test]
    fn apply_without_override_preserves_existing_component() {
        // Given (P8)
        let registry = Registry::new();
        let e = registry.create_entity().unwrap();
        registry.assign_component(e.id(), Position { x: 1, y: 2 });
        let proto = Prototype::new().component(Position { x: 9, y: 9 });

        // When
        proto.apply_to_entity(&registry, e.id(), false);

        // Then
        assert_eq!(
            registry.get_component::<Position>(e.id()),
            Ok(Position { x: 1, y: 2 })
        );
    }

    #[test]
    fn merge_with_override_prefers_other() {
        // Given
        let base = Prototype::new().component(Position { x: 1, y: 1 });
        let other = Prototype::new().component(Position { x: 2, y: 2 });

        // When
        let merged = base.merge_with(&other, true);

        // Then
        let registry = Registry::new();
        let e = registry.create_entity().unwrap();
        merged.apply_to_entity(&registry, e.id(), true);
        assert_eq!(
            registry.get_component::<Position>(e.id()),
            Ok(Position { x: 2, y: 2 })
        );
    }

    #[test]
    fn clone_is_a_deep_copy() {
        // Given
        let proto = Prototype::new().component(Position { x: 1, y: 1 });

        // When
        let cloned = proto.clone();

        // Then
        assert_eq!(proto.len(), cloned.len());
        assert!(cloned.has_component::<Position>());
    }
}
