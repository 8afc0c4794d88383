//! The `Component` marker trait and the typed handle built on top of an entity handle.
//!
//! See [`storage`] for the per-type column (`ComponentStorage<T>`) that actually owns the data;
//! this module provides the trait bound every stored type must satisfy and the ergonomic
//! `entity.component::<T>()...` handle surface. Grounded on the reference engine's
//! `ecs::component::Component` marker trait and its `EntityRef`-wrapping component accessor.

pub mod storage;

pub use storage::{ComponentStorage, StorageBase};

use std::hash::{Hash, Hasher};

use crate::entity::{Entity, EntityRef};
use crate::error::RegistryError;

/// Marker trait for types storable in a [`ComponentStorage<T>`].
///
/// `'static + Send + Sync` is required because a storage may be reached from any thread holding
/// a `&Registry` (see §5 of the concurrency model this crate implements). `Clone` is required so
/// `Registry::create_entity(source_entity)` and `Prototype::apply_to_entity` can copy a value
/// out of one entity's storage slot and into another's without the caller supplying a
/// constructor. Implement via `#[derive(Component)]` rather than by hand in ordinary use.
pub trait Component: 'static + Send + Sync + Clone {}

/// A thin, mutable wrapper over an [`Entity`] handle, typed to component `T`.
///
/// Constructed via [`Entity::component`]. Forwards to the owning registry's typed component
/// operations so call sites read `entity.component::<Position>().assign(Position { x, y })`
/// rather than `registry.assign_component::<Position>(entity.id(), ...)`.
#[derive(Clone, Copy)]
pub struct ComponentHandle<'r, T> {
    entity: Entity<'r>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<'r, T: Component> ComponentHandle<'r, T> {
    #[inline]
    pub(crate) const fn new(entity: Entity<'r>) -> Self {
        Self {
            entity,
            _marker: std::marker::PhantomData,
        }
    }

    #[inline]
    pub fn entity(&self) -> Entity<'r> {
        self.entity
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.entity.registry().exists_component::<T>(self.entity.id())
    }

    #[inline]
    pub fn find(&self) -> Option<T>
    where
        T: Clone,
    {
        self.entity.registry().find_component::<T>(self.entity.id())
    }

    #[inline]
    pub fn get(&self) -> Result<T, RegistryError>
    where
        T: Clone,
    {
        self.entity.registry().get_component::<T>(self.entity.id())
    }

    #[inline]
    pub fn assign(&self, value: T) {
        self.entity.registry().assign_component(self.entity.id(), value);
    }

    #[inline]
    pub fn ensure(&self, value: T) {
        self.entity.registry().ensure_component(self.entity.id(), value);
    }

    #[inline]
    pub fn remove(&self) -> bool {
        self.entity.registry().remove_component::<T>(self.entity.id())
    }

    #[inline]
    pub fn as_read_only(&self) -> ComponentHandleRef<'r, T> {
        ComponentHandleRef::new(self.entity.as_read_only())
    }
}

/// Hashing combines the owning registry's address with the entity id, matching [`Entity`]'s own
/// `Hash` impl — two handles for the same entity (even typed to different `T`) collide on
/// purpose, since the hash only needs to key "this entity", not "this entity + this component
/// type".
impl<T> Hash for ComponentHandle<'_, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity.hash(state);
    }
}

/// The read-only counterpart of [`ComponentHandle`]. Constructible from [`EntityRef`].
#[derive(Clone, Copy)]
pub struct ComponentHandleRef<'r, T> {
    entity: EntityRef<'r>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<'r, T: Component> ComponentHandleRef<'r, T> {
    #[inline]
    pub(crate) const fn new(entity: EntityRef<'r>) -> Self {
        Self {
            entity,
            _marker: std::marker::PhantomData,
        }
    }

    #[inline]
    pub fn entity(&self) -> EntityRef<'r> {
        self.entity
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.entity.registry().exists_component::<T>(self.entity.id())
    }

    #[inline]
    pub fn find(&self) -> Option<T>
    where
        T: Clone,
    {
        self.entity.registry().find_component::<T>(self.entity.id())
    }

    #[inline]
    pub fn get(&self) -> Result<T, RegistryError>
    where
        T: Clone,
    {
        self.entity.registry().get_component::<T>(self.entity.id())
    }
}

impl<T> Hash for ComponentHandleRef<'_, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entity.hash(state);
    }
}
