//! [`Registry`]: the owning façade tying entities, component storages, and features together.
//!
//! Grounded on the reference engine's `ecs::registry::Registry`, which plays the same role in
//! the teacher's own archetype/table engine (entity allocation, storage lookup, feature table)
//! before that engine moved from per-type sparse columns to shared archetype tables. This
//! rendition keeps the teacher's sparse-column approach (see `sparse.rs`/`component/storage.rs`)
//! rather than following it onto tables, per this crate's own storage design.

use std::any::type_name;
use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use log::{trace, warn};

use crate::component::{Component, ComponentStorage, StorageBase};
use crate::entity::{Entity, EntityId, EntityRef, MAX_INDEX};
use crate::error::{NotFoundKind, RegistryError};
use crate::feature::{Event, Feature, FeatureSlot};
use crate::option::Option as Opt;
use crate::prototype::Prototype;
use crate::sparse::SparseSet;
use crate::type_family::{FamilyId, TypeFamily};

struct EntityTable {
    last_index: u32,
    free_ids: Vec<EntityId>,
    live: SparseSet<EntityId, EntityId>,
}

impl EntityTable {
    fn new() -> Self {
        Self {
            last_index: 0,
            free_ids: Vec::new(),
            live: SparseSet::new(),
        }
    }
}

/// Byte totals returned by [`Registry::memory_usage`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    /// Bytes owned by the entity liveness set and free-id list.
    pub entities: usize,
    /// Bytes owned by every component storage's dense/sparse allocations.
    pub components: usize,
}

/// The central owner of entities, component storages, and features.
///
/// Every public method takes `&self`: internal mutability is provided by the `RwLock`s guarding
/// the entity table and the feature table, and by the per-storage `RwLock` inside each
/// [`ComponentStorage<T>`] (see §5 of the concurrency model this crate implements). This lets
/// `Registry` be shared across threads as a plain `&Registry` rather than requiring callers to
/// wrap it in their own `Mutex`/`RwLock`.
pub struct Registry {
    entities: RwLock<EntityTable>,
    storages: DashMap<FamilyId, Arc<dyn StorageBase>>,
    features: RwLock<DashMap<FamilyId, FeatureSlot>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(EntityTable::new()),
            storages: DashMap::new(),
            features: RwLock::new(DashMap::new()),
        }
    }

    // ---- entity lifecycle -------------------------------------------------------------

    /// Allocate a fresh entity: reuse a destroyed slot (with its version bumped) if one is
    /// free, otherwise claim the next index. Fails with [`RegistryError::IdentitySpaceExhausted`]
    /// once every one of the 2^22 - 1 indices is live.
    pub fn create_entity(&self) -> Result<Entity<'_>, RegistryError> {
        let mut table = self.entities.write().expect("entity table lock poisoned");
        let id = Self::allocate_id(&mut table)?;
        trace!("created entity {}:{}", id.index(), id.version());
        Ok(Entity::new(self, id))
    }

    /// Allocate a fresh entity and apply `prototype` to it with `override_existing = true`.
    pub fn create_entity_with(&self, prototype: &Prototype) -> Result<Entity<'_>, RegistryError> {
        let entity = self.create_entity()?;
        prototype.apply_to_entity(self, entity.id(), true);
        Ok(entity)
    }

    /// Allocate a fresh entity and copy every cloneable component from `source` onto it.
    pub fn clone_entity(&self, source: EntityId) -> Result<Entity<'_>, RegistryError> {
        let entity = self.create_entity()?;
        for storage in self.storages.iter() {
            storage.value().clone_component(source, entity.id());
        }
        Ok(entity)
    }

    fn allocate_id(table: &mut EntityTable) -> Result<EntityId, RegistryError> {
        let id = if let Some(reused) = table.free_ids.pop() {
            reused.upgrade()
        } else {
            if table.last_index >= MAX_INDEX {
                return Err(RegistryError::IdentitySpaceExhausted);
            }
            let index = table.last_index;
            table.last_index += 1;
            EntityId::join(index, 0)
        };

        let live_count = table.live.len();
        if live_count as u64 >= (MAX_INDEX as u64 * 99) / 100 {
            warn!("entity identity space within 1% of exhaustion ({live_count} live)");
        }

        let target = live_count + 1;
        if table.free_ids.capacity() < target {
            table.free_ids.reserve(target - table.free_ids.len());
        }
        table.live.insert(id);
        Ok(id)
    }

    /// Remove `id` from the liveness set, remove it from every component storage, and push it
    /// onto the free list for reuse (with its version bumped on next allocation).
    pub fn destroy_entity(&self, id: EntityId) -> bool {
        let removed = {
            let mut table = self.entities.write().expect("entity table lock poisoned");
            let removed = table.live.unordered_erase(&id);
            if removed {
                table.free_ids.push(id);
            }
            removed
        };

        if !removed {
            warn!(
                "destroy_entity called on an already-invalid handle ({}:{})",
                id.index(),
                id.version()
            );
            debug_assert!(removed, "destroy_entity requires a valid handle");
            return false;
        }

        for storage in self.storages.iter() {
            storage.value().remove(id);
        }
        trace!("destroyed entity {}:{}", id.index(), id.version());
        true
    }

    pub fn valid_entity(&self, id: EntityId) -> bool {
        let table = self.entities.read().expect("entity table lock poisoned");
        table.live.has(&id)
    }

    /// Wrap a raw id into a handle without checking liveness. Useful for round-tripping an id a
    /// caller stored externally.
    pub fn wrap_entity(&self, id: EntityId) -> Entity<'_> {
        Entity::new(self, id)
    }

    pub fn entity_count(&self) -> usize {
        let table = self.entities.read().expect("entity table lock poisoned");
        table.live.len()
    }

    /// Create a fresh entity and return an [`crate::filler::EntityFiller`] chaining
    /// `component::<T>(value)` calls onto it.
    ///
    /// # Panics
    ///
    /// Panics if the entity identity space is exhausted. Callers that need to handle this
    /// gracefully should call [`Registry::create_entity`] directly instead.
    pub fn fill_entity(&self) -> crate::filler::EntityFiller<'_> {
        let entity = self.create_entity().expect("entity identity space exhausted");
        crate::filler::EntityFiller::new(self, entity.id())
    }

    /// A [`crate::filler::RegistryFiller`] chaining `feature::<Tag>()`/`system::<Tag>(...)`
    /// calls onto this registry.
    pub fn fill(&self) -> crate::filler::RegistryFiller<'_> {
        crate::filler::RegistryFiller::new(self)
    }

    // ---- component ops ------------------------------------------------------------------

    fn get_or_create_storage<T: Component>(&self) -> Arc<dyn StorageBase> {
        let family = TypeFamily::<T>::id();
        self.storages
            .entry(family)
            .or_insert_with(|| {
                trace!("lazily creating component storage for {}", type_name::<T>());
                Arc::new(ComponentStorage::<T>::new()) as Arc<dyn StorageBase>
            })
            .clone()
    }

    fn find_storage<T: Component>(&self) -> Option<Arc<dyn StorageBase>> {
        let family = TypeFamily::<T>::id();
        self.storages.get(&family).map(|entry| entry.value().clone())
    }

    fn typed<T: Component>(erased: &Arc<dyn StorageBase>) -> &ComponentStorage<T> {
        erased
            .as_any()
            .downcast_ref::<ComponentStorage<T>>()
            .expect("family id collision: stored type mismatch")
    }

    pub fn assign_component<T: Component>(&self, id: EntityId, value: T) {
        let erased = self.get_or_create_storage::<T>();
        Self::typed::<T>(&erased).assign(id, value);
    }

    /// Insert `value` for `id` only if `T` is absent. Returns whether an insert happened.
    pub fn ensure_component<T: Component>(&self, id: EntityId, value: T) -> bool {
        let erased = self.get_or_create_storage::<T>();
        Self::typed::<T>(&erased).ensure(id, value)
    }

    pub fn remove_component<T: Component>(&self, id: EntityId) -> bool {
        let removed = match self.find_storage::<T>() {
            Some(erased) => Self::typed::<T>(&erased).remove(id),
            None => false,
        };

        if !removed && !self.valid_entity(id) {
            warn!(
                "remove_component::<{}> called on an already-invalid handle ({}:{})",
                type_name::<T>(),
                id.index(),
                id.version()
            );
            debug_assert!(removed, "remove_component requires a valid handle");
        }

        removed
    }

    pub fn exists_component<T: Component>(&self, id: EntityId) -> bool {
        match self.find_storage::<T>() {
            Some(erased) => Self::typed::<T>(&erased).has(id),
            None => false,
        }
    }

    pub fn get_component<T: Component>(&self, id: EntityId) -> Result<T, RegistryError> {
        self.find_component(id)
            .ok_or(RegistryError::NotFound(NotFoundKind::Component))
    }

    pub fn find_component<T: Component>(&self, id: EntityId) -> Option<T> {
        let erased = self.find_storage::<T>()?;
        Self::typed::<T>(&erased).find(id)
    }

    /// Fetch every type in `Ts` for `id` at once, failing the whole call if any is absent. See
    /// [`crate::aspect::FetchTuple`] for why this returns owned clones rather than references.
    pub fn get_components<Ts: crate::aspect::FetchTuple>(
        &self,
        id: EntityId,
    ) -> Result<Ts, RegistryError> {
        Ts::get_all(self, id)
    }

    /// Fetch every type in `Ts` for `id` at once, or `None` if any is absent.
    pub fn find_components<Ts: crate::aspect::FetchTuple>(&self, id: EntityId) -> Option<Ts> {
        Ts::find_all(self, id)
    }

    /// Remove every component on `id`, across every registered storage. Returns the count
    /// removed. Does not touch the entity's liveness.
    pub fn remove_all_components(&self, id: EntityId) -> usize {
        self.storages
            .iter()
            .filter(|entry| entry.value().remove(id))
            .count()
    }

    /// Clear every component of type `T`, across every entity. Returns the count removed.
    pub fn clear_components<T: Component>(&self) -> usize {
        match self.find_storage::<T>() {
            Some(erased) => Self::typed::<T>(&erased).remove_all(),
            None => 0,
        }
    }

    pub fn component_count<T: Component>(&self) -> usize {
        self.find_storage::<T>()
            .map(|erased| Self::typed::<T>(&erased).count())
            .unwrap_or(0)
    }

    pub fn entity_component_count(&self, id: EntityId) -> usize {
        self.storages.iter().filter(|entry| entry.value().has(id)).count()
    }

    // ---- iteration ------------------------------------------------------------------------

    /// Invoke `f` for every live entity matching `opts`, in entity-table dense order.
    ///
    /// The live-id list is snapshotted before `f` runs, so destroying/creating entities from
    /// within `f` does not change which entities this call visits.
    pub fn for_each_entity(&self, mut f: impl FnMut(Entity<'_>), opts: impl Opt) {
        let ids: Vec<EntityId> = {
            let table = self.entities.read().expect("entity table lock poisoned");
            table.live.dense().to_vec()
        };
        for id in ids {
            let entity = Entity::new(self, id);
            if opts.matches(entity.as_read_only()) {
                f(entity);
            }
        }
    }

    /// Invoke `f` for every `(entity, &value)` currently stored for `T`, under a shared lock on
    /// `T`'s storage.
    pub fn for_each_component<T: Component>(&self, f: impl FnMut(Entity<'_>, &T)) {
        let Some(erased) = self.find_storage::<T>() else {
            return;
        };
        let mut f = f;
        Self::typed::<T>(&erased).for_each_component(|id, value| f(Entity::new(self, id), value));
    }

    /// The joined-iteration primitive every [`crate::aspect::Aspect`] delegates to: iterate
    /// `T1`'s storage (the driver — always the first type in `Ts`), skipping entities absent
    /// any of `T2..Tn` or failing `opts`. See [`crate::aspect::JoinedTuple`] for the tuple-arity
    /// dispatch that calls into this.
    pub fn for_joined_components<Ts: crate::aspect::JoinedTuple>(
        &self,
        f: impl FnMut(Entity<'_>, Ts),
        opts: impl Opt,
    ) {
        Ts::for_joined(self, f, opts)
    }

    pub(crate) fn with_driver_storage<T: Component>(
        &self,
        f: impl FnOnce(&ComponentStorage<T>),
    ) {
        if let Some(erased) = self.find_storage::<T>() {
            f(Self::typed::<T>(&erased));
        }
    }

    pub(crate) fn storage_exists<T: Component>(&self) -> bool {
        self.storages.contains_key(&TypeFamily::<T>::id())
    }

    // ---- features/events --------------------------------------------------------------------

    /// Create an empty, enabled feature for `Tag` if one doesn't already exist.
    pub fn ensure_feature<Tag: 'static>(&self) {
        let family = TypeFamily::<Tag>::id();
        let features = self.features.read().expect("feature table lock poisoned");
        features.entry(family).or_insert_with(|| FeatureSlot::new(Feature::new()));
    }

    pub fn has_feature<Tag: 'static>(&self) -> bool {
        let features = self.features.read().expect("feature table lock poisoned");
        features.contains_key(&TypeFamily::<Tag>::id())
    }

    /// Append `system` to `Tag`'s feature, creating the feature first if needed.
    pub fn add_system<Tag: 'static>(&self, system: crate::feature::System) {
        self.ensure_feature::<Tag>();
        let features = self.features.read().expect("feature table lock poisoned");
        let slot = features
            .get(&TypeFamily::<Tag>::id())
            .expect("feature was just ensured");
        slot.lock().expect("feature lock poisoned").add_system(system);
    }

    pub fn enable_feature<Tag: 'static>(&self) {
        self.with_feature::<Tag, _>(|feature| feature.enable());
    }

    pub fn disable_feature<Tag: 'static>(&self) {
        self.with_feature::<Tag, _>(|feature| feature.disable());
    }

    pub fn is_feature_enabled<Tag: 'static>(&self) -> bool {
        self.with_feature::<Tag, _>(|feature| feature.is_enabled()).unwrap_or(false)
    }

    /// Run `f` against `Tag`'s feature under its own lock, or `None` if no feature is registered
    /// for `Tag`. The Rust rendition's counterpart to a direct `get_feature<Tag>()` accessor: a
    /// `Feature` lives behind a [`FeatureSlot`] mutex, so handing out a bare `&mut Feature` would
    /// either outlive the lock guard or require a self-referential return type: a scoped closure
    /// avoids both.
    pub fn with_feature<Tag: 'static, R>(&self, f: impl FnOnce(&mut Feature) -> R) -> Option<R> {
        let features = self.features.read().expect("feature table lock poisoned");
        let Some(slot) = features.get(&TypeFamily::<Tag>::id()) else {
            warn!("feature lookup missed for {}", type_name::<Tag>());
            return None;
        };
        Some(f(&mut slot.lock().expect("feature lock poisoned")))
    }

    /// Dispatch `event` to every registered feature's systems, each under its own lock (a
    /// disabled feature is skipped entirely). Feature iteration order is unspecified; system
    /// order within a feature is insertion order (see [`Feature::process_event`]).
    pub fn process_event<E: Event>(&self, event: &E) {
        let features = self.features.read().expect("feature table lock poisoned");
        for entry in features.iter() {
            entry
                .value()
                .lock()
                .expect("feature lock poisoned")
                .process_event(self, event);
        }
    }

    // ---- introspection ------------------------------------------------------------------------

    pub fn memory_usage(&self) -> MemoryUsage {
        let entities = {
            let table = self.entities.read().expect("entity table lock poisoned");
            table.live.dense_bytes()
                + table.live.sparse_bytes()
                + table.free_ids.capacity() * std::mem::size_of::<EntityId>()
        };
        let components = self
            .storages
            .iter()
            .map(|entry| entry.value().memory_usage())
            .sum();
        MemoryUsage { entities, components }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::System;
    use crate::option::exists;

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
    fn basic_lifecycle_s1() {
        // Given (S1)
        let registry = Registry::new();
        let e1 = registry.create_entity().unwrap();
        let e2 = registry.create_entity().unwrap();
        registry.assign_component(e1.id(), Position { x: 1, y: 2 });
        registry.assign_component(e1.id(), Velocity { x: 3, y: 4 });
        registry.assign_component(e2.id(), Position { x: 5, y: 6 });
        registry.assign_component(e2.id(), Velocity { x: 7, y: 8 });

        // When
        let mut id_sum = 0u64;
        let mut x_sum = 0i32;
        registry.for_joined_components::<(Position, Velocity)>(
            |entity, (p, v)| {
                id_sum += entity.id().index() as u64;
                x_sum += p.x + v.x;
            },
            crate::option::Always,
        );

        // Then
        assert_eq!(
            id_sum,
            e1.id().index() as u64 + e2.id().index() as u64
        );
        assert_eq!(x_sum, 16);

        // When: destroy e1
        registry.destroy_entity(e1.id());
        let mut id_sum2 = 0u64;
        let mut x_sum2 = 0i32;
        registry.for_joined_components::<(Position, Velocity)>(
            |entity, (p, v)| {
                id_sum2 += entity.id().index() as u64;
                x_sum2 += p.x + v.x;
            },
            crate::option::Always,
        );

        // Then
        assert_eq!(id_sum2, e2.id().index() as u64);
        assert_eq!(x_sum2, 12);
    }

    #[test]
    fn option_algebra_s3() {
        // Given (S3)
        let registry = Registry::new();
        let a = registry.create_entity().unwrap();
        let b = registry.create_entity().unwrap();
        let c = registry.create_entity().unwrap();
        registry.assign_component(a.id(), Position { x: 0, y: 0 });
        registry.assign_component(b.id(), Velocity { x: 0, y: 0 });
        registry.assign_component(c.id(), Position { x: 0, y: 0 });
        registry.assign_component(c.id(), Velocity { x: 0, y: 0 });

        // When
        let mut both = Vec::new();
        registry.for_each_entity(
            |e| both.push(e.id().index()),
            exists::<Position>() & exists::<Velocity>(),
        );

        let mut either = Vec::new();
        registry.for_each_entity(
            |e| either.push(e.id().index()),
            exists::<Position>() | exists::<Velocity>(),
        );

        let mut lacks_position = Vec::new();
        registry.for_each_entity(
            |e| lacks_position.push(e.id().index()),
            !exists::<Position>(),
        );

        // Then
        assert_eq!(both, vec![c.id().index()]);
        either.sort();
        let mut expected = vec![a.id().index(), b.id().index(), c.id().index()];
        expected.sort();
        assert_eq!(either, expected);
        assert_eq!(lacks_position, vec![b.id().index()]);
    }

    #[test]
    fn version_wrap_detection_s5() {
        // Given (S5)
        let registry = Registry::new();
        let e = registry.create_entity().unwrap();
        let id0 = e.id();

        // When
        registry.destroy_entity(id0);
        registry.create_entity().unwrap();

        // Then
        assert!(!registry.valid_entity(id0));
    }

    #[test]
    fn remove_all_components_leaves_entity_alive_p7() {
        // Given (P7)
        let registry = Registry::new();
        let e = registry.create_entity().unwrap();
        registry.assign_component(e.id(), Position { x: 1, y: 1 });
        registry.assign_component(e.id(), Velocity { x: 1, y: 1 });

        // When
        registry.remove_all_components(e.id());

        // Then
        assert!(registry.valid_entity(e.id()));
        assert_eq!(registry.entity_component_count(e.id()), 0);
    }

    #[test]
    fn empty_component_marker_s6() {
        // Given (S6)
        #[derive(Debug, Clone, Copy, PartialEq)]
        struct Marker;
        impl Component for Marker {}

        let registry = Registry::new();
        let mut ids = Vec::new();
        for _ in 0..100 {
            let e = registry.create_entity().unwrap();
            registry.assign_component(e.id(), Marker);
            ids.push(e.id());
        }

        // When
        let mut visited = Vec::new();
        registry.for_joined_components::<(Marker,)>(
            |entity, _| visited.push(entity.id()),
            crate::option::Always,
        );

        // Then
        assert_eq!(registry.component_count::<Marker>(), 100);
        assert_eq!(visited.len(), 100);
    }

    #[test]
    fn version_wraps_after_2_10_destroy_create_cycles_b2() {
        // Given (B2)
        let registry = Registry::new();
        let first = registry.create_entity().unwrap();
        let index = first.id().index();
        let original_version = first.id().version();
        registry.destroy_entity(first.id());

        // When: cycle the same slot through destroy/create 2^10 times
        let mut last_id = first.id();
        for _ in 0..1023 {
            let reused = registry.create_entity().unwrap();
            assert_eq!(reused.id().index(), index);
            last_id = reused.id();
            registry.destroy_entity(last_id);
        }
        let final_entity = registry.create_entity().unwrap();

        // Then: the version field has wrapped back to the value it started at
        assert_eq!(final_entity.id().index(), index);
        assert_eq!(final_entity.id().version(), original_version);
    }

    #[test]
    fn identity_space_exhausted_past_max_index_b1() {
        // Given (B1): fill every index up to MAX_INDEX
        let registry = Registry::new();
        for _ in 0..MAX_INDEX {
            registry.create_entity().expect("every index up to MAX_INDEX should allocate");
        }
        assert_eq!(registry.entity_count(), MAX_INDEX as usize);

        // When / Then: one more allocation has nowhere to go
        assert_eq!(
            registry.create_entity().err(),
            Some(RegistryError::IdentitySpaceExhausted)
        );
    }

    #[test]
    #[should_panic(expected = "destroy_entity requires a valid handle")]
    fn destroy_entity_on_invalid_handle_panics_in_debug() {
        // Given
        let registry = Registry::new();
        let e = registry.create_entity().unwrap();
        registry.destroy_entity(e.id());

        // When / Then: destroying an already-invalid handle trips the debug assertion
        registry.destroy_entity(e.id());
    }

    #[test]
    #[should_panic(expected = "remove_component requires a valid handle")]
    fn remove_component_on_invalid_handle_panics_in_debug() {
        // Given
        let registry = Registry::new();
        let e = registry.create_entity().unwrap();
        registry.destroy_entity(e.id());

        // When / Then
        registry.remove_component::<Position>(e.id());
    }

    #[test]
    fn with_feature_reaches_the_feature_directly() {
        // Given
        struct Physics;
        let registry = Registry::new();
        registry.ensure_feature::<Physics>();
        registry.add_system::<Physics>(System::builder().build());
        registry.add_system::<Physics>(System::builder().build());

        // When
        let count = registry.with_feature::<Physics, _>(|feature| feature.system_count());

        // Then
        assert_eq!(count, Some(2));
        assert_eq!(registry.with_feature::<Physics, usize>(|_| 0), Some(0));

        // A tag with no feature registered misses cleanly.
        struct Unregistered;
        assert_eq!(registry.with_feature::<Unregistered, ()>(|_| ()), None);
    }

    #[test]
    fn batch_get_and_find_components() {
        // Given
        let registry = Registry::new();
        let e = registry.create_entity().unwrap();
        registry.assign_component(e.id(), Position { x: 9, y: 9 });

        // Then: missing Velocity makes the batch fetch fail as a whole
        assert_eq!(registry.find_components::<(Position, Velocity)>(e.id()), None);
        assert!(registry.get_components::<(Position, Velocity)>(e.id()).is_err());

        // When both types are present
        registry.assign_component(e.id(), Velocity { x: 1, y: 1 });

        // Then
        let (p, v) = registry.get_components::<(Position, Velocity)>(e.id()).unwrap();
        assert_eq!(p, Position { x: 9, y: 9 });
        assert_eq!(v, Velocity { x: 1, y: 1 });
    }

    #[test]
    fn create_entity_clones_components() {
        // Given
        let registry = Registry::new();
        let source = registry.create_entity().unwrap();
        registry.assign_component(source.id(), Position { x: 4, y: 4 });

        // When
        let clone = registry.clone_entity(source.id()).unwrap();

        // Then
        assert_eq!(
            registry.get_component::<Position>(clone.id()),
            Ok(Position { x: 4, y: 4 })
        );
    }
}
