//! Process-wide monotonic type ids ("family ids") for component and feature-tag types.
//!
//! Every distinct Rust type used as a component or a feature tag gets exactly one
//! [`FamilyId`], allocated the first time [`TypeFamily::id`] is asked about it and stable for
//! the remaining life of the process. Family ids are dense keys into the registry's storage
//! and feature tables; their numeric value carries no other meaning.
//!
//! # Thread safety
//!
//! Allocation is lock-free on the read path via `DashMap`, matching the reference engine's own
//! component-id registry: a cache hit never blocks, and a cache miss only contends with other
//! misses for the *same* type (DashMap shards the table internally).

use std::any::{TypeId, type_name};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;

/// A process-wide, dense identifier for a component or feature-tag type.
///
/// Family ids are allocated from a single monotonic counter shared by every [`Registry`] in the
/// process, so two registries always agree on the id for a given type. Ordering between ids is
/// unspecified and must not be relied upon.
///
/// [`Registry`]: crate::registry::Registry
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FamilyId(u32);

impl FamilyId {
    /// Get the index of this id for use in indexable storage (e.g. a `Vec` or sparse set).
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for FamilyId {
    #[inline]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<usize> for FamilyId {
    #[inline]
    fn from(value: usize) -> Self {
        Self(value as u32)
    }
}

/// Lets a [`FamilyId`] key its own sparse map/set directly, the way an entity index does for
/// `EntityId`.
impl crate::sparse::Indexer<FamilyId> for FamilyId {
    #[inline]
    fn index_of(value: &FamilyId) -> usize {
        value.index()
    }
}

struct Allocator {
    type_map: DashMap<TypeId, FamilyId>,
    next_id: AtomicU32,
}

impl Allocator {
    fn new() -> Self {
        Self {
            type_map: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }

    fn id_of<T: 'static>(&self) -> FamilyId {
        let type_id = TypeId::of::<T>();

        // Fast path: already allocated, lock-free read.
        if let Some(id) = self.type_map.get(&type_id) {
            return *id;
        }

        // Slow path: use the entry API so two threads racing on the same unregistered `T`
        // converge on the same id instead of each allocating one.
        *self
            .type_map
            .entry(type_id)
            .or_insert_with(|| {
                let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
                assert!(
                    raw != u32::MAX,
                    "type family id space exhausted while registering {}",
                    type_name::<T>()
                );
                FamilyId(raw)
            })
            .value()
    }
}

fn allocator() -> &'static Allocator {
    static ALLOCATOR: OnceLock<Allocator> = OnceLock::new();
    ALLOCATOR.get_or_init(Allocator::new)
}

/// A zero-sized handle onto the type-family scheme for a specific `T`.
///
/// `TypeFamily::<T>::id()` is the Rust rendition of the distilled spec's `type_family<T>::id()`:
/// a non-zero-cost call (after the first invocation per type) returning the stable
/// process-wide [`FamilyId`] for `T`.
pub struct TypeFamily<T: 'static> {
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: 'static> TypeFamily<T> {
    /// Get the stable family id for `T`, allocating one on first use.
    #[inline]
    pub fn id() -> FamilyId {
        allocator().id_of::<T>()
    }
}
