//! `Aspect<Ts>`: a compile-time bundle of required component types, plus the tuple-arity trait
//! impls (`ExistsAny`/`ExistsAll`/`JoinedTuple`) that back it and the registry's joined iteration.
//!
//! Rust has no variadic generics, so "a pack of component types" is rendered the way the
//! reference engine renders its own `component::Spec`/`Set`/`Values` tuple families: a
//! declarative macro (`all_tuples!`, from `util.rs`) stamps out one trait impl per tuple arity
//! from 1 to 16. `(Position,)` through `(Position, Velocity, ..., up to 16 types)` each get their
//! own `ExistsAny`/`ExistsAll`/`JoinedTuple` impl; there is no sixteen-plus case, matching
//! `all_tuples!`'s own documented ceiling.

use std::marker::PhantomData;

use crate::component::Component;
use crate::entity::{Entity, EntityRef};
use crate::error::{NotFoundKind, RegistryError};
use crate::option::{AllOf, ExistsAll, ExistsAny, Option as Opt, exists_all};
use crate::registry::Registry;

/// Implemented for tuples of [`Component`] types: the registry's joined-iteration primitive for
/// `(T1, ..., Tn)`, with `T1` as the driver (§4.I "Joined iteration algorithm" — the leftmost
/// type is canonical, a performance contract callers can lean on, not an internal heuristic).
pub trait JoinedTuple: Sized {
    /// Iterate the driver's (`T1`'s) storage, skipping any entity missing one of `T2..Tn` or
    /// failing `opts`, invoking `f` once per matching entity with its cloned component values.
    fn for_joined(registry: &Registry, f: impl FnMut(Entity<'_>, Self), opts: impl Opt);
}

/// Implemented for tuples of [`Component`] types backing [`Registry::get_components`] and
/// [`Registry::find_components`]. A single-type [`Registry::find_component`] returns an owned
/// clone rather than a reference (the value is read out from under a per-storage `RwLock` guard
/// that doesn't outlive the call), and the batch form follows the same convention rather than
/// attempting to hand back a tuple of references into storages locked one at a time.
pub trait FetchTuple: Sized {
    fn find_all(registry: &Registry, id: crate::entity::EntityId) -> Option<Self>;

    fn get_all(registry: &Registry, id: crate::entity::EntityId) -> Result<Self, RegistryError> {
        Self::find_all(registry, id).ok_or(RegistryError::NotFound(NotFoundKind::Component))
    }
}

/// A static facade over a fixed tuple of required component types.
///
/// `Aspect<(Position, Velocity)>::to_option()` is the conjunction `exists::<Position>() &&
/// exists::<Velocity>()`; `Aspect::<(Position, Velocity)>::for_joined_components(...)` drives the
/// registry's joined iteration with `Position` as the driver.
pub struct Aspect<Ts> {
    _marker: PhantomData<fn() -> Ts>,
}

impl<Ts: ExistsAll> Aspect<Ts> {
    /// The conjunction of `exists::<T>()` over every type in `Ts` (degenerates to the always-true
    /// option for `Ts = ()`, since [`ExistsAll`] is implemented for the empty tuple below).
    pub fn to_option() -> AllOf<Ts> {
        exists_all::<Ts>()
    }

    /// Whether `entity` carries every component type in `Ts`.
    pub fn match_entity(entity: EntityRef<'_>) -> bool {
        Ts::matches_all(entity)
    }
}

impl<Ts: JoinedTuple + ExistsAll> Aspect<Ts> {
    /// Visit every live entity carrying all of `Ts` and matching `opts`, without fetching any
    /// component values. Delegates to [`Registry::for_each_entity`] with `Ts`'s aspect predicate
    /// folded into `opts`.
    pub fn for_each_entity(registry: &Registry, mut f: impl FnMut(Entity<'_>), opts: impl Opt) {
        let combined = AspectAnd::<Ts, _>::new(opts);
        registry.for_each_entity(|e| f(e), combined);
    }

    /// Visit every live entity carrying all of `Ts` and matching `opts`, fetching a cloned value
    /// of each component in `Ts`. Delegates to [`Registry::for_joined_components`].
    pub fn for_joined_components(
        registry: &Registry,
        f: impl FnMut(Entity<'_>, Ts),
        opts: impl Opt,
    ) {
        let combined = AspectAnd::<Ts, _>::new(opts);
        Ts::for_joined(registry, f, combined)
    }
}

/// `Ts::matches_all(e) && opts.matches(e)` — the option this module folds `Ts`'s own implicit
/// aspect predicate into before handing it to the registry, so `Aspect::for_each_entity`'s caller
/// doesn't have to spell out `Aspect::<Ts>::to_option() & opts` themselves.
struct AspectAnd<Ts, O> {
    opts: O,
    _marker: PhantomData<fn() -> Ts>,
}

impl<Ts, O> AspectAnd<Ts, O> {
    fn new(opts: O) -> Self {
        Self {
            opts,
            _marker: PhantomData,
        }
    }
}

// `PhantomData<fn() -> Ts>` is `Copy`/`Clone` regardless of whether `Ts` itself is, but `#[derive]`
// would still add a `Ts: Copy` bound (it doesn't look through the field), so these are hand-written.
impl<Ts, O: Clone> Clone for AspectAnd<Ts, O> {
    fn clone(&self) -> Self {
        Self::new(self.opts.clone())
    }
}
impl<Ts, O: Copy> Copy for AspectAnd<Ts, O> {}

impl<Ts: ExistsAll, O: Opt> Opt for AspectAnd<Ts, O> {
    fn matches(&self, entity: EntityRef<'_>) -> bool {
        Ts::matches_all(entity) && self.opts.matches(entity)
    }
}

/// The empty pack: `Aspect::<()>::to_option()` is always-true, matching §4.G's "degenerates to
/// `true` for empty pack". There is no `JoinedTuple` impl for `()` — a joined iteration needs at
/// least one type to serve as the driver, so this facade only ever applies to `to_option`/
/// `match_entity` for the empty case.
impl ExistsAll for () {
    fn matches_all(_entity: EntityRef<'_>) -> bool {
        true
    }
}

/// The empty pack under `exists_any` is vacuously false: there is no listed type for the entity
/// to have any of.
impl ExistsAny for () {
    fn matches_any(_entity: EntityRef<'_>) -> bool {
        false
    }
}

macro_rules! impl_tuple_algebra {
    ($head:ident $(, $tail:ident)*) => {
        #[allow(non_snake_case)]
        impl<$head: Component, $($tail: Component),*> ExistsAny for ($head, $($tail,)*) {
            fn matches_any(entity: EntityRef<'_>) -> bool {
                entity.registry().exists_component::<$head>(entity.id())
                $(|| entity.registry().exists_component::<$tail>(entity.id()))*
            }
        }

        #[allow(non_snake_case)]
        impl<$head: Component, $($tail: Component),*> ExistsAll for ($head, $($tail,)*) {
            fn matches_all(entity: EntityRef<'_>) -> bool {
                entity.registry().exists_component::<$head>(entity.id())
                $(&& entity.registry().exists_component::<$tail>(entity.id()))*
            }
        }

        #[allow(non_snake_case)]
        impl<$head: Component, $($tail: Component),*> JoinedTuple for ($head, $($tail,)*) {
            fn for_joined(registry: &Registry, mut f: impl FnMut(Entity<'_>, Self), opts: impl Opt) {
                // Step 1: resolve probe storages for T2..Tn; if any is missing, return immediately.
                if !(true $(&& registry.storage_exists::<$tail>())*) {
                    return;
                }

                // Step 2-5: T1 (the head type) is the driver.
                registry.with_driver_storage::<$head>(|storage| {
                    storage.for_each_component(|id, $head| {
                        let entity = Entity::new(registry, id);
                        if !opts.matches(entity.as_read_only()) {
                            return;
                        }
                        $(
                            let $tail = match registry.find_component::<$tail>(id) {
                                Some(value) => value,
                                None => return,
                            };
                        )*
                        f(entity, ($head.clone(), $($tail,)*));
                    });
                });
            }
        }

        #[allow(non_snake_case)]
        impl<$head: Component, $($tail: Component),*> FetchTuple for ($head, $($tail,)*) {
            fn find_all(registry: &Registry, id: crate::entity::EntityId) -> Option<Self> {
                let $head = registry.find_component::<$head>(id)?;
                $(
                    let $tail = registry.find_component::<$tail>(id)?;
                )*
                Some(($head, $($tail,)*))
            }
        }
    };
}

crate::all_tuples!(impl_tuple_algebra);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

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
    fn to_option_is_conjunction_of_required_types() {
        // Given
        let registry = Registry::new();
        let a = registry.create_entity().unwrap();
        let c = registry.create_entity().unwrap();
        registry.assign_component(a.id(), Position { x: 0, y: 0 });
        registry.assign_component(c.id(), Position { x: 0, y: 0 });
        registry.assign_component(c.id(), Velocity { x: 0, y: 0 });

        // When / Then
        assert!(!Aspect::<(Position, Velocity)>::match_entity(a.as_read_only()));
        assert!(Aspect::<(Position, Velocity)>::match_entity(c.as_read_only()));
    }

    #[test]
    fn empty_aspect_matches_every_entity() {
        // Given
        let registry = Registry::new();
        let e = registry.create_entity().unwrap();

        // Then
        assert!(Aspect::<()>::match_entity(e.as_read_only()));
    }

    #[test]
    fn for_joined_components_visits_entities_with_every_required_type_p6() {
        // Given (P6)
        let registry = Registry::new();
        let e1 = registry.create_entity().unwrap();
        let e2 = registry.create_entity().unwrap();
        registry.assign_component(e1.id(), Position { x: 1, y: 1 });
        registry.assign_component(e1.id(), Velocity { x: 2, y: 2 });
        registry.assign_component(e2.id(), Position { x: 3, y: 3 });

        // When
        let mut visited = Vec::new();
        Aspect::<(Position, Velocity)>::for_joined_components(
            &registry,
            |entity, (p, v)| visited.push((entity.id(), p, v)),
            crate::option::Always,
        );

        // Then
        assert_eq!(visited.len(), 1);
        assert_eq!(visited[0].0, e1.id());
    }

    #[test]
    fn for_joined_components_with_missing_probe_storage_returns_immediately() {
        // Given: no entity has ever been assigned a Velocity, so the storage doesn't exist yet.
        let registry = Registry::new();
        let e = registry.create_entity().unwrap();
        registry.assign_component(e.id(), Position { x: 1, y: 1 });

        // When
        let mut visited = 0;
        Aspect::<(Position, Velocity)>::for_joined_components(
            &registry,
            |_, _| visited += 1,
            crate::option::Always,
        );

        // Then
        assert_eq!(visited, 0);
    }

    #[test]
    fn find_components_returns_none_if_any_type_is_missing() {
        // Given
        let registry = Registry::new();
        let e = registry.create_entity().unwrap();
        registry.assign_component(e.id(), Position { x: 1, y: 1 });

        // Then
        assert_eq!(
            <(Position, Velocity)>::find_all(&registry, e.id()),
            None
        );
    }

    #[test]
    fn get_components_returns_every_requested_type() {
        // Given
        let registry = Registry::new();
        let e = registry.create_entity().unwrap();
        registry.assign_component(e.id(), Position { x: 1, y: 2 });
        registry.assign_component(e.id(), Velocity { x: 3, y: 4 });

        // When
        let (p, v) = <(Position, Velocity)>::get_all(&registry, e.id()).unwrap();

        // Then
        assert_eq!(p, Position { x: 1, y: 2 });
        assert_eq!(v, Velocity { x: 3, y: 4 });
    }
}
