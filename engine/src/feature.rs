//! Systems, features, and the before/event/after dispatch contract.
//!
//! Rust has no direct rendition of "a base type implementing per-event virtual handlers": a
//! trait object can't be generic over the event type it handles. This module follows the
//! reference engine's own workaround for the same problem in its `ecs::system` module — a single
//! concrete [`System`] holds a `TypeId`-keyed map of boxed closures, built up via [`SystemBuilder`]
//! rather than `impl System for MyStruct { ... }`. [`Feature`] then owns an ordered `Vec<System>`
//! and drives the three dispatch phases described in the module's own spec: `before<E>`, `E`,
//! `after<E>`.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::registry::Registry;

/// Marker trait for event types dispatched through [`Registry::process_event`].
///
/// `Clone` is required because a single `process_event` call fans the same event out to three
/// phases (`before`, main, `after`), and the before/after phases are delivered as
/// `Before<E>(E)`/`After<E>(E)` wrapper events that each need their own owned copy.
pub trait Event: 'static + Send + Sync + Clone {}

/// The `before<E>` phase wrapper: systems that want to observe an event before it is delivered
/// register a handler for `Before<E>` rather than `E` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Before<E>(pub E);
impl<E: Event> Event for Before<E> {}

/// The `after<E>` phase wrapper, delivered once the main phase has run for every system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct After<E>(pub E);
impl<E: Event> Event for After<E> {}

type Handler = Box<dyn FnMut(&Registry, &dyn Any) + Send + Sync>;

/// A single unit of behavior: a `TypeId`-keyed table of event handlers, built with
/// [`SystemBuilder`]. A `System` that has no handler registered for a given event type simply
/// does not participate in that event's dispatch.
pub struct System {
    handlers: HashMap<TypeId, Handler>,
}

impl System {
    pub fn builder() -> SystemBuilder {
        SystemBuilder::new()
    }

    /// Dispatch `event` (already known to have type id `event_type`) if this system registered a
    /// handler for it. Returns whether a handler ran.
    fn dispatch(&mut self, registry: &Registry, event_type: TypeId, event: &dyn Any) -> bool {
        if let Some(handler) = self.handlers.get_mut(&event_type) {
            handler(registry, event);
            true
        } else {
            false
        }
    }
}

/// Builds a [`System`] by registering one closure per event type via [`Self::handles`],
/// [`Self::before`], and [`Self::after`].
#[derive(Default)]
pub struct SystemBuilder {
    handlers: HashMap<TypeId, Handler>,
}

impl SystemBuilder {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for the main phase of event `E`.
    pub fn handles<E: Event>(
        mut self,
        mut handler: impl FnMut(&Registry, &E) + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(
            TypeId::of::<E>(),
            Box::new(move |registry, event| {
                let event = event
                    .downcast_ref::<E>()
                    .expect("event TypeId routed to its own handler slot");
                handler(registry, event);
            }),
        );
        self
    }

    /// Register a handler that runs before `E`'s main-phase handlers.
    pub fn before<E: Event>(
        self,
        mut handler: impl FnMut(&Registry, &E) + Send + Sync + 'static,
    ) -> Self {
        self.handles::<Before<E>>(move |registry, wrapped| handler(registry, &wrapped.0))
    }

    /// Register a handler that runs after `E`'s main-phase handlers.
    pub fn after<E: Event>(
        self,
        mut handler: impl FnMut(&Registry, &E) + Send + Sync + 'static,
    ) -> Self {
        self.handles::<After<E>>(move |registry, wrapped| handler(registry, &wrapped.0))
    }

    pub fn build(self) -> System {
        System {
            handlers: self.handlers,
        }
    }
}

/// An ordered collection of [`System`]s sharing one enable/disable switch (I7: disabling a
/// feature never drops its systems, it only gates dispatch).
#[derive(Default)]
pub struct Feature {
    systems: Vec<System>,
    enabled: bool,
}

impl Feature {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            enabled: true,
        }
    }

    /// Append a system. Insertion order is dispatch order.
    pub fn add_system(&mut self, system: System) -> &mut Self {
        self.systems.push(system);
        self
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_disabled(&self) -> bool {
        !self.enabled
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Run the `before<E>`, `E`, `after<E>` phases against every system that registered a
    /// handler for the relevant type id, in insertion order. No-op if the feature is disabled.
    ///
    /// A system handler that panics unwinds out of this call; later systems in the same phase do
    /// not run, and the registry makes no attempt to catch the panic (the caller should wrap
    /// `process_event` in `std::panic::catch_unwind` if partial-batch completion is
    /// unacceptable).
    pub fn process_event<E: Event>(&mut self, registry: &Registry, event: &E) {
        if !self.enabled {
            return;
        }

        let before = Before(event.clone());
        let before_type = TypeId::of::<Before<E>>();
        for system in &mut self.systems {
            system.dispatch(registry, before_type, &before);
        }

        let event_type = TypeId::of::<E>();
        for system in &mut self.systems {
            system.dispatch(registry, event_type, event);
        }

        let after = After(event.clone());
        let after_type = TypeId::of::<After<E>>();
        for system in &mut self.systems {
            system.dispatch(registry, after_type, &after);
        }
    }
}

/// A feature behind its own exclusive lock, so `Registry::process_event` can hold only a shared
/// lock on the feature table while each feature dispatches independently.
pub(crate) type FeatureSlot = Mutex<Feature>;
