//! Chained builders for ergonomic one-shot setup: [`EntityFiller`] chains `component::<T>(value)`
//! calls onto a freshly created entity, [`RegistryFiller`] chains `feature::<Tag>()`/`system`
//! calls to stand up several features in one expression.
//!
//! Grounded on the reference engine's own deferred-mutation builder, `Commands`
//! (`ecs::system::param::commands.rs`): the same "chain calls, get the thing back" ergonomics, but
//! applied immediately rather than deferred to a flush point, since every `Registry` method here
//! already takes `&self` and has no exclusive-access window to wait for.

use crate::component::Component;
use crate::entity::{Entity, EntityId};
use crate::feature::System;
use crate::registry::Registry;

/// Chains `component::<T>(value)` calls onto a freshly created entity. Obtained from
/// [`Registry::fill_entity`].
pub struct EntityFiller<'r> {
    registry: &'r Registry,
    id: EntityId,
}

impl<'r> EntityFiller<'r> {
    pub(crate) fn new(registry: &'r Registry, id: EntityId) -> Self {
        Self { registry, id }
    }

    /// Assign `value` for `T` on the entity being filled, overwriting if already present.
    /// Returns `self` for further chaining.
    pub fn component<T: Component>(self, value: T) -> Self {
        self.registry.assign_component(self.id, value);
        self
    }

    /// Finish filling, yielding the completed entity handle.
    pub fn build(self) -> Entity<'r> {
        Entity::new(self.registry, self.id)
    }
}

/// Chains `feature::<Tag>()`/`system::<Tag>(system)` calls to stand up several features on a
/// registry in one expression. Obtained from [`Registry::fill`].
pub struct RegistryFiller<'r> {
    registry: &'r Registry,
}

impl<'r> RegistryFiller<'r> {
    pub(crate) fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Ensure an empty, enabled feature exists for `Tag`. Returns `self` for chaining.
    pub fn feature<Tag: 'static>(self) -> Self {
        self.registry.ensure_feature::<Tag>();
        self
    }

    /// Append `system` to `Tag`'s feature, creating the feature first if needed. Returns `self`
    /// for chaining.
    pub fn system<Tag: 'static>(self, system: System) -> Self {
        self.registry.add_system::<Tag>(system);
        self
    }

    /// Finish filling, yielding the registry reference back for further direct use.
    pub fn build(self) -> &'r Registry {
        self.registry
    }
}
