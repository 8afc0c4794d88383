//! Error types for the registry's fallible entry points.
//!
//! The reference engine does not depend on `thiserror`/`anyhow`; error types here follow its
//! house style instead — plain structs/enums with a hand-written [`std::fmt::Display`] impl and
//! a blanket [`std::error::Error`] impl (see `ecs::world::access::ConflictError` in the teacher
//! engine). Operations that can never fail keep returning `Option`/`bool`, per §7 of the spec.

use std::fmt;

/// Errors raised by [`Registry`](crate::registry::Registry) entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// `get_component`/`get_feature` found no value for the given key.
    NotFound(NotFoundKind),
    /// `create_entity` was called with the 22-bit index space already fully allocated.
    IdentitySpaceExhausted,
    /// A capacity request had `min > max`.
    Capacity(CapacityError),
}

/// What kind of lookup came up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    /// A `get_component::<T>(entity)` call found no `T` on `entity`.
    Component,
    /// A `get_feature::<Tag>()` call found no feature registered for `Tag`.
    Feature,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::NotFound(NotFoundKind::Component) => {
                write!(f, "component not found on entity")
            }
            RegistryError::NotFound(NotFoundKind::Feature) => {
                write!(f, "no feature registered for tag")
            }
            RegistryError::IdentitySpaceExhausted => {
                write!(f, "entity identity space exhausted (2^22 - 1 live entities)")
            }
            RegistryError::Capacity(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RegistryError {}

impl From<CapacityError> for RegistryError {
    fn from(value: CapacityError) -> Self {
        RegistryError::Capacity(value)
    }
}

/// Raised by [`next_capacity_size`](crate::sparse::next_capacity_size) when `min > max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError {
    min: usize,
    max: usize,
}

impl CapacityError {
    #[inline]
    pub(crate) const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid capacity growth request: min ({}) > max ({})",
            self.min, self.max
        )
    }
}

impl std::error::Error for CapacityError {}

/// Raised by [`SparseSet::get_dense_index`](crate::sparse::SparseSet::get_dense_index) when the
/// requested value is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsentError;

impl fmt::Display for AbsentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value not present in sparse set")
    }
}

impl std::error::Error for AbsentError {}
