//! A small, embeddable entity-component-system runtime.
//!
//! Application state lives in a [`Registry`](registry::Registry): a dynamic set of
//! **entities**, each a lightweight `(index, version)` handle, that accumulate typed
//! **components** in column-wise [`ComponentStorage`](component::ComponentStorage)s. Behavior
//! is expressed as [`System`](feature::System)s grouped into [`Feature`](feature::Feature)s and
//! driven by events.
//!
//! This crate deliberately does not define component or event types, does not schedule systems
//! across threads, and does not persist anything to disk — those are the embedding
//! application's job. See the crate-level modules for the pieces it does own:
//!
//! - [`entity`] — the `(index, version)` identity scheme and entity handles.
//! - [`sparse`] — the dense/sparse container that backs every storage.
//! - [`component`] — per-type columns (`ComponentStorage<T>`) and the `Component` marker trait.
//! - [`prototype`] — type-erased deferred component construction for bulk entity setup.
//! - [`option`] — predicate combinators over entities (`exists::<T>()`, `!`, `&`, `|`).
//! - [`aspect`] — compile-time bundles of required component types.
//! - [`feature`] — systems, features, and before/event/after dispatch.
//! - [`registry`] — the owning façade tying all of the above together.

// Allows `rusty_ecs_macros`-generated code to refer to this crate by name even when used from
// within the crate's own tests and doctests.
extern crate self as rusty_ecs;

pub mod util;

pub mod aspect;
pub mod component;
pub mod entity;
pub mod error;
pub mod feature;
pub mod filler;
pub mod lock;
pub mod option;
pub mod prototype;
pub mod registry;
pub mod sparse;
mod type_family;

pub use entity::{Entity, EntityRef};
pub use error::RegistryError;
pub use filler::{EntityFiller, RegistryFiller};
pub use registry::Registry;
pub use type_family::{FamilyId, TypeFamily};

pub use rusty_ecs_macros::{Component, Event};
