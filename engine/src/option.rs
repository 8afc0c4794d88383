//! Predicate combinators over entities: `exists::<T>()`, `exists_any`/`exists_all`, and the
//! `!`/`&`/`|` operator overloads that compose them.
//!
//! Rust can't overload `&&`/`||` directly (they aren't operator-overloadable — both require
//! `bool` operands so they can short-circuit at the language level), so this module overloads
//! `std::ops::{Not, BitAnd, BitOr}` (`!`, `&`, `|`) instead, matching how the teacher engine's own
//! `query::filter` combinators are composed. Evaluation is still eager-in-short-circuit-order:
//! `And`/`Or` skip evaluating their right operand once the left one already decides the result,
//! same as `&&`/`||` would.

use std::marker::PhantomData;
use std::ops::{BitAnd, BitOr, Not};

use crate::component::Component;
use crate::entity::EntityRef;

/// A boolean predicate evaluated against a candidate entity before a joined-iteration callback
/// runs. Implemented by [`Exists`], [`ExistsAny`], [`ExistsAll`], and the `Not`/`And`/`Or`
/// combinators built from them.
pub trait Option: Copy {
    fn matches(&self, entity: EntityRef<'_>) -> bool;

    /// `!self`.
    #[inline]
    fn negate(self) -> Negation<Self>
    where
        Self: Sized,
    {
        Negation(self)
    }
}

/// `exists::<T>()` — true if the entity has a component of type `T`.
pub struct Exists<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Exists<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Exists<T> {}

impl<T> Exists<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Exists<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// `exists::<T>()` as a free function, for call sites that prefer `exists::<Position>()` over
/// `Exists::<Position>::new()`.
#[inline]
pub const fn exists<T: Component>() -> Exists<T> {
    Exists::new()
}

impl<T: Component> Option for Exists<T> {
    #[inline]
    fn matches(&self, entity: EntityRef<'_>) -> bool {
        entity.registry().exists_component::<T>(entity.id())
    }
}

/// `!option`.
#[derive(Clone, Copy)]
pub struct Negation<O>(O);

impl<O: Option> Option for Negation<O> {
    #[inline]
    fn matches(&self, entity: EntityRef<'_>) -> bool {
        !self.0.matches(entity)
    }
}

impl<T: Component> Not for Exists<T> {
    type Output = Negation<Self>;
    fn not(self) -> Self::Output {
        Negation(self)
    }
}

/// `lhs && rhs`, evaluated as `lhs.matches(e) && rhs.matches(e)` (short-circuiting: `rhs` is not
/// evaluated if `lhs` is false).
#[derive(Clone, Copy)]
pub struct And<L, R>(L, R);

impl<L: Option, R: Option> Option for And<L, R> {
    #[inline]
    fn matches(&self, entity: EntityRef<'_>) -> bool {
        self.0.matches(entity) && self.1.matches(entity)
    }
}

/// `lhs || rhs`, evaluated as `lhs.matches(e) || rhs.matches(e)` (short-circuiting: `rhs` is not
/// evaluated if `lhs` is true).
#[derive(Clone, Copy)]
pub struct Or<L, R>(L, R);

impl<L: Option, R: Option> Option for Or<L, R> {
    #[inline]
    fn matches(&self, entity: EntityRef<'_>) -> bool {
        self.0.matches(entity) || self.1.matches(entity)
    }
}

// Blanket `!`/`&`/`|` over any two `Option` implementors. Implemented once over a marker
// newtype-free blanket is not possible in stable Rust (coherence forbids a blanket impl of a
// foreign trait's operator over an arbitrary local trait bound without a wrapper), so each
// combinator type above carries its own direct impls rather than one generic blanket; see the
// per-type impls for `Negation`/`And`/`Or` themselves below, which let combinators nest freely.

impl<O: Option> Not for Negation<O> {
    type Output = O;
    fn not(self) -> Self::Output {
        self.0
    }
}
impl<L: Option, R: Option> Not for And<L, R> {
    type Output = Negation<Self>;
    fn not(self) -> Self::Output {
        Negation(self)
    }
}
impl<L: Option, R: Option> Not for Or<L, R> {
    type Output = Negation<Self>;
    fn not(self) -> Self::Output {
        Negation(self)
    }
}

impl<L: Option, R: Option> BitAnd<R> for Negation<L> {
    type Output = And<Self, R>;
    fn bitand(self, rhs: R) -> Self::Output {
        And(self, rhs)
    }
}
impl<L: Option, R: Option> BitAnd<R> for And<L, R> {
    type Output = And<Self, R>;
    fn bitand(self, rhs: R) -> Self::Output {
        And(self, rhs)
    }
}
impl<L: Option, R: Option> BitAnd<R> for Or<L, R> {
    type Output = And<Self, R>;
    fn bitand(self, rhs: R) -> Self::Output {
        And(self, rhs)
    }
}
impl<T: Component, R: Option> BitAnd<R> for Exists<T> {
    type Output = And<Self, R>;
    fn bitand(self, rhs: R) -> Self::Output {
        And(self, rhs)
    }
}

impl<L: Option, R: Option> BitOr<R> for Negation<L> {
    type Output = Or<Self, R>;
    fn bitor(self, rhs: R) -> Self::Output {
        Or(self, rhs)
    }
}
impl<L: Option, R: Option> BitOr<R> for And<L, R> {
    type Output = Or<Self, R>;
    fn bitor(self, rhs: R) -> Self::Output {
        Or(self, rhs)
    }
}
impl<L: Option, R: Option> BitOr<R> for Or<L, R> {
    type Output = Or<Self, R>;
    fn bitor(self, rhs: R) -> Self::Output {
        Or(self, rhs)
    }
}
impl<T: Component, R: Option> BitOr<R> for Exists<T> {
    type Output = Or<Self, R>;
    fn bitor(self, rhs: R) -> Self::Output {
        Or(self, rhs)
    }
}

/// The always-true option, used as the identity element when no predicate was supplied and by
/// `Aspect::<()>::to_option()`.
#[derive(Clone, Copy, Default)]
pub struct Always;

impl Option for Always {
    #[inline]
    fn matches(&self, _entity: EntityRef<'_>) -> bool {
        true
    }
}

/// Implemented for tuples of [`Component`] types via [`crate::all_tuples`] in `aspect.rs`, which
/// is where the arity-16 tuple impls live since they share the macro the `Aspect` facade uses.
pub trait ExistsAny {
    fn matches_any(entity: EntityRef<'_>) -> bool;
}

/// Implemented for tuples of [`Component`] types via the same tuple macro as [`ExistsAny`].
pub trait ExistsAll {
    fn matches_all(entity: EntityRef<'_>) -> bool;
}

/// `exists_any::<(A, B, ...)>()` — true if the entity has at least one of the listed component
/// types.
pub struct AnyOf<Ts> {
    _marker: PhantomData<fn() -> Ts>,
}
impl<Ts> Clone for AnyOf<Ts> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<Ts> Copy for AnyOf<Ts> {}

impl<Ts: ExistsAny> Option for AnyOf<Ts> {
    #[inline]
    fn matches(&self, entity: EntityRef<'_>) -> bool {
        Ts::matches_any(entity)
    }
}

#[inline]
pub const fn exists_any<Ts: ExistsAny>() -> AnyOf<Ts> {
    AnyOf {
        _marker: PhantomData,
    }
}

/// `exists_all::<(A, B, ...)>()` — true if the entity has every one of the listed component
/// types. Equivalent to `Aspect::<(A, B, ...)>::to_option()`.
pub struct AllOf<Ts> {
    _marker: PhantomData<fn() -> Ts>,
}
impl<Ts> Clone for AllOf<Ts> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<Ts> Copy for AllOf<Ts> {}

impl<Ts: ExistsAll> Option for AllOf<Ts> {
    #[inline]
    fn matches(&self, entity: EntityRef<'_>) -> bool {
        Ts::matches_all(entity)
    }
}

#[inline]
pub const fn exists_all<Ts: ExistsAll>() -> AllOf<Ts> {
    AllOf {
        _marker: PhantomData,
    }
}

impl<Ts: ExistsAny> Not for AnyOf<Ts> {
    type Output = Negation<Self>;
    fn not(self) -> Self::Output {
        Negation(self)
    }
}
impl<Ts: ExistsAny, R: Option> BitAnd<R> for AnyOf<Ts> {
    type Output = And<Self, R>;
    fn bitand(self, rhs: R) -> Self::Output {
        And(self, rhs)
    }
}
impl<Ts: ExistsAny, R: Option> BitOr<R> for AnyOf<Ts> {
    type Output = Or<Self, R>;
    fn bitor(self, rhs: R) -> Self::Output {
        Or(self, rhs)
    }
}

impl<Ts: ExistsAll> Not for AllOf<Ts> {
    type Output = Negation<Self>;
    fn not(self) -> Self::Output {
        Negation(self)
    }
}
impl<Ts: ExistsAll, R: Option> BitAnd<R> for AllOf<Ts> {
    type Output = And<Self, R>;
    fn bitand(self, rhs: R) -> Self::Output {
        And(self, rhs)
    }
}
impl<Ts: ExistsAll, R: Option> BitOr<R> for AllOf<Ts> {
    type Output = Or<Self, R>;
    fn bitor(self, rhs: R) -> Self::Output {
        Or(self, rhs)
    }
}
