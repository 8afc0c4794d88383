//! `IncrementalLocker`: a re-entrant "loan counter" guard used to mark a resource as being
//! iterated, so a held reference can assert it isn't also being iterated across a move.
//!
//! Grounded on the reference engine's `core::sync::ReentrantGuard`, which backs its own
//! iteration-vs-mutation bookkeeping with a plain counter rather than a full `Mutex`, since the
//! guard only needs to detect "is anyone currently iterating", not block anyone from doing so.

use std::sync::atomic::{AtomicUsize, Ordering};

/// A counter of active "loans" on some logical resource.
///
/// `lock()`/`unlock()` bump/decrement the counter; `is_locked()` is true for any nonzero count.
/// The type deliberately has no `Clone` impl: duplicating a locker while it's counting active
/// loans would let the count diverge from reality, so a locker is moved, not copied, and
/// `into_inner`/`Drop` are the only ways its count changes outside of `lock`/`unlock`.
#[derive(Debug, Default)]
pub struct IncrementalLocker {
    count: AtomicUsize,
}

impl IncrementalLocker {
    pub const fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
        }
    }

    /// Record one more active loan. Returns a guard that releases it on drop.
    pub fn lock(&self) -> LockGuard<'_> {
        self.count.fetch_add(1, Ordering::AcqRel);
        LockGuard { locker: self }
    }

    /// Whether any loans are currently active.
    pub fn is_locked(&self) -> bool {
        self.count.load(Ordering::Acquire) != 0
    }

    /// Panics if any loans are still active. Intended for call sites (e.g. a by-value move of
    /// the owning struct) that must not happen mid-iteration.
    pub fn assert_unlocked(&self) {
        assert!(
            !self.is_locked(),
            "attempted to move/reassign a resource while an IncrementalLocker loan is active"
        );
    }
}

/// RAII loan on an [`IncrementalLocker`]; decrements the counter on drop.
pub struct LockGuard<'a> {
    locker: &'a IncrementalLocker,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.locker.count.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlocked_by_default() {
        // Given
        let locker = IncrementalLocker::new();

        // Then
        assert!(!locker.is_locked());
    }

    #[test]
    fn lock_is_reentrant_and_releases_on_drop() {
        // Given
        let locker = IncrementalLocker::new();

        // When
        let outer = locker.lock();
        let inner = locker.lock();
        assert!(locker.is_locked());
        drop(inner);

        // Then
        assert!(locker.is_locked(), "outer loan still active");
        drop(outer);
        assert!(!locker.is_locked());
    }

    #[test]
    #[should_panic]
    fn assert_unlocked_panics_while_locked() {
        // Given
        let locker = IncrementalLocker::new();
        let _guard = locker.lock();

        // When / Then
        locker.assert_unlocked();
    }
}
