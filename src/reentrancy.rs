//! Debug-only guard against re-entering a set from user `Eq`/`Hash` code.
//!
//! Lookups and inserts call into the element type while a chain or probe
//! walk is in progress. A nested call into the same set from there would
//! observe (or, through raw pointers, mutate) a half-walked structure. In
//! debug builds a second `enter` on the same tracker panics; in release
//! builds the guard is zero-sized and does nothing.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    // Sets are single-threaded; keep them !Send + !Sync in every profile.
    _single_thread: PhantomData<*mut ()>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            _single_thread: PhantomData,
        }
    }

    /// Mark the start of a walk. Hold the returned guard until the walk ends.
    #[inline]
    pub(crate) fn enter(&self) -> WalkGuard<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "reentrancy detected: set accessed from inside element Eq/Hash"
            );
            return WalkGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return WalkGuard { _owner: PhantomData };
        }
    }
}

pub(crate) struct WalkGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a DebugReentrancy>,
}

impl Drop for WalkGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(false);
    }
}
