//! Shared contract for both collision strategies.

use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::{BuildHasher, Hash};
use thiserror::Error;

/// Why an insert left the set unchanged.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    #[error("element is already present in the set")]
    DuplicateElement,
    #[error("set is full at fixed capacity {capacity}")]
    TableFull { capacity: usize },
}

/// Operations common to `ChainedSet` and `ProbingSet`.
///
/// The boolean forms mirror the classic set contract: `add` reports whether
/// the element was inserted, `remove` whether it was found. Callers that need
/// the reason for a failed insert use the inherent `try_insert`.
pub trait Set<T> {
    fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq;

    /// Returns `true` if `value` was inserted; `false` on duplicate or when
    /// a fixed-capacity set is full.
    fn add(&mut self, value: T) -> bool;

    fn remove<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable dump of the internal layout. Not a stable format.
    fn diagnostic(&self) -> String
    where
        T: Debug;
}

#[inline]
pub(crate) fn make_hash<Q, S>(hasher: &S, q: &Q) -> u64
where
    Q: ?Sized + Hash,
    S: BuildHasher,
{
    hasher.hash_one(q)
}

/// Home slot of `hash` in a table of `capacity` slots. Hashes are unsigned,
/// so no sign normalization is needed before the modulo. `capacity` must be
/// non-zero.
#[inline]
pub(crate) fn home_index(hash: u64, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    (hash % capacity as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_index_stays_in_range() {
        for cap in [1usize, 2, 7, 13, 1024] {
            for h in [0u64, 1, 12, 13, u64::MAX, u64::MAX - 1] {
                assert!(home_index(h, cap) < cap);
            }
        }
        assert_eq!(home_index(u64::MAX, 13), (u64::MAX % 13) as usize);
    }

    #[test]
    fn insert_error_messages() {
        assert_eq!(
            InsertError::DuplicateElement.to_string(),
            "element is already present in the set"
        );
        assert_eq!(
            InsertError::TableFull { capacity: 5 }.to_string(),
            "set is full at fixed capacity 5"
        );
    }
}
