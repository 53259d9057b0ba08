//! collision-sets: two single-threaded hash sets that differ only in how
//! they resolve collisions.
//!
//! Internal Design:
//!
//! Summary
//! - `ChainedSet<T, S>`: separate chaining. A vector of bucket heads points
//!   into a `slotmap` arena of nodes; each node owns the key of its
//!   successor. The table doubles before an insert whenever the current
//!   load factor (`len / capacity`, real-valued) is above 0.75.
//! - `ProbingSet<T, S>`: open addressing with linear probing over a fixed
//!   slot array. Each slot is `Empty`, `Tombstone` or `Occupied`. The
//!   capacity given at construction is a hard ceiling.
//! - `Set<T>`: the shared contract (`contains`, `add`, `remove`, `len`,
//!   `diagnostic`) so callers and tests can drive either strategy.
//!
//! Hashing
//! - Elements supply `Eq + Hash`; the builder `S` defaults to hashbrown's
//!   fixed-key `DefaultHashBuilder`, so hashes are deterministic across
//!   runs. Hashes are `u64`, which makes the home index a plain modulo.
//! - Every stored element keeps the hash computed at insert time. Rehashing
//!   and the diagnostic dump use the stored hash and never call `T: Hash`.
//!
//! Probing and tombstones
//! - A probe starts at the home slot and steps by one with wraparound. Only
//!   an `Empty` slot or a full cycle ends it; tombstones are stepped over so
//!   elements placed past a deleted slot stay reachable.
//! - Inserts reuse the first tombstone on the probe path, but only after the
//!   probe has confirmed that no equal element sits further along.
//!
//! Outcomes
//! - Nothing panics in normal operation. `add`/`remove` report success as a
//!   `bool`; `try_insert` returns `InsertError::DuplicateElement` or
//!   `InsertError::TableFull`, and `take` returns the removed element.
//!
//! Reentrancy
//! - Both sets call user `Eq`/`Hash` in the middle of a walk. A debug-only
//!   guard panics if that code re-enters the same set. The guard also keeps
//!   both types `!Send + !Sync`; a multi-threaded caller would wrap a set in
//!   a single lock.
//!
//! Notes and non-goals
//! - No shrinking on removal, no bulk operations, no map variant, no
//!   serialization.
//! - The diagnostic dump is for debugging and tests; its format is not
//!   stable.

pub mod chained_set;
pub mod probing_set;
mod reentrancy;
pub mod set;
mod set_proptest;

// Public surface
pub use chained_set::ChainedSet;
pub use hashbrown::hash_map::DefaultHashBuilder;
pub use probing_set::ProbingSet;
pub use set::{InsertError, Set};
