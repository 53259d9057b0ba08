//! ProbingSet: open addressing with linear probing over a fixed number of
//! slots. Deleted slots become tombstones so later probe chains stay intact.

use crate::reentrancy::DebugReentrancy;
use crate::set::{home_index, make_hash, InsertError, Set};
use core::borrow::Borrow;
use core::fmt::{self, Debug, Write};
use core::hash::{BuildHasher, Hash};
use core::mem;
use hashbrown::hash_map::DefaultHashBuilder;

#[derive(Debug)]
enum Slot<T> {
    Empty,
    Tombstone,
    Occupied { value: T, hash: u64 },
}

/// Outcome of a linear probe for one element.
enum Probe {
    Found(usize),
    /// Not present; the first tombstone passed, or else the `Empty` slot that
    /// ended the probe.
    Vacant(usize),
    /// Not present and every slot was visited without finding a reusable one.
    Exhausted,
}

/// Hash set with a fixed slot count and linear probing.
///
/// The capacity given at construction is a hard ceiling: the set never
/// grows, and inserting into a full set is reported as
/// `InsertError::TableFull`. Removal leaves a tombstone, which lookups step
/// over and inserts reuse.
pub struct ProbingSet<T, S = DefaultHashBuilder> {
    hasher: S,
    slots: Box<[Slot<T>]>,
    len: usize,
    reentrancy: DebugReentrancy,
}

impl<T> ProbingSet<T>
where
    T: Eq + Hash,
{
    pub fn new(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<T, S> ProbingSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    /// A zero `capacity` yields a set that rejects every insert.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            slots: (0..capacity).map(|_| Slot::Empty).collect(),
            len: 0,
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_full(&self) -> bool {
        self.len >= self.slots.len()
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = make_hash(&self.hasher, q);
        matches!(self.probe(hash, q), Probe::Found(_))
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = make_hash(&self.hasher, q);
        match self.probe(hash, q) {
            Probe::Found(i) => match &self.slots[i] {
                Slot::Occupied { value, .. } => Some(value),
                _ => None,
            },
            _ => None,
        }
    }

    /// Insert `value` into the first tombstone or empty slot of its probe
    /// sequence. The probe runs past tombstones to the end of the sequence so
    /// a duplicate stored beyond a tombstone is still detected.
    pub fn try_insert(&mut self, value: T) -> Result<(), InsertError> {
        let _g = self.reentrancy.enter();
        if self.len >= self.slots.len() {
            log::debug!("probing set full: rejecting insert at capacity {}", self.slots.len());
            return Err(InsertError::TableFull {
                capacity: self.slots.len(),
            });
        }

        let hash = make_hash(&self.hasher, &value);
        match self.probe(hash, &value) {
            Probe::Found(_) => Err(InsertError::DuplicateElement),
            Probe::Vacant(i) => {
                self.slots[i] = Slot::Occupied { value, hash };
                self.len += 1;
                Ok(())
            }
            // len < capacity leaves at least one empty or tombstone slot, so
            // this is only reachable if `len` is out of sync.
            Probe::Exhausted => Err(InsertError::TableFull {
                capacity: self.slots.len(),
            }),
        }
    }

    pub fn add(&mut self, value: T) -> bool {
        self.try_insert(value).is_ok()
    }

    /// Remove and return the element equal to `q`, leaving a tombstone.
    pub fn take<Q>(&mut self, q: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = make_hash(&self.hasher, q);
        let Probe::Found(i) = self.probe(hash, q) else {
            return None;
        };
        match mem::replace(&mut self.slots[i], Slot::Tombstone) {
            Slot::Occupied { value, .. } => {
                self.len -= 1;
                Some(value)
            }
            other => {
                self.slots[i] = other;
                None
            }
        }
    }

    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(q).is_some()
    }

    /// Occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().filter_map(|s| match s {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        })
    }

    /// One line per slot, with each occupant's home slot recomputed from its
    /// stored hash.
    pub fn diagnostic(&self) -> String
    where
        T: Debug,
    {
        let capacity = self.slots.len();
        let mut out = String::new();
        for (i, slot) in self.slots.iter().enumerate() {
            let _ = match slot {
                Slot::Empty => writeln!(out, "{i}\t<empty>"),
                Slot::Tombstone => writeln!(out, "{i}\t<tombstone>"),
                Slot::Occupied { value, hash } => {
                    writeln!(out, "{i}\t{value:?} (h:{})", home_index(*hash, capacity))
                }
            };
        }
        out
    }

    /// Walk from the home slot of `hash`, stepping over tombstones and
    /// non-matching occupants, until a match, an `Empty` slot, or a full
    /// cycle.
    fn probe<Q>(&self, hash: u64, q: &Q) -> Probe
    where
        T: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let capacity = self.slots.len();
        if capacity == 0 {
            return Probe::Exhausted;
        }
        let start = home_index(hash, capacity);
        let mut first_tombstone = None;
        let mut i = start;
        loop {
            match &self.slots[i] {
                Slot::Empty => return Probe::Vacant(first_tombstone.unwrap_or(i)),
                Slot::Tombstone => {
                    first_tombstone.get_or_insert(i);
                }
                Slot::Occupied { value, hash: h } => {
                    if *h == hash && value.borrow() == q {
                        return Probe::Found(i);
                    }
                }
            }
            i += 1;
            if i == capacity {
                i = 0;
            }
            if i == start {
                return match first_tombstone {
                    Some(t) => Probe::Vacant(t),
                    None => Probe::Exhausted,
                };
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn tombstones(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Tombstone))
            .count()
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let capacity = self.slots.len();
        let mut occupied = 0;
        for (j, slot) in self.slots.iter().enumerate() {
            let Slot::Occupied { value, hash } = slot else {
                continue;
            };
            occupied += 1;
            assert_eq!(*hash, make_hash(&self.hasher, value), "stale stored hash");
            let mut i = home_index(*hash, capacity);
            while i != j {
                assert!(
                    !matches!(self.slots[i], Slot::Empty),
                    "slot {j} is shadowed by empty slot {i} on its probe path"
                );
                i = (i + 1) % capacity;
            }
        }
        assert_eq!(occupied, self.len, "len out of sync with occupied slots");
    }
}

impl<T, S> Set<T> for ProbingSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        ProbingSet::contains(self, q)
    }

    fn add(&mut self, value: T) -> bool {
        ProbingSet::add(self, value)
    }

    fn remove<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        ProbingSet::remove(self, q)
    }

    fn len(&self) -> usize {
        ProbingSet::len(self)
    }

    fn diagnostic(&self) -> String
    where
        T: Debug,
    {
        ProbingSet::diagnostic(self)
    }
}

impl<T, S> Debug for ProbingSet<T, S>
where
    T: Eq + Hash + Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
