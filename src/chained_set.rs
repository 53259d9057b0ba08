//! ChainedSet: separate chaining over an arena of nodes, doubling capacity
//! once the load factor passes 0.75.

use crate::reentrancy::DebugReentrancy;
use crate::set::{home_index, make_hash, InsertError, Set};
use core::borrow::Borrow;
use core::fmt::{self, Debug, Write};
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Arena key of one chain node.
    struct NodeKey;
}

/// Growth is checked against the count before placement, so a table can sit
/// at a load factor above this value until the next insert.
pub const MAX_LOAD_FACTOR: f64 = 0.75;
pub const GROWTH_FACTOR: usize = 2;
pub const DEFAULT_CAPACITY: usize = 16;

#[derive(Debug)]
struct Node<T> {
    value: T,
    hash: u64,
    next: Option<NodeKey>,
}

/// Hash set resolving collisions with per-bucket singly linked chains.
///
/// Each bucket head owns the first node of its chain and each node owns its
/// successor; ownership is expressed as arena keys into `nodes`, so unlinking
/// and rehashing move keys around without reallocating elements. New nodes
/// are prepended, so a chain lists its most recent insert first.
pub struct ChainedSet<T, S = DefaultHashBuilder> {
    hasher: S,
    buckets: Vec<Option<NodeKey>>,
    nodes: SlotMap<NodeKey, Node<T>>,
    reentrancy: DebugReentrancy,
}

impl<T> ChainedSet<T>
where
    T: Eq + Hash,
{
    /// `capacity` is the initial bucket count; the set grows past it as
    /// needed. Zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<T> Default for ChainedSet<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T, S> ChainedSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            buckets: vec![None; capacity.max(1)],
            nodes: SlotMap::with_key(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.nodes.len() as f64 / self.buckets.len() as f64
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = make_hash(&self.hasher, q);
        self.find(hash, q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = make_hash(&self.hasher, q);
        self.find(hash, q).map(|k| &self.nodes[k].value)
    }

    /// Insert `value`, growing first if the current load factor exceeds
    /// `MAX_LOAD_FACTOR`. On duplicate the set is left as is, although a
    /// pending growth step still happens.
    pub fn try_insert(&mut self, value: T) -> Result<(), InsertError> {
        let _g = self.reentrancy.enter();
        if self.load_factor() > MAX_LOAD_FACTOR {
            let grown = self.buckets.len() * GROWTH_FACTOR;
            log::trace!(
                "chained set rehash: {} -> {} buckets, {} elements",
                self.buckets.len(),
                grown,
                self.nodes.len()
            );
            relink(&mut self.nodes, &mut self.buckets, grown);
        }

        let hash = make_hash(&self.hasher, &value);
        if self.find(hash, &value).is_some() {
            return Err(InsertError::DuplicateElement);
        }
        let bucket = home_index(hash, self.buckets.len());
        let next = self.buckets[bucket];
        let key = self.nodes.insert(Node { value, hash, next });
        self.buckets[bucket] = Some(key);
        Ok(())
    }

    pub fn add(&mut self, value: T) -> bool {
        self.try_insert(value).is_ok()
    }

    /// Unlink and return the element equal to `q`. Capacity never shrinks.
    pub fn take<Q>(&mut self, q: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let hash = make_hash(&self.hasher, q);
        let bucket = home_index(hash, self.buckets.len());

        let mut prev: Option<NodeKey> = None;
        let mut cursor = self.buckets[bucket];
        while let Some(k) = cursor {
            let node = &self.nodes[k];
            if node.hash == hash && node.value.borrow() == q {
                let next = node.next;
                match prev {
                    Some(p) => self.nodes[p].next = next,
                    None => self.buckets[bucket] = next,
                }
                return self.nodes.remove(k).map(|n| n.value);
            }
            prev = cursor;
            cursor = node.next;
        }
        None
    }

    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.take(q).is_some()
    }

    /// Elements in bucket order, each chain newest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.buckets
            .iter()
            .flat_map(move |&head| self.chain(head))
            .map(|n| &n.value)
    }

    /// One line per non-empty bucket: its index, then every element of the
    /// chain with its home bucket recomputed from the stored hash.
    pub fn diagnostic(&self) -> String
    where
        T: Debug,
    {
        let capacity = self.buckets.len();
        let mut out = String::new();
        for (i, &head) in self.buckets.iter().enumerate() {
            if head.is_none() {
                continue;
            }
            let _ = write!(out, "{i}\t");
            for node in self.chain(head) {
                let _ = write!(out, "{:?} (h:{})\t", node.value, home_index(node.hash, capacity));
            }
            out.push('\n');
        }
        out
    }

    fn find<Q>(&self, hash: u64, q: &Q) -> Option<NodeKey>
    where
        T: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut cursor = self.buckets[home_index(hash, self.buckets.len())];
        while let Some(k) = cursor {
            let node = &self.nodes[k];
            if node.hash == hash && node.value.borrow() == q {
                return Some(k);
            }
            cursor = node.next;
        }
        None
    }

    fn chain(&self, head: Option<NodeKey>) -> impl Iterator<Item = &Node<T>> + '_ {
        core::iter::successors(head.map(|k| &self.nodes[k]), move |n| {
            n.next.map(|k| &self.nodes[k])
        })
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let capacity = self.buckets.len();
        let mut seen = 0;
        for (i, &head) in self.buckets.iter().enumerate() {
            for node in self.chain(head) {
                assert_eq!(home_index(node.hash, capacity), i, "node chained off its home bucket");
                assert_eq!(node.hash, make_hash(&self.hasher, &node.value), "stale stored hash");
                seen += 1;
            }
        }
        assert_eq!(seen, self.nodes.len(), "arena holds unreachable nodes");
    }
}

/// Re-bucket every node into a fresh table of `capacity` heads. Old buckets
/// are visited in index order and each chain head to tail; nodes are
/// relinked by key using their stored hash, so element `Hash` is not called.
fn relink<T>(
    nodes: &mut SlotMap<NodeKey, Node<T>>,
    buckets: &mut Vec<Option<NodeKey>>,
    capacity: usize,
) {
    let mut fresh: Vec<Option<NodeKey>> = vec![None; capacity];
    for &head in buckets.iter() {
        let mut cursor = head;
        while let Some(k) = cursor {
            let node = &mut nodes[k];
            cursor = node.next;
            let slot = home_index(node.hash, capacity);
            node.next = fresh[slot];
            fresh[slot] = Some(k);
        }
    }
    *buckets = fresh;
}

impl<T, S> Set<T> for ChainedSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        ChainedSet::contains(self, q)
    }

    fn add(&mut self, value: T) -> bool {
        ChainedSet::add(self, value)
    }

    fn remove<Q>(&mut self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        ChainedSet::remove(self, q)
    }

    fn len(&self) -> usize {
        ChainedSet::len(self)
    }

    fn diagnostic(&self) -> String
    where
        T: Debug,
    {
        ChainedSet::diagnostic(self)
    }
}

impl<T, S> Debug for ChainedSet<T, S>
where
    T: Eq + Hash + Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::Hasher;
    use std::collections::BTreeSet;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // every element lands in bucket 0
    }

    /// Invariant: a duplicate insert is rejected and the set is unchanged.
    #[test]
    fn duplicate_insert_rejected() {
        let mut s: ChainedSet<String> = ChainedSet::new(8);
        assert!(s.add("dup".to_string()));
        assert_eq!(s.try_insert("dup".to_string()), Err(InsertError::DuplicateElement));
        assert!(!s.add("dup".to_string()));
        assert_eq!(s.len(), 1);
        s.check_invariants();
    }

    /// Invariant: growth is decided on the count before placement, using
    /// real-valued division.
    #[test]
    fn growth_checked_before_placement() {
        let mut s: ChainedSet<u32> = ChainedSet::new(4);
        for v in 0..4 {
            assert!(s.add(v));
            assert_eq!(s.capacity(), 4, "3/4 is not above 0.75");
        }
        // 4/4 = 1.0 > 0.75 at the start of the fifth insert.
        assert!(s.add(4));
        assert_eq!(s.capacity(), 8);
        for v in 0..5 {
            assert!(s.contains(&v));
        }
        s.check_invariants();
    }

    /// Invariant: a pending growth step runs even when the insert turns out
    /// to be a duplicate; the element count is untouched.
    #[test]
    fn duplicate_insert_may_still_grow() {
        let mut s: ChainedSet<u32> = ChainedSet::new(1);
        assert!(s.add(7));
        assert_eq!(s.capacity(), 1);
        assert!(!s.add(7));
        assert_eq!(s.capacity(), 2);
        assert_eq!(s.len(), 1);
        s.check_invariants();
    }

    /// Invariant: zero capacity is raised to one bucket.
    #[test]
    fn zero_capacity_is_usable() {
        let mut s: ChainedSet<&str> = ChainedSet::new(0);
        assert_eq!(s.capacity(), 1);
        assert!(!s.contains("a"));
        assert!(s.add("a"));
        assert!(s.add("b"));
        assert!(s.contains("a") && s.contains("b"));
        s.check_invariants();
    }

    /// Invariant: removal splices out the head, middle and tail of a chain
    /// without losing the other nodes.
    #[test]
    fn remove_from_every_chain_position() {
        let mut s: ChainedSet<&str, ConstBuildHasher> =
            ChainedSet::with_capacity_and_hasher(64, ConstBuildHasher);
        for v in ["a", "b", "c", "d", "e"] {
            assert!(s.add(v));
        }
        // Chain order is newest first: e d c b a.
        assert!(s.remove("c")); // middle
        assert!(s.remove("e")); // head
        assert!(s.remove("a")); // tail
        assert!(!s.remove("a"));
        assert_eq!(s.len(), 2);
        assert!(s.contains("b") && s.contains("d"));
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec!["d", "b"]);
        s.check_invariants();
    }

    /// Invariant: `take` hands back the stored element; lookups by borrowed
    /// form (`&str` for `String`) agree with owned lookups.
    #[test]
    fn take_returns_owned_element() {
        let mut s: ChainedSet<String> = ChainedSet::new(4);
        s.add("hello".to_string());
        assert_eq!(s.get("hello").map(String::as_str), Some("hello"));
        assert_eq!(s.take("hello"), Some("hello".to_string()));
        assert_eq!(s.take("hello"), None);
        assert!(s.is_empty());
    }

    /// Invariant: rehashing keeps every element reachable from its new home.
    #[test]
    fn rehash_keeps_all_elements() {
        let mut s: ChainedSet<u64> = ChainedSet::new(2);
        for v in 0..500 {
            assert!(s.add(v));
        }
        assert!(s.capacity() >= 500);
        assert!(s.load_factor() <= 1.0);
        for v in 0..500 {
            assert!(s.contains(&v), "lost {v} across rehash");
        }
        assert!(!s.contains(&500));
        let all: BTreeSet<u64> = s.iter().copied().collect();
        assert_eq!(all.len(), 500);
        s.check_invariants();
    }

    /// Invariant: the dump lists only non-empty buckets, newest first, with
    /// each element's home bucket.
    #[test]
    fn diagnostic_lists_chains_newest_first() {
        let mut s: ChainedSet<&str, ConstBuildHasher> =
            ChainedSet::with_capacity_and_hasher(4, ConstBuildHasher);
        s.add("x");
        s.add("y");
        assert_eq!(s.diagnostic(), "0\t\"y\" (h:0)\t\"x\" (h:0)\t\n");
        assert_eq!(format!("{s:?}"), "{\"y\", \"x\"}");

        let empty: ChainedSet<u8> = ChainedSet::new(3);
        assert_eq!(empty.diagnostic(), "");
    }

    /// Invariant (debug-only): re-entering the set from `Eq` during a chain
    /// walk panics; in release builds this test is skipped.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_eq_during_contains() {
        struct ReentryKey {
            id: &'static str,
            set: *const ChainedSet<ReentryKey, ConstBuildHasher>,
            trigger: bool,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                if self.id == other.id {
                    return true;
                }
                if other.trigger {
                    unsafe {
                        let s = &*other.set;
                        let _ = s.contains(self.id);
                    }
                }
                false
            }
        }
        impl Eq for ReentryKey {}
        impl Hash for ReentryKey {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }
        impl Borrow<str> for ReentryKey {
            fn borrow(&self) -> &str {
                self.id
            }
        }

        let mut s: ChainedSet<ReentryKey, ConstBuildHasher> =
            ChainedSet::with_capacity_and_hasher(4, ConstBuildHasher);
        let ptr = &s as *const _;
        s.add(ReentryKey {
            id: "a",
            set: ptr,
            trigger: false,
        });

        let query = ReentryKey {
            id: "b",
            set: &s as *const _,
            trigger: true,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = s.contains(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}
