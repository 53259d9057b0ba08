#![cfg(test)]

// Property tests for both sets, kept inside the crate so each step can check
// the private layout invariants (chain placement, probe reachability).

use crate::chained_set::ChainedSet;
use crate::probing_set::ProbingSet;
use crate::set::{InsertError, Set};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Element newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so shrinking moves toward earlier elements.
#[derive(Clone, Debug)]
enum Op {
    Add(usize),
    Remove(usize),
    Contains(String),
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            3 => idx.clone().prop_map(Op::Add),
            2 => idx.clone().prop_map(Op::Remove),
            2 => prop_oneof![contains_pool, "[a-z]{0,4}"].prop_map(Op::Contains),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

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
    }
}

// Shared state machine against std::collections::HashSet. `capacity` is
// `Some` for fixed-capacity sets, where an insert of a new element succeeds
// only while the model holds fewer than `capacity` elements.
fn run_ops<X, F>(
    sut: &mut X,
    pool: &[String],
    ops: Vec<Op>,
    capacity: Option<usize>,
    try_insert: F,
    check: impl Fn(&X),
) -> Result<(), TestCaseError>
where
    X: Set<Key>,
    F: Fn(&mut X, Key) -> Result<(), InsertError>,
{
    let mut model: HashSet<Key> = HashSet::new();
    for op in ops {
        match op {
            Op::Add(i) => {
                let k = key_from(pool, i);
                let already = model.contains(&k);
                let full = capacity.is_some_and(|c| model.len() >= c);
                match try_insert(&mut *sut, k.clone()) {
                    Ok(()) => {
                        prop_assert!(!already && !full, "insert must fail on duplicate or full");
                        model.insert(k);
                    }
                    Err(InsertError::TableFull { capacity: c }) => {
                        prop_assert!(full, "full reported below capacity");
                        prop_assert_eq!(Some(c), capacity);
                    }
                    Err(InsertError::DuplicateElement) => {
                        prop_assert!(already && !full, "duplicate only when present");
                    }
                }
            }
            Op::Remove(i) => {
                let k = key_from(pool, i);
                let removed = sut.remove(&k);
                prop_assert_eq!(removed, model.remove(&k));
                prop_assert!(!sut.contains(&k));
            }
            Op::Contains(s) => {
                prop_assert_eq!(sut.contains(s.as_str()), model.contains(s.as_str()));
            }
            Op::Iterate => {
                for k in &model {
                    prop_assert!(sut.contains(k));
                }
            }
        }

        check(&*sut);
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

// Property: ChainedSet matches a HashSet model across random op sequences;
// after every op each node sits in its home bucket, and every element
// iterated is in the model.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_chained_state_machine(cap in 0usize..6, (pool, ops) in arb_scenario()) {
        let mut sut: ChainedSet<Key> = ChainedSet::new(cap);
        run_ops(&mut sut, &pool, ops, None, |s, k| s.try_insert(k), |s| s.check_invariants())?;
        let iterated: BTreeSet<Key> = sut.iter().cloned().collect();
        prop_assert_eq!(iterated.len(), sut.len());
    }

    #[test]
    fn prop_chained_state_machine_with_collisions(cap in 0usize..6, (pool, ops) in arb_scenario()) {
        let mut sut: ChainedSet<Key, ConstBuildHasher> =
            ChainedSet::with_capacity_and_hasher(cap, ConstBuildHasher);
        run_ops(&mut sut, &pool, ops, None, |s, k| s.try_insert(k), |s| s.check_invariants())?;
    }
}

// Property: ProbingSet matches a HashSet model bounded by its capacity; after
// every op no occupied slot is shadowed by an empty slot on its probe path.
// Small capacities keep the table saturated with tombstones.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_probing_state_machine(cap in 0usize..10, (pool, ops) in arb_scenario()) {
        let mut sut: ProbingSet<Key> = ProbingSet::new(cap);
        run_ops(&mut sut, &pool, ops, Some(cap), |s, k| s.try_insert(k), |s| s.check_invariants())?;
        let iterated: BTreeSet<Key> = sut.iter().cloned().collect();
        prop_assert_eq!(iterated.len(), sut.len());
    }

    #[test]
    fn prop_probing_state_machine_with_collisions(cap in 0usize..10, (pool, ops) in arb_scenario()) {
        let mut sut: ProbingSet<Key, ConstBuildHasher> =
            ProbingSet::with_capacity_and_hasher(cap, ConstBuildHasher);
        run_ops(&mut sut, &pool, ops, Some(cap), |s, k| s.try_insert(k), |s| s.check_invariants())?;
    }
}

// Property: ChainedSet never lets the load factor exceed 0.75 going into an
// insert of a new element, and its capacity only ever doubles.
proptest! {
    #[test]
    fn prop_chained_growth_policy(cap in 1usize..8, n in 0usize..200) {
        let mut sut: ChainedSet<usize> = ChainedSet::new(cap);
        let mut expected = cap;
        for v in 0..n {
            if v as f64 / expected as f64 > 0.75 {
                expected *= 2;
            }
            prop_assert!(sut.add(v));
            prop_assert_eq!(sut.capacity(), expected);
        }
        sut.check_invariants();
    }
}
