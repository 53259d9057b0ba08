// Contract tests run against both strategies through the `Set` trait.
use collision_sets::{ChainedSet, ProbingSet, Set};
use test_log::test;

fn distinct_inserts_are_retained<S: Set<String>>(mut s: S) {
    assert!(s.is_empty());
    for i in 0..20 {
        assert!(s.add(format!("e{i}")));
    }
    assert_eq!(s.len(), 20);
    for i in 0..20 {
        assert!(s.contains(format!("e{i}").as_str()));
    }
    assert!(!s.contains("e20"));
}

fn duplicate_add_leaves_len<S: Set<String>>(mut s: S) {
    assert!(s.add("x".to_string()));
    assert!(!s.add("x".to_string()));
    assert_eq!(s.len(), 1);
}

fn remove_then_readd<S: Set<String>>(mut s: S) {
    assert!(s.add("x".to_string()));
    assert!(!s.remove("y"));
    assert!(s.remove("x"));
    assert!(!s.remove("x"));
    assert!(s.is_empty());
    assert!(s.add("x".to_string()));
    assert!(s.contains("x"));
}

#[test]
fn chained_set_honours_contract() {
    distinct_inserts_are_retained(ChainedSet::new(2));
    duplicate_add_leaves_len(ChainedSet::new(2));
    remove_then_readd(ChainedSet::new(1));
}

#[test]
fn probing_set_honours_contract() {
    distinct_inserts_are_retained(ProbingSet::new(20));
    duplicate_add_leaves_len(ProbingSet::new(2));
    remove_then_readd(ProbingSet::new(1));
}

#[test]
fn diagnostic_through_contract() {
    fn dump<S: Set<u8>>(s: &S) -> String {
        s.diagnostic()
    }
    let mut c = ChainedSet::new(4);
    let mut p = ProbingSet::new(4);
    for v in [1u8, 2, 3] {
        c.add(v);
        p.add(v);
    }
    assert_eq!(dump(&c).lines().map(|l| l.matches("(h:").count()).sum::<usize>(), 3);
    assert_eq!(dump(&p).lines().count(), 4);
}
