use super::*;
use crate::{block::MemContainer, codec::Record};

fn rec(key: u64, n: u8) -> Record {
    Record { key, value: vec![n; 4] }
}

fn small_tree() -> Mvbt<u64, Record, MemContainer> {
    let container = MemContainer::new(256);
    Mvbt::new(container, Config::new(256, 0.25, 0.5))
}

#[test]
fn test_insert_then_point_query() {
    let mut t = small_tree();
    t.insert(1, rec(10, 1)).unwrap();
    assert_eq!(t.point_query(1, 10).unwrap(), Some(rec(10, 1)));
    assert_eq!(t.point_query(1, 99).unwrap(), None);
}

#[test]
fn test_duplicate_insert_rejected() {
    let mut t = small_tree();
    t.insert(1, rec(10, 1)).unwrap();
    let err = t.insert(1, rec(10, 2)).unwrap_err();
    assert!(matches!(err, Error::Duplicate(..)));
}

#[test]
fn test_version_order_enforced() {
    let mut t = small_tree();
    t.insert(5, rec(1, 1)).unwrap();
    let err = t.insert(4, rec(2, 1)).unwrap_err();
    assert!(matches!(err, Error::VersionOrder(..)));
}

#[test]
fn test_delete_then_point_query_misses_but_past_version_sees_it() {
    let mut t = small_tree();
    t.insert(1, rec(10, 1)).unwrap();
    t.delete(2, 10).unwrap();
    assert_eq!(t.point_query(2, 10).unwrap(), None);
    assert_eq!(t.point_query(1, 10).unwrap(), Some(rec(10, 1)));
}

#[test]
fn test_delete_missing_key_fails() {
    let mut t = small_tree();
    t.insert(1, rec(10, 1)).unwrap();
    let err = t.delete(2, 999).unwrap_err();
    assert!(matches!(err, Error::NotFound(..)));
}

#[test]
fn test_range_query_orders_by_key() {
    let mut t = small_tree();
    for (i, k) in [30u64, 10, 20].iter().enumerate() {
        t.insert((i + 1) as i64, rec(*k, 1)).unwrap();
    }
    let out: Vec<_> = crate::iter::SeqIter::new(t.range_query(3, 0, 100).unwrap())
        .map(|r| r.unwrap().key)
        .collect();
    assert_eq!(out, vec![10, 20, 30]);
}

#[test]
fn test_many_inserts_trigger_version_split() {
    let mut t = small_tree();
    for k in 0..64u64 {
        t.insert((k + 1) as i64, rec(k, 1)).unwrap();
    }
    for k in 0..64u64 {
        assert_eq!(t.point_query(64, k).unwrap().map(|r| r.key), Some(k));
    }
    assert!(t.to_stats().n_version_splits > 0);
}

#[test]
fn test_update_replaces_value_without_changing_key() {
    let mut t = small_tree();
    t.insert(1, rec(10, 1)).unwrap();
    t.update(2, 10, rec(10, 2)).unwrap();
    assert_eq!(t.point_query(2, 10).unwrap(), Some(rec(10, 2)));
    assert_eq!(t.point_query(1, 10).unwrap(), Some(rec(10, 1)));
}

#[test]
fn test_time_range_query_sees_dead_and_live_entries() {
    let mut t = small_tree();
    t.insert(1, rec(10, 1)).unwrap();
    t.delete(2, 10).unwrap();
    t.insert(3, rec(20, 1)).unwrap();

    let results: Vec<_> = crate::iter::SeqIter::new(t.time_range_query(0, 100, 0, 10).unwrap())
        .map(|r| r.unwrap().0.key)
        .collect();
    assert!(results.contains(&10));
    assert!(results.contains(&20));
}

#[test]
fn test_empty_tree_queries_return_none() {
    let mut t = small_tree();
    assert_eq!(t.point_query(1, 5).unwrap(), None);
    assert!(t.delete(1, 5).is_err());
}

#[test]
fn test_flush_and_close_are_idempotent() {
    let mut t = small_tree();
    t.insert(1, rec(10, 1)).unwrap();
    t.flush().unwrap();
    t.close().unwrap();
    t.close().unwrap();
}
