use arbitrary::{Arbitrary, Unstructured};

use super::*;
use crate::codec::Record;

fn sample_leaf() -> Node<u64, Record> {
    let entries = vec![
        LeafEntry::new_live(Record { key: 1, value: vec![1] }, 1),
        LeafEntry::new_live(Record { key: 2, value: vec![2, 2] }, 2),
        LeafEntry { data: Record { key: 3, value: vec![] }, lifespan: Lifespan { begin: 1, end: 5 }, is_alive: false },
    ];
    Node::Leaf { left_link: None, right_link: None, entries }
}

fn sample_index() -> Node<u64, Record> {
    let entries = vec![IndexEntry {
        child_id: 42,
        mv_separator: MvSeparator { lifespan: Lifespan::from(0), key: 100 },
        weight_alive: 3,
        weight_total: 5,
    }];
    Node::Index { level: 1, left_link: None, right_link: None, entries }
}

#[test]
fn test_leaf_node_roundtrip() {
    let node = sample_leaf();
    let block_size = 256;
    let bytes = node.encode(block_size).unwrap();
    assert_eq!(bytes.len(), block_size);
    let decoded = Node::<u64, Record>::decode(&bytes).unwrap();
    assert_eq!(decoded, node);
}

#[test]
fn test_index_node_roundtrip() {
    let node = sample_index();
    let bytes = node.encode(128).unwrap();
    let decoded = Node::<u64, Record>::decode(&bytes).unwrap();
    assert_eq!(decoded, node);
}

#[test]
fn test_node_too_large_for_block_fails() {
    let node = sample_leaf();
    assert!(node.encode(8).is_err());
}

#[test]
fn test_live_count() {
    let node = sample_leaf();
    assert_eq!(node.live_count(3), 2);
    assert_eq!(node.live_count(10), 2);
}

/// §8 property 7, fuzz-style: any `Arbitrary`-generated leaf node must
/// survive an encode/decode round trip unchanged. `Unstructured` draws
/// from a fixed byte source rather than an RNG, so a repeatable buffer
/// stands in for a seed.
#[test]
fn test_arbitrary_leaf_node_roundtrip() {
    let source: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
    let mut u = Unstructured::new(&source);

    for _ in 0..20 {
        let record = Record::arbitrary(&mut u).unwrap();
        let begin = i64::arbitrary(&mut u).unwrap().saturating_abs();
        let entries = vec![LeafEntry::new_live(record, begin)];
        let node = Node::Leaf { left_link: None, right_link: None, entries };

        let bytes = node.encode(4096).unwrap();
        let decoded = Node::<u64, Record>::decode(&bytes).unwrap();
        assert_eq!(decoded, node);
    }
}

#[test]
fn test_thresholds_b8_d025_e05() {
    let t = Thresholds::new(8, 0.25, 0.5);
    assert_eq!(t.weak_floor, 4);
    assert_eq!(t.fanout_a, 2);
    assert!(t.strong_floor <= t.weak_floor);
    assert!(t.strong_ceiling >= t.weak_floor);
}
