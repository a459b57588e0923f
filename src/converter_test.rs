use super::*;
use crate::{block::MemContainer, codec::Record, node::LeafEntry, types::Lifespan};

fn sample_leaf() -> Node<u64, Record> {
    Node::Leaf {
        left_link: None,
        right_link: None,
        entries: vec![LeafEntry::new_live(Record { key: 7, value: vec![1, 2, 3] }, 1)],
    }
}

#[test]
fn test_store_new_then_fetch_round_trips() {
    let mut conv: ConverterContainer<MemContainer, u64, Record> = ConverterContainer::new(MemContainer::new(256));
    let node = sample_leaf();
    let id = conv.store_new(&node).unwrap();
    let fetched = conv.fetch(id).unwrap();
    assert_eq!(fetched, node);
}

#[test]
fn test_store_overwrites_existing_block() {
    let mut conv: ConverterContainer<MemContainer, u64, Record> = ConverterContainer::new(MemContainer::new(256));
    let id = conv.store_new(&sample_leaf()).unwrap();

    let replacement = Node::Leaf {
        left_link: None,
        right_link: None,
        entries: vec![LeafEntry { data: Record { key: 9, value: vec![] }, lifespan: Lifespan::from(2), is_alive: true }],
    };
    conv.store(id, &replacement).unwrap();
    assert_eq!(conv.fetch(id).unwrap(), replacement);
}

#[test]
fn test_container_passthrough_block_size_and_close() {
    let mut conv: ConverterContainer<MemContainer, u64, Record> = ConverterContainer::new(MemContainer::new(128));
    assert_eq!(conv.block_size(), 128);
    conv.close().unwrap();
    conv.close().unwrap(); // idempotent, delegates to the wrapped container
}
