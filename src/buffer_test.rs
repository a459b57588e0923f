use super::*;
use crate::block::MemContainer;

#[test]
fn test_get_pin_release_roundtrip() {
    let mut buf = BufferedContainer::new(MemContainer::new(32), Config::new(4));
    let id = buf.allocate().unwrap();
    buf.update(id, vec![5; 32]).unwrap();
    buf.release(id);

    let bytes = buf.get(id).unwrap();
    assert_eq!(bytes, vec![5; 32]);
    buf.release(id);
}

#[test]
fn test_eviction_writes_back_dirty_pages() {
    let mut buf = BufferedContainer::new(MemContainer::new(8), Config::new(2));
    let a = buf.allocate().unwrap();
    buf.update(a, vec![1; 8]).unwrap();
    buf.release(a);

    let b = buf.allocate().unwrap();
    buf.update(b, vec![2; 8]).unwrap();
    buf.release(b);

    // third allocation should evict `a` (LRU, unpinned) and flush it.
    let c = buf.allocate().unwrap();
    buf.release(c);

    let bytes = buf.get(a).unwrap();
    assert_eq!(bytes, vec![1; 8]);
    buf.release(a);
    assert!(buf.to_stats().n_evictions >= 1);
}

#[test]
fn test_pinned_pages_are_never_evicted() {
    let mut buf = BufferedContainer::new(MemContainer::new(8), Config::new(1));
    let a = buf.allocate().unwrap(); // still pinned
    let b = buf.allocate().unwrap(); // buffer over capacity, but `a` is pinned
    buf.release(a);
    buf.release(b);
    assert!(buf.get(a).is_ok());
    buf.release(a);
}

#[test]
fn test_close_is_idempotent() {
    let mut buf = BufferedContainer::new(MemContainer::new(8), Config::new(2));
    buf.close().unwrap();
    buf.close().unwrap();
}
