use super::*;

#[test]
fn test_mem_container_allocate_get_update() {
    let mut c = MemContainer::new(64);
    let id = c.allocate().unwrap();
    assert_eq!(c.get(id).unwrap(), vec![0; 64]);

    let bytes = vec![7u8; 64];
    c.update(id, &bytes).unwrap();
    assert_eq!(c.get(id).unwrap(), bytes);
}

#[test]
fn test_mem_container_remove_then_not_found() {
    let mut c = MemContainer::new(16);
    let id = c.allocate().unwrap();
    c.remove(id).unwrap();
    assert!(c.get(id).is_err());
}

#[test]
fn test_mem_container_reuses_freed_id() {
    let mut c = MemContainer::new(16);
    let a = c.allocate().unwrap();
    c.remove(a).unwrap();
    let b = c.allocate().unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_mem_container_update_size_mismatch() {
    let mut c = MemContainer::new(16);
    let id = c.allocate().unwrap();
    assert!(c.update(id, &[0u8; 8]).is_err());
}

#[test]
fn test_mem_container_close_idempotent() {
    let mut c = MemContainer::new(16);
    c.close().unwrap();
    c.close().unwrap();
}
