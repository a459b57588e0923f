use super::*;

fn entry(child_id: u64) -> IndexEntry<u64> {
    IndexEntry {
        child_id,
        mv_separator: crate::types::MvSeparator { lifespan: Lifespan::from(0), key: u64::MAX },
        weight_alive: 0,
        weight_total: 0,
    }
}

#[test]
fn test_install_first_root() {
    let mut roots: RootsTree<u64> = RootsTree::new();
    roots.install_new_root(1, entry(10)).unwrap();
    assert_eq!(roots.current_root().unwrap().child_id, 10);
    assert_eq!(roots.locate_root(1).unwrap().child_id, 10);
    assert_eq!(roots.locate_root(100).unwrap().child_id, 10);
    assert!(roots.locate_root(0).is_err());
}

#[test]
fn test_install_closes_previous_root() {
    let mut roots: RootsTree<u64> = RootsTree::new();
    roots.install_new_root(1, entry(10)).unwrap();
    roots.install_new_root(9, entry(20)).unwrap();

    assert_eq!(roots.locate_root(1).unwrap().child_id, 10);
    assert_eq!(roots.locate_root(8).unwrap().child_id, 10);
    assert_eq!(roots.locate_root(9).unwrap().child_id, 20);
    assert_eq!(roots.current_root().unwrap().child_id, 20);
}
