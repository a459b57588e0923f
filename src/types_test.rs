use super::*;

#[test]
fn test_lifespan_contains() {
    let open = Lifespan::from(5);
    assert!(!open.contains(4));
    assert!(open.contains(5));
    assert!(open.contains(1_000_000));

    let closed = open.close(10);
    assert!(closed.contains(5));
    assert!(closed.contains(9));
    assert!(!closed.contains(10));
}

#[test]
fn test_lifespan_overlaps() {
    let a = Lifespan { begin: 0, end: 10 };
    let b = Lifespan { begin: 5, end: 15 };
    let c = Lifespan { begin: 10, end: 20 };
    assert!(a.overlaps(&b));
    assert!(!a.overlaps(&c));
    assert!(Lifespan::from(0).overlaps(&c));
}

#[test]
fn test_key_range_contains() {
    let kr = KeyRange::new(10, 20);
    assert!(kr.contains(10));
    assert!(kr.contains(20));
    assert!(!kr.contains(9));
    assert!(!kr.contains(21));
}

#[test]
fn test_mv_separator_contains() {
    let sep = MvSeparator { lifespan: Lifespan::from(0), key: 100 };
    assert!(sep.contains(50, 5));
    assert!(!sep.contains(150, 5));
}
