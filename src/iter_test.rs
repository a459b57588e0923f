use super::*;

#[test]
fn test_vec_seq_has_next_and_next() {
    let mut seq = VecSeq::new(vec![1, 2, 3]);
    assert!(seq.has_next().unwrap());
    assert_eq!(seq.next().unwrap(), Some(1));
    assert_eq!(seq.next().unwrap(), Some(2));
    assert_eq!(seq.next().unwrap(), Some(3));
    assert_eq!(seq.next().unwrap(), None);
}

#[test]
fn test_seq_iter_adapts_to_std_iterator() {
    let seq = VecSeq::new(vec!["a", "b"]);
    let collected: Vec<_> = SeqIter::new(seq).map(|r| r.unwrap()).collect();
    assert_eq!(collected, vec!["a", "b"]);
}
