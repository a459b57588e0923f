use super::*;

#[test]
fn test_u64_roundtrip() {
    let mut buf = vec![];
    let n = 42u64.encode(&mut buf);
    assert_eq!(n, 8);
    let (val, consumed) = u64::decode(&buf).unwrap();
    assert_eq!(val, 42);
    assert_eq!(consumed, 8);
}

#[test]
fn test_record_roundtrip() {
    let rec = Record { key: 7, value: vec![1, 2, 3, 4, 5] };
    let mut buf = vec![];
    rec.encode(&mut buf);
    let (got, n) = Record::decode(&buf).unwrap();
    assert_eq!(got, rec);
    assert_eq!(n, buf.len());
}

#[test]
fn test_vec_u8_short_buffer_fails() {
    let mut buf = vec![];
    util::u32_to_bytes(100, &mut buf);
    assert!(Vec::<u8>::decode(&buf).is_err());
}
