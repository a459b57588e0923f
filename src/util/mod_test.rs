use super::*;

#[test]
fn test_le_roundtrip() {
    let mut buf = vec![];
    u16_to_bytes(0xabcd, &mut buf);
    u32_to_bytes(0xdead_beef, &mut buf);
    u64_to_bytes(0x0123_4567_89ab_cdef, &mut buf);
    i64_to_bytes(-42, &mut buf);

    let mut rest = &buf[..];
    assert_eq!(bytes_to_u16(rest).unwrap(), 0xabcd);
    rest = &rest[2..];
    assert_eq!(bytes_to_u32(rest).unwrap(), 0xdead_beef);
    rest = &rest[4..];
    assert_eq!(bytes_to_u64(rest).unwrap(), 0x0123_4567_89ab_cdef);
    rest = &rest[8..];
    assert_eq!(bytes_to_i64(rest).unwrap(), -42);
}

#[test]
fn test_short_buffer_decode_fails() {
    let buf = vec![0u8; 1];
    assert!(bytes_to_u64(&buf).is_err());
}
