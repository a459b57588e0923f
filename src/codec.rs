//! C2: the converter container's serializer contract, plus implementations
//! for the key/record types used throughout the examples and tests.
//!
//! Encoding here is deterministic and position-preserving (§4.2): reading a
//! just-written value must yield an equal value. This is intentionally a
//! small, fixed-width-friendly trait rather than a self-describing codec —
//! §6 mandates an exact little-endian byte layout for blocks and nodes,
//! which a variable-length/self-describing format cannot promise.

use arbitrary::Arbitrary;

use crate::{util, Result};

/// Encode/decode contract for anything stored inside a node or block.
pub trait Codec: Sized {
    /// Append `self`'s encoding to `buf`, returning the number of bytes
    /// written.
    fn encode(&self, buf: &mut Vec<u8>) -> usize;

    /// Parse a value from the front of `buf`, returning the value and the
    /// number of bytes consumed.
    fn decode(buf: &[u8]) -> Result<(Self, usize)>;
}

/// Records carry a key extractable without decoding the whole payload
/// twice; implementors typically store the key as a prefix of their own
/// encoding.
pub trait Keyed<K> {
    fn key(&self) -> K;
}

impl Codec for u64 {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        util::u64_to_bytes(*self, buf);
        8
    }

    fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        Ok((util::bytes_to_u64(buf)?, 8))
    }
}

impl Codec for i64 {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        util::i64_to_bytes(*self, buf);
        8
    }

    fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        Ok((util::bytes_to_i64(buf)?, 8))
    }
}

/// Length-prefixed byte blob: a 4-byte LE length header followed by the
/// payload, the same shape used in this codebase's other fixed-but-nested
/// encodings.
impl Codec for Vec<u8> {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        util::u32_to_bytes(self.len() as u32, buf);
        buf.extend_from_slice(self);
        4 + self.len()
    }

    fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let len = util::bytes_to_u32(buf)? as usize;
        check_remaining!(buf[4..], len, "vec<u8> payload")?;
        Ok((buf[4..4 + len].to_vec(), 4 + len))
    }
}

/// `(u64 key, Vec<u8> value)` record: a key with an opaque byte payload,
/// the running example used by §1/§3. Derives `Arbitrary` so fuzz-style
/// tests can generate one straight from a byte source (§8 property 7).
#[derive(Clone, Debug, PartialEq, Eq, Arbitrary)]
pub struct Record {
    pub key: u64,
    pub value: Vec<u8>,
}

impl Keyed<u64> for Record {
    fn key(&self) -> u64 {
        self.key
    }
}

impl Codec for Record {
    fn encode(&self, buf: &mut Vec<u8>) -> usize {
        let mut n = self.key.encode(buf);
        n += self.value.encode(buf);
        n
    }

    fn decode(buf: &[u8]) -> Result<(Self, usize)> {
        let (key, n1) = u64::decode(buf)?;
        let (value, n2) = Vec::<u8>::decode(&buf[n1..])?;
        Ok((Record { key, value }, n1 + n2))
    }
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;
