//! C4: leaf and index node layout (§4.3, §6) plus the capacity/occupancy
//! thresholds derived from a node class's `(B, D, E)` configuration.

use crate::{
    block::BlockId,
    codec::{Codec, Keyed},
    types::{Lifespan, MvSeparator, Version, OPEN_END},
    util, Error, Result,
};

/// A single versioned record inside a leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct LeafEntry<V> {
    pub data: V,
    pub lifespan: Lifespan,
    pub is_alive: bool,
}

impl<V> LeafEntry<V> {
    pub fn new_live(data: V, begin: Version) -> LeafEntry<V> {
        LeafEntry { data, lifespan: Lifespan::from(begin), is_alive: true }
    }

    fn encode(&self, buf: &mut Vec<u8>) -> usize
    where
        V: Codec,
    {
        let mut n = 0;
        util::i64_to_bytes(self.lifespan.begin, buf);
        n += 8;
        let end = if self.lifespan.is_open() { OPEN_END } else { self.lifespan.end };
        util::i64_to_bytes(end, buf);
        n += 8;
        buf.push(self.is_alive as u8);
        n += 1;
        n + self.data.encode(buf)
    }

    fn decode(buf: &[u8]) -> Result<(LeafEntry<V>, usize)>
    where
        V: Codec,
    {
        check_remaining!(buf, 17, "leaf entry header")?;
        let begin = util::bytes_to_i64(&buf[0..8])?;
        let end = util::bytes_to_i64(&buf[8..16])?;
        let is_alive = buf[16] != 0;
        let (data, n) = V::decode(&buf[17..])?;
        Ok((LeafEntry { data, lifespan: Lifespan { begin, end }, is_alive }, 17 + n))
    }
}

/// Points at a child node, tagged with the version/key range it covers and
/// the weight counters used by weight-balance checks and the bulk loader.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexEntry<K> {
    pub child_id: BlockId,
    pub mv_separator: MvSeparator<K>,
    pub weight_alive: u32,
    pub weight_total: u32,
}

impl<K: Copy> IndexEntry<K> {
    fn encode(&self, buf: &mut Vec<u8>) -> usize
    where
        K: Codec,
    {
        let mut n = 0;
        util::u64_to_bytes(self.child_id, buf);
        n += 8;
        util::i64_to_bytes(self.mv_separator.lifespan.begin, buf);
        n += 8;
        let end = if self.mv_separator.lifespan.is_open() {
            OPEN_END
        } else {
            self.mv_separator.lifespan.end
        };
        util::i64_to_bytes(end, buf);
        n += 8;
        n += self.mv_separator.key.encode(buf);
        util::u32_to_bytes(self.weight_alive, buf);
        n += 4;
        util::u32_to_bytes(self.weight_total, buf);
        n + 4
    }

    fn decode(buf: &[u8]) -> Result<(IndexEntry<K>, usize)>
    where
        K: Codec,
    {
        check_remaining!(buf, 24, "index entry header")?;
        let child_id = util::bytes_to_u64(&buf[0..8])?;
        let begin = util::bytes_to_i64(&buf[8..16])?;
        let end = util::bytes_to_i64(&buf[16..24])?;
        let (key, n) = K::decode(&buf[24..])?;
        let off = 24 + n;
        check_remaining!(buf[off..], 8, "index entry weights")?;
        let weight_alive = util::bytes_to_u32(&buf[off..off + 4])?;
        let weight_total = util::bytes_to_u32(&buf[off + 4..off + 8])?;
        Ok((
            IndexEntry {
                child_id,
                mv_separator: MvSeparator { lifespan: Lifespan { begin, end }, key },
                weight_alive,
                weight_total,
            },
            off + 8,
        ))
    }
}

/// A node is either a leaf of records or an index of child pointers (§3).
#[derive(Clone, Debug, PartialEq)]
pub enum Node<K, V> {
    Leaf {
        left_link: Option<IndexEntry<K>>,
        right_link: Option<IndexEntry<K>>,
        entries: Vec<LeafEntry<V>>,
    },
    Index {
        level: u16,
        left_link: Option<IndexEntry<K>>,
        right_link: Option<IndexEntry<K>>,
        entries: Vec<IndexEntry<K>>,
    },
}

impl<K, V> Node<K, V>
where
    K: Copy + Codec,
    V: Codec + Keyed<K>,
{
    pub fn level(&self) -> u16 {
        match self {
            Node::Leaf { .. } => 0,
            Node::Index { level, .. } => *level,
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Node::Leaf { entries, .. } => entries.len(),
            Node::Index { entries, .. } => entries.len(),
        }
    }

    pub fn live_count(&self, v: Version) -> usize {
        match self {
            Node::Leaf { entries, .. } => entries.iter().filter(|e| e.lifespan.contains(v)).count(),
            Node::Index { entries, .. } => entries
                .iter()
                .filter(|e| e.mv_separator.lifespan.contains(v))
                .map(|e| e.weight_alive as usize)
                .sum(),
        }
    }

    /// Encode this node into a block-sized byte buffer per the §6 layout,
    /// zero-padded to `block_size`.
    pub fn encode(&self, block_size: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(block_size);
        util::u16_to_bytes(self.level(), &mut buf);
        util::u16_to_bytes(self.count() as u16, &mut buf);
        encode_link(self.left_link(), &mut buf);
        encode_link(self.right_link(), &mut buf);

        match self {
            Node::Leaf { entries, .. } => {
                for e in entries {
                    e.encode(&mut buf);
                }
            }
            Node::Index { entries, .. } => {
                for e in entries {
                    e.encode(&mut buf);
                }
            }
        }

        if buf.len() > block_size {
            return err_at!(
                Fatal, msg: "node encoding {} exceeds block size {}", buf.len(), block_size
            );
        }
        buf.resize(block_size, 0);
        Ok(buf)
    }

    pub fn decode(buf: &[u8]) -> Result<Node<K, V>> {
        check_remaining!(buf, 4, "node header")?;
        let level = util::bytes_to_u16(&buf[0..2])?;
        let count = util::bytes_to_u16(&buf[2..4])? as usize;
        let mut off = 4;
        let (left_link, n) = decode_link::<K>(&buf[off..])?;
        off += n;
        let (right_link, n) = decode_link::<K>(&buf[off..])?;
        off += n;

        if level == 0 {
            let mut entries = Vec::with_capacity(count);
            for _ in 0..count {
                let (e, n) = LeafEntry::<V>::decode(&buf[off..])?;
                off += n;
                entries.push(e);
            }
            Ok(Node::Leaf { left_link, right_link, entries })
        } else {
            let mut entries = Vec::with_capacity(count);
            for _ in 0..count {
                let (e, n) = IndexEntry::<K>::decode(&buf[off..])?;
                off += n;
                entries.push(e);
            }
            Ok(Node::Index { level, left_link, right_link, entries })
        }
    }

    fn left_link(&self) -> &Option<IndexEntry<K>> {
        match self {
            Node::Leaf { left_link, .. } => left_link,
            Node::Index { left_link, .. } => left_link,
        }
    }

    fn right_link(&self) -> &Option<IndexEntry<K>> {
        match self {
            Node::Leaf { right_link, .. } => right_link,
            Node::Index { right_link, .. } => right_link,
        }
    }
}

fn encode_link<K: Copy + Codec>(link: &Option<IndexEntry<K>>, buf: &mut Vec<u8>) {
    match link {
        Some(e) => {
            buf.push(1);
            e.encode(buf);
        }
        None => buf.push(0),
    }
}

fn decode_link<K: Copy + Codec>(buf: &[u8]) -> Result<(Option<IndexEntry<K>>, usize)> {
    check_remaining!(buf, 1, "link tag")?;
    if buf[0] == 0 {
        Ok((None, 1))
    } else {
        let (e, n) = IndexEntry::<K>::decode(&buf[1..])?;
        Ok((Some(e), 1 + n))
    }
}

/// Derived occupancy thresholds for a node class, cached at init per §4.5.5
/// (computed once in floating point, never recomputed).
#[derive(Clone, Copy, Debug)]
pub struct Thresholds {
    pub capacity: usize,
    /// `⌈E·B⌉`: weak version condition floor.
    pub weak_floor: usize,
    /// `⌈(D+ε)·B⌉`: strong version condition merge floor.
    pub strong_floor: usize,
    /// `(1−ε)·B`: strong version condition split ceiling.
    pub strong_ceiling: usize,
    /// `⌊B/4⌋`, the bulk-loader fanout parameter `a` (§9).
    pub fanout_a: usize,
}

impl Thresholds {
    pub fn new(capacity: usize, d: f64, e: f64) -> Thresholds {
        debug_assert!(d > 0.0 && d <= 0.5);
        debug_assert!(e > d && e <= 1.0 - d);
        let epsilon = (e - d) / 2.0;
        let b = capacity as f64;
        Thresholds {
            capacity,
            weak_floor: (e * b).ceil() as usize,
            strong_floor: ((d + epsilon) * b).ceil() as usize,
            strong_ceiling: ((1.0 - epsilon) * b) as usize,
            fanout_a: (capacity / 4).max(1),
        }
    }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
