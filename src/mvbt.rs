//! C6: the version-aware MVBT core — insert/delete/update, point/range/
//! time-travel queries, and the split/merge/weight-rebalancing rules of
//! §4.5. This is the component the rest of the crate exists to support.

use crate::{
    block::{BlockId, Container},
    buffer::BufferedContainer,
    codec::{Codec, Keyed},
    converter::ConverterContainer,
    iter::VecSeq,
    node::{IndexEntry, LeafEntry, Node, Thresholds},
    roots::RootsTree,
    types::{KeyRange, Lifespan, MvSeparator, Version, NIL_VERSION},
    Error, Result,
};

/// Configuration for a new [`Mvbt`]. Subsequently persisted via the
/// metadata file (C8) so a reopened tree does not need these repeated.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub block_size: usize,
    /// Minimum occupancy ratio, `D ∈ (0, 0.5]`.
    pub d: f64,
    /// Weak version condition ratio, `E ∈ (D, 1-D]`.
    pub e: f64,
    pub nil_version: Version,
}

impl Config {
    pub fn new(block_size: usize, d: f64, e: f64) -> Config {
        Config { block_size, d, e, nil_version: NIL_VERSION }
    }
}

/// Running counters for an [`Mvbt`], mirroring this codebase's
/// `Config`/`Stats` pairing convention.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    pub n_inserts: u64,
    pub n_deletes: u64,
    pub n_version_splits: u64,
    pub n_key_splits: u64,
    pub n_merges: u64,
}

/// Outcome of applying an operation to a node: either it settled in place,
/// or it must be replaced by one or more entries in its parent (a version
/// split, optionally followed by a key split or merge).
enum Outcome<E> {
    InPlace,
    Replace(Vec<E>),
}

/// The multi-version B+-tree core (§4.5).
pub struct Mvbt<K, V, C: Container> {
    config: Config,
    thresholds: Thresholds,
    buffer: BufferedContainer<ConverterContainer<C, K, V>>,
    roots: RootsTree<K>,
    v_current: Version,
    key_range: Option<KeyRange<K>>,
    stats: Stats,
}

impl<K, V, C> Mvbt<K, V, C>
where
    K: Copy + Ord + std::hash::Hash + Codec,
    V: Clone + Codec + Keyed<K>,
    C: Container,
{
    /// Create a new, empty MVBT over a fresh container.
    pub fn new(container: C, config: Config) -> Mvbt<K, V, C> {
        let capacity = node_capacity(config.block_size);
        let thresholds = Thresholds::new(capacity, config.d, config.e);
        let converter = ConverterContainer::new(container);
        let buffer = BufferedContainer::new(converter, crate::buffer::Config::new(capacity.max(16)));
        Mvbt {
            config,
            thresholds,
            buffer,
            roots: RootsTree::new(),
            v_current: config.nil_version,
            key_range: None,
            stats: Stats::default(),
        }
    }

    /// Restore a tree from a previously persisted container + roots tree
    /// (C8 metadata round-trip, §8 property 5 / S5).
    pub fn restore(
        container: C,
        config: Config,
        roots: RootsTree<K>,
        v_current: Version,
        key_range: Option<KeyRange<K>>,
    ) -> Mvbt<K, V, C> {
        let capacity = node_capacity(config.block_size);
        let thresholds = Thresholds::new(capacity, config.d, config.e);
        let converter = ConverterContainer::new(container);
        let buffer = BufferedContainer::new(converter, crate::buffer::Config::new(capacity.max(16)));
        Mvbt { config, thresholds, buffer, roots, v_current, key_range, stats: Stats::default() }
    }

    pub fn to_stats(&self) -> Stats {
        self.stats
    }

    pub fn v_current(&self) -> Version {
        self.v_current
    }

    pub fn roots(&self) -> &RootsTree<K> {
        &self.roots
    }

    pub fn key_range(&self) -> Option<KeyRange<K>> {
        self.key_range
    }

    pub fn flush(&mut self) -> Result<()> {
        self.buffer.flush()
    }

    pub fn close(&mut self) -> Result<()> {
        self.buffer.close()
    }

    fn fetch(&mut self, id: BlockId) -> Result<Node<K, V>> {
        let bytes = self.buffer.get(id)?;
        let node = Node::decode(&bytes)?;
        self.buffer.release(id);
        Ok(node)
    }

    fn store_new(&mut self, node: &Node<K, V>) -> Result<BlockId> {
        let id = self.buffer.allocate()?;
        let bytes = node.encode(self.config.block_size)?;
        self.buffer.update(id, bytes)?;
        self.buffer.release(id);
        Ok(id)
    }

    fn store_at(&mut self, id: BlockId, node: &Node<K, V>) -> Result<()> {
        let bytes = node.encode(self.config.block_size)?;
        self.buffer.get(id)?;
        self.buffer.update(id, bytes)?;
        self.buffer.release(id);
        Ok(())
    }

    fn widen_key_range(&mut self, key: K) {
        self.key_range = Some(match self.key_range {
            None => KeyRange::new(key, key),
            Some(kr) => KeyRange::new(kr.min.min(key), kr.max.max(key)),
        });
    }

    // ---------------------------------------------------------------
    // Public operations (§4.5.1)
    // ---------------------------------------------------------------

    pub fn insert(&mut self, v: Version, record: V) -> Result<()> {
        if v < self.v_current {
            return err_at!(VersionOrder, msg: "insert version {} < current {}", v, self.v_current);
        }
        let key = record.key();

        if self.roots.current_root().is_none() {
            // S9: inserting into an empty tree creates one leaf, one root.
            let leaf = Node::Leaf {
                left_link: None,
                right_link: None,
                entries: vec![LeafEntry::new_live(record, v)],
            };
            let id = self.store_new(&leaf)?;
            self.roots.install_new_root(
                v,
                IndexEntry {
                    child_id: id,
                    mv_separator: MvSeparator { lifespan: Lifespan::from(v), key },
                    weight_alive: 1,
                    weight_total: 1,
                },
            )?;
            self.v_current = v;
            self.widen_key_range(key);
            self.stats.n_inserts += 1;
            return Ok(());
        }

        if self.point_query(self.v_current, key)?.is_some() {
            return err_at!(Duplicate, msg: "key already live at version {}", self.v_current);
        }

        let root = self.roots.current_root().unwrap().clone();
        let outcome = self.insert_descend(root.child_id, v, &record, key)?;
        self.apply_root_outcome(outcome, v)?;
        self.v_current = v;
        self.widen_key_range(key);
        self.stats.n_inserts += 1;
        Ok(())
    }

    pub fn delete(&mut self, v: Version, key: K) -> Result<()> {
        if v < self.v_current {
            return err_at!(VersionOrder, msg: "delete version {} < current {}", v, self.v_current);
        }
        let root = match self.roots.current_root() {
            Some(r) => r.clone(),
            None => return err_at!(NotFound, msg: "tree is empty"),
        };
        if self.point_query(self.v_current, key)?.is_none() {
            return err_at!(NotFound, msg: "no live entry for key at version {}", self.v_current);
        }

        let outcome = self.delete_descend(root.child_id, v, key)?;
        self.apply_root_outcome(outcome, v)?;
        self.v_current = v;
        self.stats.n_deletes += 1;
        Ok(())
    }

    /// `update(v, key, new_record)`: delete-then-insert executed as one
    /// step so no intermediate state with neither version is observable.
    pub fn update(&mut self, v: Version, key: K, new_record: V) -> Result<()> {
        if v < self.v_current {
            return err_at!(VersionOrder, msg: "update version {} < current {}", v, self.v_current);
        }
        if self.point_query(self.v_current, key)?.is_none() {
            return err_at!(NotFound, msg: "no live entry for key at version {}", self.v_current);
        }
        let root = self.roots.current_root().unwrap().clone();
        let outcome = self.delete_descend(root.child_id, v, key)?;
        self.apply_root_outcome(outcome, v)?;

        let root = self.roots.current_root().unwrap().clone();
        let outcome = self.insert_descend(root.child_id, v, &new_record, key)?;
        self.apply_root_outcome(outcome, v)?;

        self.v_current = v;
        self.widen_key_range(key);
        Ok(())
    }

    pub fn point_query(&mut self, v: Version, key: K) -> Result<Option<V>> {
        let root = match self.roots.locate_root(v) {
            Ok(r) => r.clone(),
            Err(_) => return Ok(None),
        };
        let mut node = self.fetch(root.child_id)?;
        loop {
            match node {
                Node::Leaf { entries, .. } => {
                    return Ok(entries
                        .into_iter()
                        .find(|e| e.data.key() == key && e.lifespan.contains(v))
                        .map(|e| e.data));
                }
                Node::Index { entries, .. } => match select_child(&entries, key, v, false) {
                    Some(idx) => node = self.fetch(entries[idx].child_id)?,
                    None => return Ok(None),
                },
            }
        }
    }

    pub fn range_query(&mut self, v: Version, k_lo: K, k_hi: K) -> Result<VecSeq<V>> {
        let root = match self.roots.locate_root(v) {
            Ok(r) => r.clone(),
            Err(_) => return Ok(VecSeq::new(vec![])),
        };
        let mut out = vec![];
        self.collect_range(root.child_id, v, k_lo, k_hi, &mut out)?;
        out.sort_by(|a: &V, b: &V| a.key().cmp(&b.key()));
        Ok(VecSeq::new(out))
    }

    pub fn time_range_query(
        &mut self,
        k_lo: K,
        k_hi: K,
        v_lo: Version,
        v_hi: Version,
    ) -> Result<VecSeq<(V, Lifespan)>> {
        let window = Lifespan { begin: v_lo, end: v_hi };
        let mut out = vec![];
        let roots: Vec<_> = self
            .roots
            .entries()
            .iter()
            .filter(|e| e.lifespan.overlaps(&window))
            .map(|e| e.root.clone())
            .collect();

        let mut seen = std::collections::HashSet::new();
        for root in roots {
            self.collect_time_range(root.child_id, k_lo, k_hi, &window, &mut seen, &mut out)?;
        }
        out.sort_by(|a, b| a.0.key().cmp(&b.0.key()).then(a.1.begin.cmp(&b.1.begin)));
        Ok(VecSeq::new(out))
    }

    // ---------------------------------------------------------------
    // Descent helpers for range/time-range queries
    // ---------------------------------------------------------------

    fn collect_range(&mut self, id: BlockId, v: Version, k_lo: K, k_hi: K, out: &mut Vec<V>) -> Result<()> {
        match self.fetch(id)? {
            Node::Leaf { entries, .. } => {
                for e in entries {
                    let key = e.data.key();
                    if e.lifespan.contains(v) && key >= k_lo && key <= k_hi {
                        out.push(e.data);
                    }
                }
            }
            Node::Index { entries, .. } => {
                for entry in entries.iter() {
                    if !entry.mv_separator.lifespan.contains(v) {
                        continue;
                    }
                    // a child is in range unless it is entirely below k_lo;
                    // separators are keyed by upper bound so we can't tell
                    // the lower bound cheaply — visit conservatively.
                    if entry.mv_separator.key >= k_lo {
                        self.collect_range(entry.child_id, v, k_lo, k_hi, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn collect_time_range(
        &mut self,
        id: BlockId,
        k_lo: K,
        k_hi: K,
        window: &Lifespan,
        seen: &mut std::collections::HashSet<(K, Version)>,
        out: &mut Vec<(V, Lifespan)>,
    ) -> Result<()> {
        match self.fetch(id)? {
            Node::Leaf { entries, .. } => {
                for e in entries {
                    let key = e.data.key();
                    if key >= k_lo && key <= k_hi && e.lifespan.overlaps(window) {
                        if seen.insert((key, e.lifespan.begin)) {
                            out.push((e.data, e.lifespan));
                        }
                    }
                }
            }
            Node::Index { entries, .. } => {
                for entry in entries.iter() {
                    if !entry.mv_separator.lifespan.overlaps(window) {
                        continue;
                    }
                    if entry.mv_separator.key >= k_lo {
                        self.collect_time_range(entry.child_id, k_lo, k_hi, window, seen, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Insert descent (§4.5.3)
    // ---------------------------------------------------------------

    fn insert_descend(
        &mut self,
        id: BlockId,
        v: Version,
        record: &V,
        key: K,
    ) -> Result<Outcome<IndexEntry<K>>> {
        let node = self.fetch(id)?;
        match node {
            Node::Leaf { left_link, right_link, mut entries } => {
                entries.push(LeafEntry::new_live(record.clone(), v));
                entries.sort_by(|a, b| a.data.key().cmp(&b.data.key()).then(a.lifespan.begin.cmp(&b.lifespan.begin)));

                if entries.len() <= self.thresholds.capacity {
                    self.store_at(id, &Node::Leaf { left_link, right_link, entries })?;
                    Ok(Outcome::InPlace)
                } else {
                    self.leaf_version_split(id, v, left_link, right_link, entries)
                }
            }
            Node::Index { level, left_link, right_link, entries } => {
                let idx = select_child(&entries, key, v, true)
                    .ok_or(())
                    .or_else(|_| err_at!(Invariant, msg: "no live child to descend into"))?;
                let child_id = entries[idx].child_id;
                let outcome = self.insert_descend(child_id, v, record, key)?;
                self.apply_child_outcome(id, level, left_link, right_link, entries, idx, v, outcome)
            }
        }
    }

    fn delete_descend(&mut self, id: BlockId, v: Version, key: K) -> Result<Outcome<IndexEntry<K>>> {
        let node = self.fetch(id)?;
        match node {
            Node::Leaf { left_link, right_link, mut entries } => {
                for e in entries.iter_mut() {
                    if e.data.key() == key && e.lifespan.contains(v) {
                        e.lifespan = e.lifespan.close(v);
                        e.is_alive = false;
                        break;
                    }
                }
                let live = entries.iter().filter(|e| e.lifespan.contains(v)).count();
                if live >= self.thresholds.weak_floor || self.is_root_leaf(id) {
                    self.store_at(id, &Node::Leaf { left_link, right_link, entries })?;
                    Ok(Outcome::InPlace)
                } else {
                    self.leaf_version_split(id, v, left_link, right_link, entries)
                }
            }
            Node::Index { level, left_link, right_link, entries } => {
                let idx = select_child(&entries, key, v, true)
                    .ok_or(())
                    .or_else(|_| err_at!(Invariant, msg: "no live child to descend into"))?;
                let child_id = entries[idx].child_id;
                let outcome = self.delete_descend(child_id, v, key)?;
                self.apply_child_outcome(id, level, left_link, right_link, entries, idx, v, outcome)
            }
        }
    }

    fn is_root_leaf(&self, id: BlockId) -> bool {
        self.roots.current_root().map(|r| r.child_id == id).unwrap_or(false)
    }

    /// Apply a child's outcome to its parent's entry list, honoring the
    /// weak/strong version condition on the parent itself (§3, §4.5.3).
    fn apply_child_outcome(
        &mut self,
        id: BlockId,
        level: u16,
        left_link: Option<IndexEntry<K>>,
        right_link: Option<IndexEntry<K>>,
        mut entries: Vec<IndexEntry<K>>,
        idx: usize,
        v: Version,
        outcome: Outcome<IndexEntry<K>>,
    ) -> Result<Outcome<IndexEntry<K>>> {
        match outcome {
            Outcome::InPlace => {
                // refresh this child's weight counters from its (possibly
                // updated) node. weight_alive only counts what's live now;
                // weight_total is cumulative over the child's lifetime, so
                // an Index child's contribution is the sum over its own
                // entries (its own leaf fan-out), not its current fanout.
                let child = self.fetch(entries[idx].child_id)?;
                entries[idx].weight_alive = child.live_count(v) as u32;
                entries[idx].weight_total = match &child {
                    Node::Leaf { entries, .. } => entries.len() as u32,
                    Node::Index { entries, .. } => entries.iter().map(|e| e.weight_total).sum(),
                };
                self.store_at(id, &Node::Index { level, left_link, right_link, entries })?;
                Ok(Outcome::InPlace)
            }
            Outcome::Replace(new_entries) => {
                // close the pre-split child's separator rather than discard
                // it: §3 requires a closed node remain reachable at any
                // version before the split that created its replacement,
                // and that invariant applies at every level, not only the
                // Roots Tree.
                if entries[idx].mv_separator.lifespan.is_open() && entries[idx].mv_separator.lifespan.begin < v {
                    entries[idx].mv_separator.lifespan = entries[idx].mv_separator.lifespan.close(v);
                }

                // strong version condition: a lone replacement that fell
                // below the merge floor gets folded into a live sibling
                // instead of left underweight.
                let spliced = if new_entries.len() == 1
                    && new_entries[0].weight_alive < self.thresholds.strong_floor as u32
                {
                    match self.try_merge_with_sibling(&mut entries, idx, level, v, new_entries[0].clone())? {
                        Some(merged) => merged,
                        None => new_entries,
                    }
                } else {
                    new_entries
                };

                entries.extend(spliced);
                entries.sort_by(|a, b| {
                    a.mv_separator
                        .key
                        .cmp(&b.mv_separator.key)
                        .then(a.mv_separator.lifespan.begin.cmp(&b.mv_separator.lifespan.begin))
                });

                if entries.len() <= self.thresholds.capacity {
                    self.store_at(id, &Node::Index { level, left_link, right_link, entries: entries.clone() })?;
                    Ok(Outcome::InPlace)
                } else {
                    self.index_version_split(id, level, v, left_link, right_link, entries)
                }
            }
        }
    }

    /// Attempt the strong version condition's merge path: combine
    /// `new_entry`'s node with the nearest live sibling in `entries`
    /// (skipping already-closed historical entries), key-splitting the
    /// union back apart if it would overflow. Returns `None` (no-op) if
    /// `entries` has no other live entry to merge with, e.g. a sole child.
    fn try_merge_with_sibling(
        &mut self,
        entries: &mut Vec<IndexEntry<K>>,
        idx: usize,
        level: u16,
        v: Version,
        new_entry: IndexEntry<K>,
    ) -> Result<Option<Vec<IndexEntry<K>>>> {
        let left = (0..idx).rev().find(|&i| entries[i].mv_separator.lifespan.contains(v));
        let right = (idx + 1..entries.len()).find(|&i| entries[i].mv_separator.lifespan.contains(v));
        let sib_idx = match (left, right) {
            (Some(l), _) => l,
            (None, Some(r)) => r,
            (None, None) => return Ok(None),
        };
        let sib_entry = entries[sib_idx].clone();
        self.stats.n_merges += 1;

        let merged = if level == 1 {
            let (a, b) = (self.fetch(new_entry.child_id)?, self.fetch(sib_entry.child_id)?);
            let (a_entries, b_entries) = match (a, b) {
                (Node::Leaf { entries: a, .. }, Node::Leaf { entries: b, .. }) => (a, b),
                _ => return err_at!(Invariant, msg: "leaf merge against non-leaf sibling"),
            };
            let mut combined: Vec<LeafEntry<V>> = a_entries
                .into_iter()
                .chain(b_entries)
                .filter(|e| e.lifespan.contains(v))
                .collect();
            combined.sort_by(|a, b| a.data.key().cmp(&b.data.key()));

            if combined.len() > self.thresholds.strong_ceiling {
                self.stats.n_key_splits += 1;
                let mid = combined.len() / 2;
                let (lo, hi) = combined.split_at(mid);
                let left_id = self.store_new(&Node::Leaf { left_link: None, right_link: None, entries: lo.to_vec() })?;
                let right_id = self.store_new(&Node::Leaf { left_link: None, right_link: None, entries: hi.to_vec() })?;
                vec![leaf_index_entry(left_id, v, lo), leaf_index_entry(right_id, v, hi)]
            } else {
                let id = self.store_new(&Node::Leaf { left_link: None, right_link: None, entries: combined.clone() })?;
                vec![leaf_index_entry(id, v, &combined)]
            }
        } else {
            let (a, b) = (self.fetch(new_entry.child_id)?, self.fetch(sib_entry.child_id)?);
            let (a_entries, b_entries) = match (a, b) {
                (Node::Index { entries: a, .. }, Node::Index { entries: b, .. }) => (a, b),
                _ => return err_at!(Invariant, msg: "index merge against non-index sibling"),
            };
            let mut combined: Vec<IndexEntry<K>> = a_entries
                .into_iter()
                .chain(b_entries)
                .filter(|e| e.mv_separator.lifespan.contains(v))
                .collect();
            combined.sort_by(|a, b| a.mv_separator.key.cmp(&b.mv_separator.key));

            if combined.len() > self.thresholds.strong_ceiling {
                self.stats.n_key_splits += 1;
                let mid = combined.len() / 2;
                let (lo, hi) = combined.split_at(mid);
                let left_id =
                    self.store_new(&Node::Index { level: level - 1, left_link: None, right_link: None, entries: lo.to_vec() })?;
                let right_id =
                    self.store_new(&Node::Index { level: level - 1, left_link: None, right_link: None, entries: hi.to_vec() })?;
                vec![index_index_entry(left_id, v, lo), index_index_entry(right_id, v, hi)]
            } else {
                let id =
                    self.store_new(&Node::Index { level: level - 1, left_link: None, right_link: None, entries: combined.clone() })?;
                vec![index_index_entry(id, v, &combined)]
            }
        };

        if entries[sib_idx].mv_separator.lifespan.is_open() && entries[sib_idx].mv_separator.lifespan.begin < v {
            entries[sib_idx].mv_separator.lifespan = entries[sib_idx].mv_separator.lifespan.close(v);
        }

        Ok(Some(merged))
    }

    /// Apply the top-level outcome of descending from the current root:
    /// either nothing changed structurally, or the root itself must be
    /// replaced (possibly by a taller tree, §4.5.3 step 4).
    fn apply_root_outcome(&mut self, outcome: Outcome<IndexEntry<K>>, v: Version) -> Result<()> {
        match outcome {
            Outcome::InPlace => Ok(()),
            Outcome::Replace(new_entries) => {
                if new_entries.len() == 1 {
                    self.roots.install_new_root(v, new_entries.into_iter().next().unwrap())
                } else {
                    // root grows a level: wrap the replacement entries in a
                    // fresh index node one level above its (former) children.
                    let child_level = self.fetch(new_entries[0].child_id)?.level();
                    let node = Node::Index {
                        level: child_level + 1,
                        left_link: None,
                        right_link: None,
                        entries: new_entries.clone(),
                    };
                    let weight_alive: u32 = new_entries.iter().map(|e| e.weight_alive).sum();
                    let weight_total: u32 = new_entries.iter().map(|e| e.weight_total).sum();
                    let max_key = new_entries.iter().map(|e| e.mv_separator.key).max().unwrap();
                    let id = self.store_new(&node)?;
                    self.roots.install_new_root(
                        v,
                        IndexEntry {
                            child_id: id,
                            mv_separator: MvSeparator { lifespan: Lifespan::from(v), key: max_key },
                            weight_alive,
                            weight_total,
                        },
                    )
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // Version split / key split / merge (§4.5.3, §3 strong version cond.)
    // ---------------------------------------------------------------

    fn leaf_version_split(
        &mut self,
        old_id: BlockId,
        v: Version,
        left_link: Option<IndexEntry<K>>,
        right_link: Option<IndexEntry<K>>,
        entries: Vec<LeafEntry<V>>,
    ) -> Result<Outcome<IndexEntry<K>>> {
        self.stats.n_version_splits += 1;

        let live: Vec<LeafEntry<V>> = entries
            .iter()
            .filter(|e| e.lifespan.contains(v))
            .map(|e| LeafEntry { data: e.data.clone(), lifespan: e.lifespan, is_alive: e.is_alive })
            .collect();
        let closed: Vec<LeafEntry<V>> =
            entries
                .into_iter()
                .map(|mut e| {
                    // an entry whose lifespan begins at this exact split has no history
                    // before it; leave it open rather than closing an empty interval.
                    if e.lifespan.is_open() && e.lifespan.begin < v {
                        e.lifespan = e.lifespan.close(v);
                    }
                    e
                })
                .collect();

        self.store_at(old_id, &Node::Leaf { left_link: left_link.clone(), right_link: right_link.clone(), entries: closed })?;

        let k = live.len();
        if k > self.thresholds.strong_ceiling {
            self.stats.n_key_splits += 1;
            let mut sorted = live;
            sorted.sort_by(|a, b| a.data.key().cmp(&b.data.key()));
            let mid = sorted.len() / 2;
            let (lo, hi) = sorted.split_at(mid);

            let left_id = self.store_new(&Node::Leaf { left_link: None, right_link: None, entries: lo.to_vec() })?;
            let right_id = self.store_new(&Node::Leaf { left_link: None, right_link: None, entries: hi.to_vec() })?;

            Ok(Outcome::Replace(vec![
                leaf_index_entry(left_id, v, lo),
                leaf_index_entry(right_id, v, hi),
            ]))
        } else {
            let new_id = self.store_new(&Node::Leaf { left_link: None, right_link: None, entries: live.clone() })?;
            Ok(Outcome::Replace(vec![leaf_index_entry(new_id, v, &live)]))
        }
    }

    fn index_version_split(
        &mut self,
        old_id: BlockId,
        level: u16,
        v: Version,
        left_link: Option<IndexEntry<K>>,
        right_link: Option<IndexEntry<K>>,
        entries: Vec<IndexEntry<K>>,
    ) -> Result<Outcome<IndexEntry<K>>> {
        self.stats.n_version_splits += 1;

        // entries may already carry closed historical children (from
        // earlier splits this level lived through); only the ones still
        // open at v belong in the replacement node, exactly as
        // leaf_version_split separates live from closed.
        let live: Vec<IndexEntry<K>> =
            entries.iter().filter(|e| e.mv_separator.lifespan.contains(v)).cloned().collect();

        self.store_at(old_id, &Node::Index { level, left_link: left_link.clone(), right_link: right_link.clone(), entries })?;

        let k = live.len();
        if k > self.thresholds.strong_ceiling {
            self.stats.n_key_splits += 1;
            let mut sorted = live;
            sorted.sort_by(|a, b| a.mv_separator.key.cmp(&b.mv_separator.key));
            let mid = sorted.len() / 2;
            let (lo, hi) = sorted.split_at(mid);

            let left_id = self.store_new(&Node::Index { level, left_link: None, right_link: None, entries: lo.to_vec() })?;
            let right_id = self.store_new(&Node::Index { level, left_link: None, right_link: None, entries: hi.to_vec() })?;

            Ok(Outcome::Replace(vec![index_index_entry(left_id, v, lo), index_index_entry(right_id, v, hi)]))
        } else {
            let new_id = self.store_new(&Node::Index { level, left_link: None, right_link: None, entries: live.clone() })?;
            Ok(Outcome::Replace(vec![index_index_entry(new_id, v, &live)]))
        }
    }

    // ---------------------------------------------------------------
    // Bulk-load support (used by bulkload.rs to install a built root)
    // ---------------------------------------------------------------

    pub(crate) fn install_bulk_root(&mut self, v: Version, root: IndexEntry<K>, key_range: KeyRange<K>) -> Result<()> {
        self.roots.install_new_root(v, root)?;
        self.v_current = v;
        self.key_range = Some(key_range);
        Ok(())
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut BufferedContainer<ConverterContainer<C, K, V>> {
        &mut self.buffer
    }

    pub(crate) fn store_leaf(&mut self, entries: Vec<LeafEntry<V>>) -> Result<BlockId> {
        self.store_new(&Node::Leaf { left_link: None, right_link: None, entries })
    }

    pub(crate) fn store_index(&mut self, level: u16, entries: Vec<IndexEntry<K>>) -> Result<BlockId> {
        self.store_new(&Node::Index { level, left_link: None, right_link: None, entries })
    }

    pub(crate) fn thresholds(&self) -> Thresholds {
        self.thresholds
    }
}

fn leaf_index_entry<K: Copy + Ord, V: Keyed<K>>(id: BlockId, v: Version, entries: &[LeafEntry<V>]) -> IndexEntry<K> {
    let max_key = entries.iter().map(|e| e.data.key()).max().unwrap();
    let weight_alive = entries.iter().filter(|e| e.lifespan.contains(v)).count() as u32;
    IndexEntry {
        child_id: id,
        mv_separator: MvSeparator { lifespan: Lifespan::from(v), key: max_key },
        weight_alive,
        weight_total: entries.len() as u32,
    }
}

fn index_index_entry<K: Copy + Ord>(id: BlockId, v: Version, entries: &[IndexEntry<K>]) -> IndexEntry<K> {
    let max_key = entries.iter().map(|e| e.mv_separator.key).max().unwrap();
    let weight_alive = entries.iter().map(|e| e.weight_alive).sum();
    let weight_total = entries.iter().map(|e| e.weight_total).sum();
    IndexEntry {
        child_id: id,
        mv_separator: MvSeparator { lifespan: Lifespan::from(v), key: max_key },
        weight_alive,
        weight_total,
    }
}

/// Capacity `B`, the number of entries a node of `block_size` bytes holds,
/// derived from a conservative fixed per-entry size estimate (§4.3). Real
/// deployments with variable-length keys/values should compute this from
/// their own serializer's worst-case entry size; this crate's example
/// `Record`/`u64` types use a generous fixed estimate.
pub(crate) fn node_capacity(block_size: usize) -> usize {
    const HEADER: usize = 4 + 2 * 62; // level+count, two link entries (generous)
    const ENTRY_ESTIMATE: usize = 48;
    ((block_size.saturating_sub(HEADER)) / ENTRY_ESTIMATE).max(4)
}

/// Selects the live child whose `MvSeparator` contains `(key, v)`. For a
/// write descent with no exact match, falls back to the rightmost live
/// child (left-biased ties are already satisfied by scanning left-to-right
/// for the first match, §4.5.5).
fn select_child<K: Copy + Ord>(entries: &[IndexEntry<K>], key: K, v: Version, for_write: bool) -> Option<usize> {
    for (i, e) in entries.iter().enumerate() {
        if e.mv_separator.lifespan.contains(v) && key <= e.mv_separator.key {
            return Some(i);
        }
    }
    if for_write {
        entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.mv_separator.lifespan.contains(v))
            .max_by_key(|(_, e)| e.mv_separator.key)
            .map(|(i, _)| i)
    } else {
        None
    }
}

#[cfg(test)]
#[path = "mvbt_test.rs"]
mod mvbt_test;
