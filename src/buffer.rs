//! C3: an LRU-ordered buffer of pinned/unpinned pages wrapping a
//! [`Container`] (§4.2). Single-threaded: eviction and write-back happen
//! synchronously inside whichever call triggered them (§5), there is no
//! background writer.

use std::collections::HashMap;

use crate::{
    block::{BlockId, Container},
    Error, Result,
};

struct Page {
    bytes: Vec<u8>,
    dirty: bool,
    pins: usize,
    tick: u64,
}

/// Configuration for a [`BufferedContainer`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Maximum number of resident pages, `M` in §4.2.
    pub capacity: usize,
}

impl Config {
    pub fn new(capacity: usize) -> Config {
        Config { capacity }
    }
}

/// Running counters for a [`BufferedContainer`], returned by `to_stats()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    pub n_gets: u64,
    pub n_hits: u64,
    pub n_evictions: u64,
    pub n_writebacks: u64,
}

/// Wraps a [`Container`] with a bounded LRU of resident pages (§4.2).
pub struct BufferedContainer<C: Container> {
    inner: C,
    config: Config,
    pages: HashMap<BlockId, Page>,
    clock: u64,
    stats: Stats,
}

impl<C: Container> BufferedContainer<C> {
    pub fn new(inner: C, config: Config) -> BufferedContainer<C> {
        BufferedContainer { inner, config, pages: HashMap::new(), clock: 0, stats: Stats::default() }
    }

    pub fn to_stats(&self) -> Stats {
        self.stats
    }

    pub fn block_size(&self) -> usize {
        self.inner.block_size()
    }

    pub fn allocate(&mut self) -> Result<BlockId> {
        let id = self.inner.allocate()?;
        self.evict_if_needed()?;
        let bytes = vec![0; self.inner.block_size()];
        self.clock += 1;
        self.pages.insert(id, Page { bytes, dirty: false, pins: 1, tick: self.clock });
        Ok(id)
    }

    /// Fetch and pin a page, returning a clone of its bytes. Pair with
    /// [`Self::release`] on every exit path.
    pub fn get(&mut self, id: BlockId) -> Result<Vec<u8>> {
        self.stats.n_gets += 1;
        self.clock += 1;
        let tick = self.clock;

        if let Some(page) = self.pages.get_mut(&id) {
            self.stats.n_hits += 1;
            page.pins += 1;
            page.tick = tick;
            return Ok(page.bytes.clone());
        }

        self.evict_if_needed()?;
        let bytes = self.inner.get(id)?;
        self.pages.insert(id, Page { bytes: bytes.clone(), dirty: false, pins: 1, tick });
        Ok(bytes)
    }

    /// Overwrite a pinned page's bytes and mark it dirty.
    pub fn update(&mut self, id: BlockId, bytes: Vec<u8>) -> Result<()> {
        match self.pages.get_mut(&id) {
            Some(page) => {
                page.bytes = bytes;
                page.dirty = true;
                Ok(())
            }
            None => err_at!(NotFound, msg: "block {} not resident for update", id),
        }
    }

    /// Release one pin taken by [`Self::get`] or [`Self::allocate`].
    pub fn release(&mut self, id: BlockId) {
        if let Some(page) = self.pages.get_mut(&id) {
            debug_assert!(page.pins > 0, "unpinning a page with zero pins");
            page.pins = page.pins.saturating_sub(1);
        }
    }

    pub fn remove(&mut self, id: BlockId) -> Result<()> {
        self.pages.remove(&id);
        self.inner.remove(id)
    }

    /// Write back every dirty page without evicting it from the buffer.
    pub fn flush(&mut self) -> Result<()> {
        for (id, page) in self.pages.iter_mut() {
            if page.dirty {
                self.inner.update(*id, &page.bytes)?;
                page.dirty = false;
            }
        }
        self.inner.flush()
    }

    /// Flush, then drop every resident page. Idempotent via the underlying
    /// container's own idempotent close (§9).
    pub fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.pages.clear();
        self.inner.close()
    }

    fn evict_if_needed(&mut self) -> Result<()> {
        while self.pages.len() >= self.config.capacity {
            let victim = self
                .pages
                .iter()
                .filter(|(_, p)| p.pins == 0)
                .min_by_key(|(_, p)| p.tick)
                .map(|(id, _)| *id);

            match victim {
                Some(id) => {
                    let dirty = self.pages.get(&id).map(|p| p.dirty).unwrap_or(false);
                    if dirty {
                        let bytes = self.pages.get(&id).unwrap().bytes.clone();
                        self.inner.update(id, &bytes)?;
                        self.stats.n_writebacks += 1;
                    }
                    self.pages.remove(&id);
                    self.stats.n_evictions += 1;
                }
                // every resident page is pinned: the buffer is allowed to
                // grow past capacity for the duration of a single operation.
                None => break,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod buffer_test;
