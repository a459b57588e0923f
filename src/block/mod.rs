//! C1: fixed-size block store with `allocate`/`get`/`update`/`remove` and a
//! free list, realized either in-memory or file-backed (§4.1).

use std::collections::{HashMap, HashSet};

use crate::{Error, Result};

mod file;
pub use file::FileContainer;

/// Opaque identifier for a block, resolved by a [`Container`].
pub type BlockId = u64;

/// Contract implemented by every block-storage realization. `B_bytes` is
/// fixed for the lifetime of a container instance.
pub trait Container {
    /// Size, in bytes, of every block this container hands out.
    fn block_size(&self) -> usize;

    /// Allocate a previously-unused id, possibly reusing a freed one.
    fn allocate(&mut self) -> Result<BlockId>;

    /// Fetch the bytes for `id`. Fails with [`Error::NotFound`] if unknown.
    fn get(&mut self, id: BlockId) -> Result<Vec<u8>>;

    /// Overwrite the bytes for `id`. `bytes.len()` must equal `block_size()`.
    fn update(&mut self, id: BlockId, bytes: &[u8]) -> Result<()>;

    /// Mark `id` free for reuse. Subsequent `get(id)` fails with `NotFound`.
    fn remove(&mut self, id: BlockId) -> Result<()>;

    /// Make all buffered updates durable.
    fn flush(&mut self) -> Result<()>;

    /// Flush, then release any resources. Idempotent (§9).
    fn close(&mut self) -> Result<()>;
}

/// Volatile, in-memory realization of [`Container`]. Used in tests and as
/// bulk-load scratch space.
pub struct MemContainer {
    block_size: usize,
    blocks: HashMap<BlockId, Vec<u8>>,
    free: HashSet<BlockId>,
    next_id: BlockId,
    closed: bool,
}

impl MemContainer {
    pub fn new(block_size: usize) -> MemContainer {
        MemContainer {
            block_size,
            blocks: HashMap::new(),
            free: HashSet::new(),
            next_id: 0,
            closed: false,
        }
    }
}

impl Container for MemContainer {
    fn block_size(&self) -> usize {
        self.block_size
    }

    fn allocate(&mut self) -> Result<BlockId> {
        let id = match self.free.iter().next().copied() {
            Some(id) => {
                self.free.remove(&id);
                id
            }
            None => {
                let id = self.next_id;
                self.next_id += 1;
                id
            }
        };
        self.blocks.insert(id, vec![0; self.block_size]);
        Ok(id)
    }

    fn get(&mut self, id: BlockId) -> Result<Vec<u8>> {
        match self.blocks.get(&id) {
            Some(bytes) => Ok(bytes.clone()),
            None => err_at!(NotFound, msg: "block {} not found", id),
        }
    }

    fn update(&mut self, id: BlockId, bytes: &[u8]) -> Result<()> {
        if bytes.len() != self.block_size {
            return err_at!(
                Fatal, msg: "block size mismatch {} != {}", bytes.len(), self.block_size
            );
        }
        match self.blocks.get_mut(&id) {
            Some(slot) => {
                slot.copy_from_slice(bytes);
                Ok(())
            }
            None => err_at!(NotFound, msg: "block {} not found", id),
        }
    }

    fn remove(&mut self, id: BlockId) -> Result<()> {
        match self.blocks.remove(&id) {
            Some(_) => {
                self.free.insert(id);
                Ok(())
            }
            None => err_at!(NotFound, msg: "block {} not found", id),
        }
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.flush()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
