//! C2: the converter container, wrapping a [`Container`] and attaching one
//! [`Codec`]-bound node serializer to it (§4.2). `ConverterContainer` is
//! generic over the node variety it serializes (MVBT nodes here; a
//! Roots-Tree-shaped container would instantiate its own wrapper with a
//! different `K`/`V` pair), per §4.2's "one wrapper per node variety" rule.
//!
//! At the `Container` trait boundary it is a thin pass-through to the
//! wrapped block store, since the fixed-width layout already lives on the
//! wire by the time bytes reach this layer; the typed [`Self::fetch`] and
//! [`Self::store`] methods are where the actual node/bytes conversion this
//! component is named for happens.

use crate::{
    block::{BlockId, Container},
    codec::{Codec, Keyed},
    node::Node,
    Result,
};

/// Wraps a block container `C`, converting [`Node`] values of a single
/// `(K, V)` variety to and from its fixed-size blocks.
pub struct ConverterContainer<C: Container, K, V> {
    inner: C,
    _marker: std::marker::PhantomData<(K, V)>,
}

impl<C: Container, K, V> ConverterContainer<C, K, V> {
    pub fn new(inner: C) -> ConverterContainer<C, K, V> {
        ConverterContainer { inner, _marker: std::marker::PhantomData }
    }
}

impl<C: Container, K, V> Container for ConverterContainer<C, K, V> {
    fn block_size(&self) -> usize {
        self.inner.block_size()
    }

    fn allocate(&mut self) -> Result<BlockId> {
        self.inner.allocate()
    }

    fn get(&mut self, id: BlockId) -> Result<Vec<u8>> {
        self.inner.get(id)
    }

    fn update(&mut self, id: BlockId, bytes: &[u8]) -> Result<()> {
        self.inner.update(id, bytes)
    }

    fn remove(&mut self, id: BlockId) -> Result<()> {
        self.inner.remove(id)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

impl<C, K, V> ConverterContainer<C, K, V>
where
    C: Container,
    K: Copy + Codec,
    V: Codec + Keyed<K>,
{
    /// Fetch and decode the node at `id`.
    pub fn fetch(&mut self, id: BlockId) -> Result<Node<K, V>> {
        let bytes = self.inner.get(id)?;
        Node::decode(&bytes)
    }

    /// Encode `node` and write it at `id`.
    pub fn store(&mut self, id: BlockId, node: &Node<K, V>) -> Result<()> {
        let bytes = node.encode(self.inner.block_size())?;
        self.inner.update(id, &bytes)
    }

    /// Allocate a fresh id and store `node` there.
    pub fn store_new(&mut self, node: &Node<K, V>) -> Result<BlockId> {
        let id = self.inner.allocate()?;
        self.store(id, node)?;
        Ok(id)
    }
}

#[cfg(test)]
#[path = "converter_test.rs"]
mod converter_test;
