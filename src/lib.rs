//! `mvbt` is a multi-version B+-tree: a partially-persistent, block-oriented
//! index that keeps the full version history of a key→value mapping while
//! keeping point, range, and time-travel queries logarithmic in the number
//! of currently-live entries.
//!
//! Every mutating call is tagged with a caller-supplied [`types::Version`],
//! non-decreasing across successive calls on the same tree. Queries can
//! name any version up to the tree's current one and see exactly the state
//! that was live at that point in history — no separate snapshot or
//! checkpoint mechanism is needed.
//!
//! Layout, leaves-first: [`block`] is the fixed-size block store; [`codec`]
//! and [`node`] turn typed nodes into block-sized byte buffers; [`converter`]
//! wraps a block container with one node serializer; [`buffer`] adds an LRU
//! of pinned/unpinned pages in front of that; [`roots`] tracks which root
//! was live during which version interval;
//! [`mvbt`] is the tree itself; [`bulkload`] loads a large batch without a
//! descent per record; [`metadata`] persists a tree's identity between
//! process runs.

#[macro_use]
mod error;

#[macro_use]
pub mod util;

pub mod block;
pub mod buffer;
pub mod bulkload;
pub mod codec;
pub mod converter;
pub mod iter;
pub mod metadata;
pub mod mvbt;
pub mod node;
pub mod roots;
pub mod types;

pub use crate::error::{Error, Result};
