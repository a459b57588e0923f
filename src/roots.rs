//! C5: the roots tree, mapping disjoint version intervals to the MVBT root
//! that was live during that interval (§4.4).
//!
//! The roots tree is itself an ordinary (non-versioned) index; in this
//! implementation it is realized as a small ordered list of root entries
//! rather than a second full B+-tree, since new entries are appended only at
//! height changes and top-level version splits — see DESIGN.md for why this
//! simplification is a faithful realization of the §4.4 contract rather
//! than a shortcut around it.

use crate::{
    node::IndexEntry,
    types::{Lifespan, Version},
    Error, Result,
};

/// One historical (or current) root, tagged with the version interval it
/// was live for.
#[derive(Clone, Debug, PartialEq)]
pub struct RootEntry<K> {
    pub lifespan: Lifespan,
    pub root: IndexEntry<K>,
}

/// Ordered collection of [`RootEntry`] values; the entry with an open
/// lifespan, if any, names the current root.
#[derive(Clone, Debug, Default)]
pub struct RootsTree<K> {
    entries: Vec<RootEntry<K>>,
}

impl<K: Copy> RootsTree<K> {
    pub fn new() -> RootsTree<K> {
        RootsTree { entries: vec![] }
    }

    pub fn from_entries(entries: Vec<RootEntry<K>>) -> RootsTree<K> {
        RootsTree { entries }
    }

    pub fn entries(&self) -> &[RootEntry<K>] {
        &self.entries
    }

    /// The root whose lifespan contains `v`. `NotFound` if `v` precedes the
    /// tree's creation or exceeds its current version.
    pub fn locate_root(&self, v: Version) -> Result<&IndexEntry<K>> {
        match self.entries.iter().find(|e| e.lifespan.contains(v)) {
            Some(e) => Ok(&e.root),
            None => err_at!(NotFound, msg: "no root live at version {}", v),
        }
    }

    pub fn current_root(&self) -> Option<&IndexEntry<K>> {
        self.entries.last().filter(|e| e.lifespan.is_open()).map(|e| &e.root)
    }

    /// Close the current root's lifespan at `v_split` and install `new_root`
    /// as the new current root. A no-op on the previous root if there was
    /// none yet (first root of an empty tree).
    pub fn install_new_root(&mut self, v_split: Version, new_root: IndexEntry<K>) -> Result<()> {
        if let Some(last) = self.entries.last_mut() {
            if last.lifespan.is_open() {
                last.lifespan = last.lifespan.close(v_split);
            }
        }
        self.entries.push(RootEntry { lifespan: Lifespan::from(v_split), root: new_root });
        Ok(())
    }
}

#[cfg(test)]
#[path = "roots_test.rs"]
mod roots_test;
