//! C8: serialize/restore tree identity (§4.7, §6's metadata schema).
//!
//! The wire format is plain `serde_json`, matching this codebase's existing
//! preference for `serde`-based text formats over a hand-rolled parser
//! wherever the payload is not the fixed-width binary layout §6 mandates
//! for blocks. Any enumerated property absent on load is a
//! [`Error::CorruptMetadata`], never a silently-defaulted gap.

use serde::{Deserialize, Serialize};

use crate::{
    node::IndexEntry,
    roots::{RootEntry, RootsTree},
    types::{KeyRange, Lifespan, Version},
    util, Error, Result,
};

/// One recognized top-level property, per §6's metadata schema. Per-column
/// property lists are out of scope for this core (§1) and are passed
/// through opaquely rather than interpreted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Metadata<K> {
    pub index_type: String,
    pub table_name: String,
    pub content_type: String,
    pub block_size: usize,
    pub key_indices: Vec<usize>,
    pub table_columns: Vec<String>,
    #[serde(default)]
    pub column_properties: Vec<serde_json::Value>,

    pub v_current: Version,
    pub key_range: Option<(K, K)>,
    pub roots: Vec<WireRootEntry<K>>,
}

/// On-the-wire shape of a [`RootEntry`]; `serde` cannot derive through the
/// hand-rolled `Codec` trait `IndexEntry` otherwise needs for its binary
/// layout, so the metadata file gets its own plain-field mirror.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireRootEntry<K> {
    pub begin: Version,
    pub end: Version,
    pub child_id: u64,
    pub sep_begin: Version,
    pub sep_end: Version,
    pub sep_key: K,
    pub weight_alive: u32,
    pub weight_total: u32,
}

impl<K: Copy> From<&RootEntry<K>> for WireRootEntry<K> {
    fn from(e: &RootEntry<K>) -> WireRootEntry<K> {
        WireRootEntry {
            begin: e.lifespan.begin,
            end: e.lifespan.end,
            child_id: e.root.child_id,
            sep_begin: e.root.mv_separator.lifespan.begin,
            sep_end: e.root.mv_separator.lifespan.end,
            sep_key: e.root.mv_separator.key,
            weight_alive: e.root.weight_alive,
            weight_total: e.root.weight_total,
        }
    }
}

impl<K: Copy> From<&WireRootEntry<K>> for RootEntry<K> {
    fn from(w: &WireRootEntry<K>) -> RootEntry<K> {
        RootEntry {
            lifespan: Lifespan { begin: w.begin, end: w.end },
            root: IndexEntry {
                child_id: w.child_id,
                mv_separator: crate::types::MvSeparator {
                    lifespan: Lifespan { begin: w.sep_begin, end: w.sep_end },
                    key: w.sep_key,
                },
                weight_alive: w.weight_alive,
                weight_total: w.weight_total,
            },
        }
    }
}

impl<K: Copy> Metadata<K> {
    pub fn new(
        table_name: String,
        block_size: usize,
        v_current: Version,
        key_range: Option<KeyRange<K>>,
        roots: &RootsTree<K>,
    ) -> Metadata<K> {
        Metadata {
            index_type: "MVBT".to_string(),
            table_name,
            content_type: "primitive/record".to_string(),
            block_size,
            key_indices: vec![0],
            table_columns: vec!["key".to_string(), "value".to_string()],
            column_properties: vec![],
            v_current,
            key_range: key_range.map(|kr| (kr.min, kr.max)),
            roots: roots.entries().iter().map(WireRootEntry::from).collect(),
        }
    }

    pub fn roots_tree(&self) -> RootsTree<K> {
        RootsTree::from_entries(self.roots.iter().map(RootEntry::from).collect())
    }

    pub fn key_range(&self) -> Option<KeyRange<K>>
    where
        K: Ord,
    {
        self.key_range.map(|(min, max)| KeyRange::new(min, max))
    }
}

/// Persist `metadata` to `path`, replacing any existing file.
pub fn save<K>(path: &str, metadata: &Metadata<K>) -> Result<()>
where
    K: Copy + Serialize,
{
    let text = err_at!(FailConvert, serde_json::to_string_pretty(metadata))?;
    let mut file = err_at!(IoError, std::fs::File::create(path))?;
    util::sync_write(&mut file, text.as_bytes())?;
    log::debug!("wrote metadata to {}", path);
    Ok(())
}

/// Load and validate a previously-saved metadata file. Every property §6
/// enumerates must be present; this function does not fill in defaults.
pub fn load<K>(path: &str) -> Result<Metadata<K>>
where
    K: Copy + for<'de> Deserialize<'de>,
{
    let text = err_at!(IoError, std::fs::read_to_string(path))?;
    let value: serde_json::Value = err_at!(CorruptMetadata, serde_json::from_str(&text))?;

    for field in [
        "index_type",
        "table_name",
        "content_type",
        "block_size",
        "key_indices",
        "table_columns",
        "v_current",
        "roots",
    ] {
        if value.get(field).is_none() {
            return err_at!(CorruptMetadata, msg: "metadata missing required property {}", field);
        }
    }

    err_at!(CorruptMetadata, serde_json::from_value(value))
}

#[cfg(test)]
#[path = "metadata_test.rs"]
mod metadata_test;
