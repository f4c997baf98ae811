// src/registry/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Block name → tracked pids, in launch order.
///
/// Serialized as a plain JSON object (`{"dev": [4242, 4243]}`). Keys are kept
/// sorted so the file diffs cleanly. A block never maps to an empty list:
/// inserting an empty list removes the key instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    blocks: BTreeMap<String, Vec<u32>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, block: &str) -> Option<&[u32]> {
        self.blocks.get(block).map(Vec::as_slice)
    }

    pub fn contains(&self, block: &str) -> bool {
        self.blocks.contains_key(block)
    }

    /// Record the pids for a block, replacing any previous entry.
    ///
    /// Returns `false` (and leaves the block absent) when `pids` is empty.
    pub fn insert(&mut self, block: impl Into<String>, pids: Vec<u32>) -> bool {
        let block = block.into();
        if pids.is_empty() {
            self.blocks.remove(&block);
            return false;
        }
        self.blocks.insert(block, pids);
        true
    }

    pub fn remove(&mut self, block: &str) -> Option<Vec<u32>> {
        self.blocks.remove(block)
    }

    /// Block names in registry (sorted) order.
    pub fn names(&self) -> Vec<String> {
        self.blocks.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.blocks
            .iter()
            .map(|(name, pids)| (name.as_str(), pids.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drop keys whose pid list is empty (only reachable via hand-edited files).
    pub(crate) fn drop_empty(&mut self) -> usize {
        let before = self.blocks.len();
        self.blocks.retain(|_, pids| !pids.is_empty());
        before - self.blocks.len()
    }
}
