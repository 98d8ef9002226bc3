//! Saved-position cache keyed by (block id, column count)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::geometry::{BlockId, GridRect};

/// Positions the user saved, one independent entry per column count
///
/// Serializes as `{ "<blockId>": { "<colCount>": { x, y, w, h } } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SavedPositions(BTreeMap<BlockId, BTreeMap<u32, GridRect>>);

impl SavedPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: BlockId, columns: u32) -> Option<GridRect> {
        self.0.get(&id).and_then(|by_cols| by_cols.get(&columns)).copied()
    }

    /// Store a position, replacing any previous one for the same key.
    pub fn insert(&mut self, id: BlockId, columns: u32, rect: GridRect) {
        self.0.entry(id).or_default().insert(columns, rect);
    }

    /// Drop every saved position of a block.
    pub fn remove_block(&mut self, id: BlockId) -> bool {
        self.0.remove(&id).is_some()
    }

    /// Every block saved at `columns`, with its rectangle.
    pub fn at_columns(&self, columns: u32) -> impl Iterator<Item = (BlockId, GridRect)> + '_ {
        self.0
            .iter()
            .filter_map(move |(id, by_cols)| by_cols.get(&columns).map(|rect| (*id, *rect)))
    }

    /// Number of (block, column count) entries
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate all entries as `(block id, column count, rect)`.
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, u32, GridRect)> + '_ {
        self.0
            .iter()
            .flat_map(|(id, by_cols)| by_cols.iter().map(move |(cols, rect)| (*id, *cols, *rect)))
    }
}

impl FromIterator<(BlockId, u32, GridRect)> for SavedPositions {
    fn from_iter<T: IntoIterator<Item = (BlockId, u32, GridRect)>>(iter: T) -> Self {
        let mut positions = SavedPositions::default();
        for (id, cols, rect) in iter {
            positions.insert(id, cols, rect);
        }
        positions
    }
}
