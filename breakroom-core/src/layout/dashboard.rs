//! Dashboard - blocks plus their saved-position cache

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

use super::breakpoint::Breakpoint;
use super::geometry::{BlockFootprint, BlockId, GridRect, LayoutItem};
use super::packer::pack;
use super::positions::SavedPositions;

/// A block's position as submitted by the grid widget: `{ id, x, y, w, h }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub id: BlockId,
    #[serde(flatten)]
    pub rect: GridRect,
}

impl Placement {
    pub fn new(id: BlockId, rect: GridRect) -> Self {
        Self { id, rect }
    }
}

/// Check a set of placements about to be saved for `columns`.
///
/// # Rules
/// - `columns` is one of the breakpoint column counts
/// - every rectangle is at least 1x1 and ends at or before the last column
/// - each block appears once
/// - no two rectangles share a cell
pub fn validate_placements(columns: u32, placements: &[Placement]) -> Result<()> {
    Breakpoint::require_columns(columns)?;

    let mut seen = HashSet::with_capacity(placements.len());
    for placement in placements {
        if placement.rect.is_empty() {
            return Err(LayoutError::EmptyRect { id: placement.id });
        }
        if placement.rect.right() > columns {
            return Err(LayoutError::OutOfBounds {
                id: placement.id,
                columns,
            });
        }
        if !seen.insert(placement.id) {
            return Err(LayoutError::DuplicateBlock(placement.id));
        }
    }

    for (i, a) in placements.iter().enumerate() {
        if let Some(b) = placements[i + 1..].iter().find(|b| a.rect.overlaps(&b.rect)) {
            return Err(LayoutError::Overlap {
                first: a.id,
                second: b.id,
            });
        }
    }

    Ok(())
}

/// The full set of placements at `columns` once `placements` are saved:
/// the submitted ones first, then every saved position at that column
/// count whose block is not being re-saved.
pub fn merge_placements(
    saved: &SavedPositions,
    columns: u32,
    placements: &[Placement],
) -> Vec<Placement> {
    let resaved: HashSet<BlockId> = placements.iter().map(|p| p.id).collect();
    let mut merged = placements.to_vec();
    merged.extend(
        saved
            .at_columns(columns)
            .filter(|(id, _)| !resaved.contains(id))
            .map(|(id, rect)| Placement::new(id, rect)),
    );
    merged
}

/// In-memory dashboard: the user's blocks and every position they saved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub blocks: Vec<BlockFootprint>,
    #[serde(default)]
    pub positions: SavedPositions,
}

impl Dashboard {
    pub fn new(blocks: Vec<BlockFootprint>, positions: SavedPositions) -> Self {
        Self { blocks, positions }
    }

    /// Layout for an arbitrary positive column count.
    pub fn layout_for(&self, columns: u32) -> Result<Vec<LayoutItem>> {
        pack(&self.blocks, &self.positions, columns)
    }

    /// Layouts for every breakpoint, keyed by breakpoint name.
    pub fn responsive_layouts(&self) -> Result<BTreeMap<Breakpoint, Vec<LayoutItem>>> {
        Breakpoint::ALL
            .into_iter()
            .map(|bp| self.layout_for(bp.columns()).map(|items| (bp, items)))
            .collect()
    }

    /// Pack `columns` and keep the result: blocks without a position there
    /// get the one the packer gave them, so later blocks pack around them
    /// instead of moving them. Returns the newly cached placements.
    pub fn cache_layout(&mut self, columns: u32) -> Result<Vec<Placement>> {
        let items = self.layout_for(columns)?;
        let derived: Vec<Placement> = items
            .into_iter()
            .filter(|item| self.positions.get(item.id, columns).is_none())
            .map(|item| Placement::new(item.id, item.rect))
            .collect();

        for placement in &derived {
            self.positions.insert(placement.id, columns, placement.rect);
        }
        Ok(derived)
    }

    /// Validate and cache positions for one column count.
    ///
    /// The placements must fit alongside the positions already saved at
    /// `columns` for other blocks. Positions at other column counts are
    /// left alone.
    pub fn save(&mut self, columns: u32, placements: &[Placement]) -> Result<()> {
        validate_placements(columns, &merge_placements(&self.positions, columns, placements))?;

        if let Some(unknown) = placements
            .iter()
            .find(|p| !self.blocks.iter().any(|b| b.id == p.id))
        {
            return Err(LayoutError::UnknownBlock(unknown.id));
        }

        for placement in placements {
            self.positions.insert(placement.id, columns, placement.rect);
        }
        Ok(())
    }

    /// Remove a block and its cached positions. Returns false if absent.
    pub fn remove_block(&mut self, id: BlockId) -> bool {
        let before = self.blocks.len();
        self.blocks.retain(|b| b.id != id);
        self.positions.remove_block(id);
        self.blocks.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dashboard() -> Dashboard {
        Dashboard::new(
            vec![
                BlockFootprint::new(1, 0, 0, 2, 2),
                BlockFootprint::new(2, 2, 0, 3, 1),
            ],
            SavedPositions::new(),
        )
    }

    #[test]
    fn responsive_layouts_cover_every_breakpoint() {
        let layouts = dashboard().responsive_layouts().unwrap();
        assert_eq!(layouts.len(), 5);
        for (bp, items) in &layouts {
            assert_eq!(items.len(), 2);
            assert!(items.iter().all(|item| item.rect.w <= bp.columns()));
        }
    }

    #[test]
    fn responsive_layouts_keyed_by_name() {
        let value = serde_json::to_value(dashboard().responsive_layouts().unwrap()).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["lg", "md", "sm", "xs", "xxs"]);
    }

    #[test]
    fn save_then_layout_reuses_position() {
        let mut dash = dashboard();
        dash.save(3, &[Placement::new(2, GridRect::new(0, 0, 3, 1))]).unwrap();

        let items = dash.layout_for(3).unwrap();
        assert_eq!(items[0], LayoutItem::new(2, GridRect::new(0, 0, 3, 1)));
        // Block 1 is packed below the saved one
        assert_eq!(items[1], LayoutItem::new(1, GridRect::new(0, 1, 2, 2)));

        // Other column counts are untouched
        assert_eq!(dash.positions.get(2, 5), None);
    }

    #[test]
    fn save_checks_against_positions_saved_earlier() {
        let mut dash = dashboard();
        dash.save(3, &[Placement::new(1, GridRect::new(0, 0, 2, 2))]).unwrap();

        let err = dash
            .save(3, &[Placement::new(2, GridRect::new(1, 1, 2, 2))])
            .unwrap_err();
        assert_eq!(err, LayoutError::Overlap { first: 2, second: 1 });
        assert_eq!(dash.positions.get(2, 3), None);

        // Moving the earlier block out of the way in the same save is fine
        dash.save(
            3,
            &[
                Placement::new(1, GridRect::new(0, 3, 2, 2)),
                Placement::new(2, GridRect::new(1, 1, 2, 2)),
            ],
        )
        .unwrap();
        assert_eq!(dash.positions.get(1, 3), Some(GridRect::new(0, 3, 2, 2)));
    }

    #[test]
    fn resaving_a_block_replaces_its_own_position() {
        let mut dash = dashboard();
        dash.save(3, &[Placement::new(1, GridRect::new(0, 0, 2, 2))]).unwrap();
        dash.save(3, &[Placement::new(1, GridRect::new(1, 0, 2, 2))]).unwrap();
        assert_eq!(dash.positions.get(1, 3), Some(GridRect::new(1, 0, 2, 2)));
    }

    #[test]
    fn merge_skips_resaved_and_other_column_counts() {
        let mut saved = SavedPositions::new();
        saved.insert(1, 3, GridRect::new(0, 0, 1, 1));
        saved.insert(2, 3, GridRect::new(1, 0, 1, 1));
        saved.insert(2, 5, GridRect::new(4, 0, 1, 1));

        let merged = merge_placements(&saved, 3, &[Placement::new(1, GridRect::new(2, 0, 1, 1))]);
        assert_eq!(
            merged,
            vec![
                Placement::new(1, GridRect::new(2, 0, 1, 1)),
                Placement::new(2, GridRect::new(1, 0, 1, 1)),
            ]
        );
    }

    #[test]
    fn cached_blocks_stay_put_when_blocks_are_added() {
        let mut dash = Dashboard::new(vec![BlockFootprint::new(1, 0, 1, 2, 2)], SavedPositions::new());
        let derived = dash.cache_layout(3).unwrap();
        assert_eq!(derived, vec![Placement::new(1, GridRect::new(0, 0, 2, 2))]);

        dash.blocks.push(BlockFootprint::new(2, 0, 0, 2, 2));
        let items = dash.layout_for(3).unwrap();
        let first = items.iter().find(|item| item.id == 1).unwrap();
        assert_eq!(first.rect, GridRect::new(0, 0, 2, 2));
        let second = items.iter().find(|item| item.id == 2).unwrap();
        assert!(!second.rect.overlaps(&first.rect));

        // Only the new block is derived on the next pass
        assert_eq!(dash.cache_layout(3).unwrap().len(), 1);
        assert!(dash.cache_layout(3).unwrap().is_empty());
    }

    #[test]
    fn save_rejects_unknown_block() {
        let mut dash = dashboard();
        let err = dash
            .save(5, &[Placement::new(9, GridRect::new(0, 0, 1, 1))])
            .unwrap_err();
        assert_eq!(err, LayoutError::UnknownBlock(9));
        assert!(dash.positions.is_empty());
    }

    #[test]
    fn remove_block_clears_cache() {
        let mut dash = dashboard();
        dash.save(5, &[Placement::new(1, GridRect::new(0, 0, 2, 2))]).unwrap();
        assert!(dash.remove_block(1));
        assert!(dash.positions.is_empty());
        assert_eq!(dash.blocks.len(), 1);
        assert!(!dash.remove_block(1));
    }

    #[test]
    fn validate_rejects_non_breakpoint_columns() {
        let err = validate_placements(6, &[]).unwrap_err();
        assert_eq!(err, LayoutError::UnsupportedColumns(6));
    }

    #[test]
    fn validate_rejects_out_of_bounds() {
        let err = validate_placements(2, &[Placement::new(1, GridRect::new(1, 0, 2, 1))]).unwrap_err();
        assert_eq!(err, LayoutError::OutOfBounds { id: 1, columns: 2 });
    }

    #[test]
    fn validate_rejects_overlap_and_duplicates() {
        let overlapping = [
            Placement::new(1, GridRect::new(0, 0, 2, 2)),
            Placement::new(2, GridRect::new(1, 1, 2, 2)),
        ];
        assert_eq!(
            validate_placements(4, &overlapping).unwrap_err(),
            LayoutError::Overlap { first: 1, second: 2 }
        );

        let duplicated = [
            Placement::new(1, GridRect::new(0, 0, 1, 1)),
            Placement::new(1, GridRect::new(1, 0, 1, 1)),
        ];
        assert_eq!(
            validate_placements(4, &duplicated).unwrap_err(),
            LayoutError::DuplicateBlock(1)
        );
    }

    #[test]
    fn validate_rejects_empty_rect() {
        let err = validate_placements(3, &[Placement::new(4, GridRect::new(0, 0, 0, 1))]).unwrap_err();
        assert_eq!(err, LayoutError::EmptyRect { id: 4 });
    }

    #[test]
    fn placement_deserializes_flat() {
        let placement: Placement =
            serde_json::from_value(json!({ "id": 3, "x": 1, "y": 0, "w": 2, "h": 2 })).unwrap();
        assert_eq!(placement, Placement::new(3, GridRect::new(1, 0, 2, 2)));
    }
}
