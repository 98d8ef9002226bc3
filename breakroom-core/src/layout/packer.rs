//! Greedy column-filling packer
//!
//! Saved positions for the requested column count are emitted untouched.
//! The remaining blocks are placed one at a time at the start column that
//! lands them highest, with the skyline of every column tracked in a
//! height array seeded from the saved blocks.

use crate::error::{LayoutError, Result};

use super::geometry::{BlockFootprint, GridRect, LayoutItem};
use super::positions::SavedPositions;

/// Compute the layout of `blocks` on a grid `columns` wide.
///
/// Output contains one item per input block: saved items first (input
/// order), then packed items in `(y, x)` order of their default geometry.
///
/// Packed blocks are clamped to `1..=columns` wide and at least one row tall.
/// Saved positions are trusted; cells of a saved block that fall outside the
/// grid do not raise any column.
pub fn pack(
    blocks: &[BlockFootprint],
    saved: &SavedPositions,
    columns: u32,
) -> Result<Vec<LayoutItem>> {
    if columns == 0 {
        return Err(LayoutError::UnsupportedColumns(columns));
    }

    let mut items = Vec::with_capacity(blocks.len());
    let mut unsaved: Vec<&BlockFootprint> = Vec::new();

    for block in blocks {
        match saved.get(block.id, columns) {
            Some(rect) => items.push(LayoutItem::new(block.id, rect)),
            None => unsaved.push(block),
        }
    }

    if unsaved.is_empty() {
        return Ok(items);
    }

    let mut skyline = Skyline::new(columns);
    for item in &items {
        skyline.raise(&item.rect);
    }

    // Stable sort keeps input order among blocks sharing an origin
    unsaved.sort_by_key(|block| (block.y, block.x));

    for block in unsaved {
        let w = block.w.clamp(1, columns);
        let h = block.h.max(1);
        let (x, y) = skyline.lowest_fit(w);
        let rect = GridRect::new(x, y, w, h);
        skyline.raise(&rect);
        items.push(LayoutItem::new(block.id, rect));
    }

    tracing::trace!(columns, items = items.len(), "packed layout");
    Ok(items)
}

/// Per-column occupied height
struct Skyline {
    heights: Vec<u32>,
}

impl Skyline {
    fn new(columns: u32) -> Self {
        Self {
            heights: vec![0; columns as usize],
        }
    }

    fn columns(&self) -> u32 {
        self.heights.len() as u32
    }

    /// Raise every spanned column to at least the rectangle's bottom edge.
    fn raise(&mut self, rect: &GridRect) {
        let start = (rect.x as usize).min(self.heights.len());
        let end = (rect.right() as usize).min(self.heights.len());
        let bottom = rect.bottom();
        for height in &mut self.heights[start..end] {
            *height = (*height).max(bottom);
        }
    }

    /// Start column and landing row of the lowest placement for width `w`.
    ///
    /// `w` must be in `1..=columns`. Ties go to the leftmost column.
    fn lowest_fit(&self, w: u32) -> (u32, u32) {
        let mut best = (0, u32::MAX);
        for x in 0..=(self.columns() - w) {
            let start = x as usize;
            let landing = self.heights[start..start + w as usize]
                .iter()
                .copied()
                .max()
                .unwrap_or(0);
            if landing < best.1 {
                best = (x, landing);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rects(items: &[LayoutItem]) -> Vec<(i64, GridRect)> {
        items.iter().map(|item| (item.id, item.rect)).collect()
    }

    #[test]
    fn zero_columns_rejected() {
        let blocks = [BlockFootprint::new(1, 0, 0, 1, 1)];
        let err = pack(&blocks, &SavedPositions::new(), 0).unwrap_err();
        assert_eq!(err, LayoutError::UnsupportedColumns(0));
    }

    #[test]
    fn empty_input_yields_empty_layout() {
        assert!(pack(&[], &SavedPositions::new(), 5).unwrap().is_empty());
    }

    #[test]
    fn fills_row_before_stacking() {
        let blocks = [
            BlockFootprint::new(1, 0, 0, 2, 2),
            BlockFootprint::new(2, 2, 0, 2, 2),
            BlockFootprint::new(3, 4, 0, 2, 2),
        ];
        let items = pack(&blocks, &SavedPositions::new(), 5).unwrap();

        assert_eq!(
            rects(&items),
            vec![
                (1, GridRect::new(0, 0, 2, 2)),
                (2, GridRect::new(2, 0, 2, 2)),
                // Only one column left on the first row, so it stacks leftmost
                (3, GridRect::new(0, 2, 2, 2)),
            ]
        );
    }

    #[test]
    fn width_clamped_to_columns() {
        let blocks = [BlockFootprint::new(1, 0, 0, 4, 1), BlockFootprint::new(2, 0, 1, 3, 2)];
        let items = pack(&blocks, &SavedPositions::new(), 2).unwrap();

        assert_eq!(
            rects(&items),
            vec![(1, GridRect::new(0, 0, 2, 1)), (2, GridRect::new(0, 1, 2, 2))]
        );
    }

    #[test]
    fn saved_positions_kept_and_unsaved_pack_around_them() {
        let blocks = [
            BlockFootprint::new(1, 0, 0, 2, 2),
            BlockFootprint::new(2, 0, 0, 1, 1),
            BlockFootprint::new(3, 0, 0, 1, 1),
        ];
        let mut saved = SavedPositions::new();
        saved.insert(1, 3, GridRect::new(1, 0, 2, 3));

        let items = pack(&blocks, &saved, 3).unwrap();
        assert_eq!(
            rects(&items),
            vec![
                (1, GridRect::new(1, 0, 2, 3)),
                (2, GridRect::new(0, 0, 1, 1)),
                (3, GridRect::new(0, 1, 1, 1)),
            ]
        );
    }

    #[test]
    fn saved_position_for_other_column_count_ignored() {
        let blocks = [BlockFootprint::new(1, 3, 3, 1, 1)];
        let mut saved = SavedPositions::new();
        saved.insert(1, 5, GridRect::new(4, 9, 1, 1));

        let items = pack(&blocks, &saved, 4).unwrap();
        assert_eq!(rects(&items), vec![(1, GridRect::new(0, 0, 1, 1))]);
    }

    #[test]
    fn unsaved_sorted_by_row_then_column() {
        let blocks = [
            BlockFootprint::new(1, 1, 5, 1, 1),
            BlockFootprint::new(2, 0, 5, 1, 1),
            BlockFootprint::new(3, 4, 0, 1, 1),
        ];
        let items = pack(&blocks, &SavedPositions::new(), 1).unwrap();
        let order: Vec<i64> = items.iter().map(|item| item.id).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn ties_choose_leftmost_lowest() {
        // Columns 0 and 2 end at height 1, column 1 at height 3
        let blocks = [
            BlockFootprint::new(1, 0, 0, 1, 1),
            BlockFootprint::new(2, 0, 0, 1, 1),
            BlockFootprint::new(3, 0, 0, 1, 1),
            BlockFootprint::new(4, 0, 0, 1, 1),
        ];
        let mut saved = SavedPositions::new();
        saved.insert(1, 3, GridRect::new(0, 0, 1, 1));
        saved.insert(2, 3, GridRect::new(1, 0, 1, 3));
        saved.insert(4, 3, GridRect::new(2, 0, 1, 1));

        let items = pack(&blocks, &saved, 3).unwrap();
        assert_eq!(items[3].id, 3);
        assert_eq!(items[3].rect, GridRect::new(0, 1, 1, 1));
    }

    #[test]
    fn out_of_range_saved_columns_ignored() {
        let blocks = [BlockFootprint::new(1, 0, 0, 1, 1), BlockFootprint::new(2, 0, 0, 1, 1)];
        let mut saved = SavedPositions::new();
        saved.insert(1, 2, GridRect::new(1, 0, 4, 2));

        let items = pack(&blocks, &saved, 2).unwrap();
        assert_eq!(items[1].rect, GridRect::new(0, 0, 1, 1));
    }

    #[test]
    fn zero_sized_defaults_occupy_a_cell() {
        let blocks = [BlockFootprint::new(1, 0, 0, 0, 0), BlockFootprint::new(2, 0, 0, 1, 1)];
        let items = pack(&blocks, &SavedPositions::new(), 1).unwrap();
        assert_eq!(
            rects(&items),
            vec![(1, GridRect::new(0, 0, 1, 1)), (2, GridRect::new(0, 1, 1, 1))]
        );
    }
}
