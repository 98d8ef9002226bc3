use breakroom_core::{
    pack, BlockFootprint, Breakpoint, Dashboard, GridRect, LayoutItem, Placement, SavedPositions,
};
use proptest::prelude::*;
use std::collections::HashSet;

// Blocks with arbitrary default geometry, including zero and oversized widths
fn arb_blocks() -> impl Strategy<Value = Vec<BlockFootprint>> {
    prop::collection::vec((0u32..12, 0u32..12, 0u32..8, 0u32..6), 0..30).prop_map(|dims| {
        dims.into_iter()
            .enumerate()
            .map(|(i, (x, y, w, h))| BlockFootprint::new(i as i64 + 1, x, y, w, h))
            .collect()
    })
}

fn arb_columns() -> impl Strategy<Value = u32> {
    prop::sample::select(Breakpoint::ALL.iter().map(|bp| bp.columns()).collect::<Vec<_>>())
}

/// Saved positions for a subset of blocks, stacked so they never overlap
fn saved_for(
    blocks: &[BlockFootprint],
    columns: u32,
    picks: &[(bool, u32, u32, u32)],
) -> SavedPositions {
    let mut positions = SavedPositions::new();
    let mut row = 0;
    for (block, &(keep, x, w, h)) in blocks.iter().zip(picks.iter().cycle()) {
        if !keep {
            continue;
        }
        let x = x % columns;
        let w = 1 + w % (columns - x);
        let h = 1 + h % 4;
        positions.insert(block.id, columns, GridRect::new(x, row, w, h));
        row += h;
    }
    positions
}

fn arb_picks() -> impl Strategy<Value = Vec<(bool, u32, u32, u32)>> {
    prop::collection::vec((any::<bool>(), 0u32..5, 0u32..5, 0u32..4), 1..30)
}

fn assert_disjoint(items: &[LayoutItem]) -> Result<(), TestCaseError> {
    for (i, a) in items.iter().enumerate() {
        for b in &items[i + 1..] {
            prop_assert!(
                !a.rect.overlaps(&b.rect),
                "{:?} overlaps {:?}",
                a,
                b
            );
        }
    }
    Ok(())
}

/// One save request: `(block slot, x, y, w, h)` per placement, folded into
/// the grid so most rectangles fit
type SaveRequest = Vec<(usize, u32, u32, u32, u32)>;

fn arb_saves() -> impl Strategy<Value = Vec<(SaveRequest, bool)>> {
    prop::collection::vec(
        (
            prop::collection::vec((0usize..8, 0u32..5, 0u32..6, 0u32..5, 0u32..3), 0..5),
            any::<bool>(),
        ),
        1..12,
    )
}

fn placements_for(blocks: &[BlockFootprint], columns: u32, request: &SaveRequest) -> Vec<Placement> {
    request
        .iter()
        .filter_map(|&(slot, x, y, w, h)| {
            let block = blocks.get(slot % blocks.len().max(1))?;
            let x = x % columns;
            let w = 1 + w % (columns - x);
            Some(Placement::new(block.id, GridRect::new(x, y, w, 1 + h)))
        })
        .collect()
}

proptest! {
    /// Property: one output entry per input block
    #[test]
    fn prop_one_entry_per_block(
        blocks in arb_blocks(),
        columns in arb_columns(),
        picks in arb_picks(),
    ) {
        let saved = saved_for(&blocks, columns, &picks);
        let items = pack(&blocks, &saved, columns).unwrap();

        prop_assert_eq!(items.len(), blocks.len());
        let ids: HashSet<i64> = items.iter().map(|item| item.id).collect();
        let expected: HashSet<i64> = blocks.iter().map(|b| b.id).collect();
        prop_assert_eq!(ids, expected);
    }

    /// Property: no two rectangles share a cell
    #[test]
    fn prop_no_overlap(
        blocks in arb_blocks(),
        columns in arb_columns(),
        picks in arb_picks(),
    ) {
        let saved = saved_for(&blocks, columns, &picks);
        let items = pack(&blocks, &saved, columns).unwrap();
        assert_disjoint(&items)?;
    }

    /// Property: saved positions come back exactly as stored
    #[test]
    fn prop_saved_positions_retained(
        blocks in arb_blocks(),
        columns in arb_columns(),
        picks in arb_picks(),
    ) {
        let saved = saved_for(&blocks, columns, &picks);
        let items = pack(&blocks, &saved, columns).unwrap();

        for item in &items {
            if let Some(rect) = saved.get(item.id, columns) {
                prop_assert_eq!(item.rect, rect);
            }
        }
    }

    /// Property: same cache and input order give the same layout
    #[test]
    fn prop_deterministic(
        blocks in arb_blocks(),
        columns in arb_columns(),
        picks in arb_picks(),
    ) {
        let saved = saved_for(&blocks, columns, &picks);
        let first = pack(&blocks, &saved, columns).unwrap();
        let second = pack(&blocks, &saved, columns).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: packed blocks fit the grid at every breakpoint
    #[test]
    fn prop_packed_width_within_columns(blocks in arb_blocks()) {
        for bp in Breakpoint::ALL {
            let columns = bp.columns();
            let items = pack(&blocks, &SavedPositions::new(), columns).unwrap();
            for item in &items {
                prop_assert!(item.rect.w >= 1 && item.rect.w <= columns);
                prop_assert!(item.rect.right() <= columns);
            }
        }
    }

    /// Property: whatever sequence of saves succeeds, the layout at that
    /// column count stays free of overlaps
    #[test]
    fn prop_successive_saves_never_overlap(
        blocks in arb_blocks(),
        columns in arb_columns(),
        saves in arb_saves(),
    ) {
        let mut dash = Dashboard::new(blocks.clone(), SavedPositions::new());
        for (request, cache_first) in &saves {
            if *cache_first {
                dash.cache_layout(columns).unwrap();
            }
            let placements = placements_for(&blocks, columns, request);
            let _ = dash.save(columns, &placements);

            let items = dash.layout_for(columns).unwrap();
            prop_assert_eq!(items.len(), blocks.len());
            assert_disjoint(&items)?;
        }
    }

    /// Property: a cached layout is the layout, and stays so on re-packing
    #[test]
    fn prop_cached_layout_is_stable(
        blocks in arb_blocks(),
        columns in arb_columns(),
        picks in arb_picks(),
    ) {
        let saved = saved_for(&blocks, columns, &picks);
        let mut dash = Dashboard::new(blocks.clone(), saved);
        let before = dash.layout_for(columns).unwrap();
        dash.cache_layout(columns).unwrap();

        prop_assert_eq!(dash.positions.at_columns(columns).count(), blocks.len());
        for item in &before {
            prop_assert_eq!(dash.positions.get(item.id, columns), Some(item.rect));
        }
        prop_assert!(dash.cache_layout(columns).unwrap().is_empty());
    }

    /// Property: saved positions at one column count never leak into another
    #[test]
    fn prop_column_counts_independent(
        blocks in arb_blocks(),
        picks in arb_picks(),
    ) {
        let saved = saved_for(&blocks, 5, &picks);
        let with_cache = pack(&blocks, &saved, 3).unwrap();
        let without = pack(&blocks, &SavedPositions::new(), 3).unwrap();
        prop_assert_eq!(with_cache, without);
    }
}

#[test]
fn single_column_stacks_in_visual_order() {
    let blocks = vec![
        BlockFootprint::new(1, 3, 2, 2, 1),
        BlockFootprint::new(2, 0, 0, 5, 2),
        BlockFootprint::new(3, 0, 2, 1, 3),
    ];
    let items = pack(&blocks, &SavedPositions::new(), 1).unwrap();

    let layout: Vec<(i64, GridRect)> = items.iter().map(|item| (item.id, item.rect)).collect();
    assert_eq!(
        layout,
        vec![
            (2, GridRect::new(0, 0, 1, 2)),
            (3, GridRect::new(0, 2, 1, 3)),
            (1, GridRect::new(0, 5, 1, 1)),
        ]
    );
}
