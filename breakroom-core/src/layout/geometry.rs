//! Grid geometry - rectangles in cell units

use serde::{Deserialize, Serialize, Serializer};

/// Stable block identifier (database primary key)
pub type BlockId = i64;

/// Axis-aligned rectangle on the dashboard grid, in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl GridRect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// First column to the right of the rectangle
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    /// First row below the rectangle
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// True when the two rectangles share at least one cell.
    pub fn overlaps(&self, other: &GridRect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// A block's default geometry, used when no position is saved for a column count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFootprint {
    pub id: BlockId,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BlockFootprint {
    pub fn new(id: BlockId, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { id, x, y, w, h }
    }

    pub fn rect(&self) -> GridRect {
        GridRect::new(self.x, self.y, self.w, self.h)
    }
}

/// One entry of a computed layout
///
/// Serializes as `{ "i": "<id>", "x", "y", "w", "h" }`, the item shape the
/// dashboard grid widget consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutItem {
    #[serde(rename = "i", serialize_with = "id_as_string")]
    pub id: BlockId,
    #[serde(flatten)]
    pub rect: GridRect,
}

impl LayoutItem {
    pub fn new(id: BlockId, rect: GridRect) -> Self {
        Self { id, rect }
    }
}

fn id_as_string<S: Serializer>(id: &BlockId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlap_detection() {
        let a = GridRect::new(0, 0, 2, 2);
        assert!(a.overlaps(&GridRect::new(1, 1, 2, 2)));
        // Touching edges do not overlap
        assert!(!a.overlaps(&GridRect::new(2, 0, 1, 1)));
        assert!(!a.overlaps(&GridRect::new(0, 2, 2, 1)));
        // Empty rectangles occupy no cells
        assert!(!a.overlaps(&GridRect::new(0, 0, 0, 3)));
    }

    #[test]
    fn layout_item_shape() {
        let item = LayoutItem::new(42, GridRect::new(1, 2, 3, 4));
        assert_eq!(
            serde_json::to_value(item).unwrap(),
            json!({ "i": "42", "x": 1, "y": 2, "w": 3, "h": 4 })
        );
    }
}
