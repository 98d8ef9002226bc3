//! Structured error types for breakroom-core.
//!
//! The server maps these onto 400 responses; the CLI wraps them in `anyhow`.

use thiserror::Error;

use crate::layout::BlockId;

/// Errors raised while packing or validating a dashboard layout
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Column count is zero (packing) or not one of the fixed breakpoints (saving)
    #[error("unsupported column count: {0}")]
    UnsupportedColumns(u32),

    /// Breakpoint name not recognised
    #[error("unknown breakpoint '{0}'")]
    UnknownBreakpoint(String),

    /// Rectangle has a zero width or height
    #[error("block {id} must be at least one cell wide and tall")]
    EmptyRect { id: BlockId },

    /// Rectangle extends past the right edge of the grid
    #[error("block {id} does not fit in {columns} columns")]
    OutOfBounds { id: BlockId, columns: u32 },

    /// Two rectangles share at least one grid cell
    #[error("blocks {first} and {second} overlap")]
    Overlap { first: BlockId, second: BlockId },

    /// Same block listed twice in one placement set
    #[error("block {0} listed more than once")]
    DuplicateBlock(BlockId),

    /// Placement refers to a block the dashboard does not contain
    #[error("unknown block {0}")]
    UnknownBlock(BlockId),
}

/// Result type alias for breakroom-core operations
pub type Result<T> = std::result::Result<T, LayoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = LayoutError::OutOfBounds { id: 7, columns: 3 };
        assert_eq!(err.to_string(), "block 7 does not fit in 3 columns");

        let err = LayoutError::Overlap { first: 1, second: 2 };
        assert_eq!(err.to_string(), "blocks 1 and 2 overlap");
    }
}
