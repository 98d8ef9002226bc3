//! breakroom-core: dashboard layout logic for Prosaurus Breakroom
//!
//! Pure, I/O-free types shared by the server and the CLI:
//! breakpoints, per-column-count saved positions, and the greedy
//! block-layout packer.

pub mod error;
pub mod layout;

pub use error::{LayoutError, Result};
pub use layout::{
    merge_placements, pack, validate_placements, BlockFootprint, BlockId, Breakpoint, Dashboard,
    GridRect, LayoutItem, Placement, SavedPositions,
};
