//! Responsive dashboard layout
//!
//! A dashboard is a list of blocks with default geometry plus a cache of
//! positions the user saved at each column count. Layouts for a column
//! count reuse the saved positions verbatim and pack everything else
//! underneath with [`pack`].

pub mod breakpoint;
pub mod dashboard;
pub mod geometry;
pub mod packer;
pub mod positions;

pub use breakpoint::Breakpoint;
pub use dashboard::{merge_placements, validate_placements, Dashboard, Placement};
pub use geometry::{BlockFootprint, BlockId, GridRect, LayoutItem};
pub use packer::pack;
pub use positions::SavedPositions;
