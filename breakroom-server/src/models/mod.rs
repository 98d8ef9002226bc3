//! Domain models with validation at construction
//!
//! Request input is checked when these types are built.
//! Invalid input returns ValidationError, not panic.

pub mod gallery;
pub mod nullable;
pub mod pagination;
pub mod song;
pub mod test_run;
pub mod validation;

pub use gallery::{ArtworkImage, GalleryUrl};
pub use pagination::{PageInfo, Pagination, PaginationParams};
pub use song::{resolve_role, CollaboratorRole, SongRole, Visibility};
pub use test_run::{Platform, Tally};
pub use validation::{blank_to_none, require_text, ValidationError};
