//! Repository implementations for database access
//!
//! Each repository borrows the pool and follows these patterns:
//! - JOINs for list operations (no N+1)
//! - `RETURNING` for the created or updated row
//! - Transactions for multi-step writes

pub mod blog;
pub mod breakroom;
pub mod gallery;
pub mod lyrics;
pub mod shortcuts;
pub mod songs;
pub mod test_results;
pub mod users;

pub use blog::{BlogOwner, BlogPost, BlogRepo, PostWithAuthor};
pub use breakroom::{Block, BlockPatch, BreakroomRepo, NewBlock};
pub use gallery::{Artwork, GalleryRepo, GallerySettings, PublicArtwork, PublicArtworkRow, PublicGalleryRow};
pub use lyrics::{Lyric, LyricInput, LyricOrder, LyricRepo, LyricWithAuthor};
pub use shortcuts::{Shortcut, ShortcutRef, ShortcutRepo};
pub use songs::{Collaborator, NewSong, Song, SongDetail, SongRepo, SongSummary};
pub use test_results::{
    BulkSuite, NewCase, NewRun, RunFilter, SuiteWithCases, TestCase, TestResultRepo, TestRun,
    TestSuite,
};
pub use users::{User, UserRepo};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// A uniqueness rule rejected the write; the message is user-facing
    #[error("conflict: {0}")]
    Conflict(&'static str),

    /// Positions rejected against what is already stored
    #[error(transparent)]
    Layout(#[from] breakroom_core::LayoutError),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(e)) => e.is_foreign_key_violation(),
            _ => false,
        }
    }

    /// Replace a unique violation with a user-facing conflict.
    pub(crate) fn on_unique(self, message: &'static str) -> Self {
        if self.is_unique_violation() {
            Self::Conflict(message)
        } else {
            self
        }
    }

    /// Replace a foreign-key violation with a missing parent.
    pub(crate) fn on_foreign_key(self, resource: &'static str, id: impl ToString) -> Self {
        if self.is_foreign_key_violation() {
            Self::not_found(resource, id)
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_violations() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(!err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
        assert!(matches!(err.on_unique("taken"), DbError::Sqlx(_)));
    }

    #[test]
    fn not_found_display() {
        assert_eq!(
            DbError::not_found("song", 4).to_string(),
            "not found: song '4'"
        );
    }
}
