//! Song repository - songs, collaborators, and access lookup

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;
use crate::models::{resolve_role, CollaboratorRole, SongRole, Visibility};

const SONG_COLUMNS: &str =
    "s.id, s.user_id, s.title, s.description, s.genre, s.status, s.visibility, s.created_at, s.updated_at";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Song {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub status: String,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Song row in the user's song list
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SongSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub song: Song,
    pub owner_handle: String,
    pub owner_first_name: Option<String>,
    pub role: String,
    pub lyric_count: i64,
}

/// Song with its owner's names
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SongDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub song: Song,
    pub owner_handle: String,
    pub owner_first_name: Option<String>,
    pub owner_last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Collaborator {
    pub song_id: i64,
    pub user_id: i64,
    pub role: String,
    pub invited_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub handle: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Validated song fields for create and update
#[derive(Debug, Clone)]
pub struct NewSong {
    pub title: String,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub status: String,
    pub visibility: Visibility,
}

#[derive(FromRow)]
struct AccessRow {
    user_id: i64,
    visibility: String,
    collab_role: Option<String>,
}

pub struct SongRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> SongRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's role on a song, or `None` without access (or no such song).
    pub async fn role(&self, song_id: i64, user_id: i64) -> Result<Option<SongRole>, DbError> {
        let row = sqlx::query_as::<_, AccessRow>(
            r#"
            SELECT s.user_id, s.visibility,
                   (SELECT role FROM song_collaborators
                    WHERE song_id = s.id AND user_id = $2) AS collab_role
            FROM songs s
            WHERE s.id = $1
            "#,
        )
        .bind(song_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.and_then(|r| {
            resolve_role(r.user_id, user_id, r.collab_role.as_deref(), &r.visibility)
        }))
    }

    /// Whether the user may edit the song (owner or editor).
    pub async fn can_edit(&self, song_id: i64, user_id: i64) -> Result<bool, DbError> {
        Ok(self
            .role(song_id, user_id)
            .await?
            .is_some_and(|role| role.can_edit()))
    }

    pub async fn is_owner(&self, song_id: i64, user_id: i64) -> Result<bool, DbError> {
        let found: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM songs WHERE id = $1 AND user_id = $2")
                .bind(song_id)
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;
        Ok(found.is_some())
    }

    /// Songs the user owns or collaborates on, most recently updated first.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<SongSummary>, DbError> {
        let sql = format!(
            r#"
            SELECT {SONG_COLUMNS},
                   u.handle AS owner_handle,
                   u.first_name AS owner_first_name,
                   CASE WHEN s.user_id = $1 THEN 'owner' ELSE sc.role END AS role,
                   (SELECT COUNT(*) FROM lyrics l WHERE l.song_id = s.id) AS lyric_count
            FROM songs s
            JOIN users u ON u.id = s.user_id
            LEFT JOIN song_collaborators sc ON sc.song_id = s.id AND sc.user_id = $1
            WHERE s.user_id = $1 OR sc.user_id IS NOT NULL
            ORDER BY s.updated_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, SongSummary>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_detail(&self, song_id: i64) -> Result<SongDetail, DbError> {
        let sql = format!(
            r#"
            SELECT {SONG_COLUMNS},
                   u.handle AS owner_handle,
                   u.first_name AS owner_first_name,
                   u.last_name AS owner_last_name
            FROM songs s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1
            "#
        );
        sqlx::query_as::<_, SongDetail>(&sql)
            .bind(song_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("song", song_id))
    }

    pub async fn collaborators(&self, song_id: i64) -> Result<Vec<Collaborator>, DbError> {
        let rows = sqlx::query_as::<_, Collaborator>(
            r#"
            SELECT sc.song_id, sc.user_id, sc.role, sc.invited_by, sc.created_at,
                   u.handle, u.first_name, u.last_name
            FROM song_collaborators sc
            JOIN users u ON u.id = sc.user_id
            WHERE sc.song_id = $1
            ORDER BY sc.created_at
            "#,
        )
        .bind(song_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn create(&self, user_id: i64, song: &NewSong) -> Result<Song, DbError> {
        let row = sqlx::query_as::<_, Song>(
            r#"
            INSERT INTO songs (user_id, title, description, genre, status, visibility)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, title, description, genre, status, visibility,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&song.title)
        .bind(&song.description)
        .bind(&song.genre)
        .bind(&song.status)
        .bind(song.visibility.as_str())
        .fetch_one(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, song_id: i64, song: &NewSong) -> Result<Song, DbError> {
        sqlx::query_as::<_, Song>(
            r#"
            UPDATE songs
            SET title = $1, description = $2, genre = $3, status = $4, visibility = $5,
                updated_at = NOW()
            WHERE id = $6
            RETURNING id, user_id, title, description, genre, status, visibility,
                      created_at, updated_at
            "#,
        )
        .bind(&song.title)
        .bind(&song.description)
        .bind(&song.genre)
        .bind(&song.status)
        .bind(song.visibility.as_str())
        .bind(song_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("song", song_id))
    }

    /// Delete a song the user owns. False if missing or not theirs.
    pub async fn delete_owned(&self, song_id: i64, user_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM songs WHERE id = $1 AND user_id = $2")
            .bind(song_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add a collaborator or change their role.
    pub async fn upsert_collaborator(
        &self,
        song_id: i64,
        user_id: i64,
        role: CollaboratorRole,
        invited_by: i64,
    ) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO song_collaborators (song_id, user_id, role, invited_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (song_id, user_id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(song_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(invited_by)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_collaborator(&self, song_id: i64, user_id: i64) -> Result<bool, DbError> {
        let result =
            sqlx::query("DELETE FROM song_collaborators WHERE song_id = $1 AND user_id = $2")
                .bind(song_id)
                .bind(user_id)
                .execute(self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
