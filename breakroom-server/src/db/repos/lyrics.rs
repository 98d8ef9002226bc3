//! Lyric repository

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use super::DbError;

const LYRIC_COLUMNS: &str = "l.id, l.user_id, l.song_id, l.title, l.content, l.section_type, \
     l.section_order, l.mood, l.notes, l.status, l.created_at, l.updated_at";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Lyric {
    pub id: i64,
    pub user_id: i64,
    pub song_id: Option<i64>,
    pub title: Option<String>,
    pub content: String,
    pub section_type: String,
    pub section_order: Option<i32>,
    pub mood: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LyricWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub lyric: Lyric,
    pub author_handle: String,
    pub author_first_name: Option<String>,
}

/// Complete set of writable lyric fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricInput {
    pub song_id: Option<i64>,
    pub title: Option<String>,
    pub content: String,
    pub section_type: String,
    pub section_order: Option<i32>,
    pub mood: Option<String>,
    pub notes: Option<String>,
    pub status: String,
}

/// One entry of a reorder request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LyricOrder {
    pub id: i64,
    pub section_order: Option<i32>,
}

pub struct LyricRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> LyricRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> Result<Option<Lyric>, DbError> {
        let sql = format!("SELECT {LYRIC_COLUMNS} FROM lyrics l WHERE l.id = $1");
        let row = sqlx::query_as::<_, Lyric>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_with_author(&self, id: i64) -> Result<Option<LyricWithAuthor>, DbError> {
        let sql = format!(
            r#"
            SELECT {LYRIC_COLUMNS}, u.handle AS author_handle, u.first_name AS author_first_name
            FROM lyrics l
            JOIN users u ON u.id = l.user_id
            WHERE l.id = $1
            "#
        );
        let row = sqlx::query_as::<_, LyricWithAuthor>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// A song's lyrics in section order, then creation order.
    pub async fn list_for_song(&self, song_id: i64) -> Result<Vec<LyricWithAuthor>, DbError> {
        let sql = format!(
            r#"
            SELECT {LYRIC_COLUMNS}, u.handle AS author_handle, u.first_name AS author_first_name
            FROM lyrics l
            JOIN users u ON u.id = l.user_id
            WHERE l.song_id = $1
            ORDER BY l.section_order ASC NULLS LAST, l.created_at ASC
            "#
        );
        let rows = sqlx::query_as::<_, LyricWithAuthor>(&sql)
            .bind(song_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// The user's lyrics that belong to no song.
    pub async fn standalone(&self, user_id: i64) -> Result<Vec<Lyric>, DbError> {
        let sql = format!(
            r#"
            SELECT {LYRIC_COLUMNS}
            FROM lyrics l
            WHERE l.user_id = $1 AND l.song_id IS NULL
            ORDER BY l.updated_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, Lyric>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create(&self, user_id: i64, input: &LyricInput) -> Result<Lyric, DbError> {
        sqlx::query_as::<_, Lyric>(
            r#"
            INSERT INTO lyrics (user_id, song_id, title, content, section_type,
                                section_order, mood, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, song_id, title, content, section_type,
                      section_order, mood, notes, status, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(input.song_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.section_type)
        .bind(input.section_order)
        .bind(&input.mood)
        .bind(&input.notes)
        .bind(&input.status)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let song = input.song_id.unwrap_or_default();
            DbError::from(e).on_foreign_key("song", song)
        })
    }

    pub async fn update(&self, id: i64, input: &LyricInput) -> Result<Lyric, DbError> {
        sqlx::query_as::<_, Lyric>(
            r#"
            UPDATE lyrics
            SET song_id = $1, title = $2, content = $3, section_type = $4,
                section_order = $5, mood = $6, notes = $7, status = $8,
                updated_at = NOW()
            WHERE id = $9
            RETURNING id, user_id, song_id, title, content, section_type,
                      section_order, mood, notes, status, created_at, updated_at
            "#,
        )
        .bind(input.song_id)
        .bind(&input.title)
        .bind(&input.content)
        .bind(&input.section_type)
        .bind(input.section_order)
        .bind(&input.mood)
        .bind(&input.notes)
        .bind(&input.status)
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            let song = input.song_id.unwrap_or_default();
            DbError::from(e).on_foreign_key("song", song)
        })?
        .ok_or_else(|| DbError::not_found("lyric", id))
    }

    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM lyrics WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set section order for lyrics of one song in a single transaction.
    ///
    /// Entries naming lyrics outside the song are skipped. Returns the number
    /// of lyrics updated.
    pub async fn reorder(&self, song_id: i64, order: &[LyricOrder]) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut updated = 0;

        for item in order {
            let result = sqlx::query(
                "UPDATE lyrics SET section_order = $1, updated_at = NOW() WHERE id = $2 AND song_id = $3",
            )
            .bind(item.section_order)
            .bind(item.id)
            .bind(song_id)
            .execute(&mut *tx)
            .await?;
            updated += result.rows_affected();
        }

        tx.commit().await?;
        tracing::debug!(song_id, updated, "lyrics reordered");
        Ok(updated)
    }
}
