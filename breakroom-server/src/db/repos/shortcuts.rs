//! Shortcut repository
//!
//! URLs are unique per user (`UNIQUE (user_id, url)`); new shortcuts go
//! to the end of the user's list.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Shortcut {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Result of a URL check
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ShortcutRef {
    pub id: i64,
    pub name: String,
    pub url: String,
}

pub const DUPLICATE_URL: &str = "A shortcut for this URL already exists";

pub struct ShortcutRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ShortcutRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<Shortcut>, DbError> {
        let rows = sqlx::query_as::<_, Shortcut>(
            r#"
            SELECT id, name, url, icon, sort_order, created_at
            FROM user_shortcuts
            WHERE user_id = $1
            ORDER BY sort_order, created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_url(&self, user_id: i64, url: &str) -> Result<Option<ShortcutRef>, DbError> {
        let row = sqlx::query_as::<_, ShortcutRef>(
            "SELECT id, name, url FROM user_shortcuts WHERE user_id = $1 AND url = $2",
        )
        .bind(user_id)
        .bind(url)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Append a shortcut after the user's current last one.
    ///
    /// A URL the user already saved is a [`DbError::Conflict`].
    pub async fn create(
        &self,
        user_id: i64,
        name: &str,
        url: &str,
        icon: Option<&str>,
    ) -> Result<Shortcut, DbError> {
        sqlx::query_as::<_, Shortcut>(
            r#"
            INSERT INTO user_shortcuts (user_id, name, url, icon, sort_order)
            SELECT $1, $2, $3, $4, COALESCE(MAX(sort_order), 0) + 1
            FROM user_shortcuts
            WHERE user_id = $1
            RETURNING id, name, url, icon, sort_order, created_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(url)
        .bind(icon)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from(e).on_unique(DUPLICATE_URL))
    }

    /// Delete one of the user's shortcuts. False if it isn't theirs.
    pub async fn delete(&self, user_id: i64, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM user_shortcuts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_url(&self, user_id: i64, url: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM user_shortcuts WHERE user_id = $1 AND url = $2")
            .bind(user_id)
            .bind(url)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
