//! Gallery repository - per-user gallery settings and artworks

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;
use crate::models::GalleryUrl;

pub const URL_TAKEN: &str = "This gallery URL is already taken";

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GallerySettings {
    pub id: i64,
    pub gallery_url: String,
    pub gallery_name: String,
    pub created_at: DateTime<Utc>,
}

/// Public gallery joined with its artist
#[derive(Debug, Clone, FromRow)]
pub struct PublicGalleryRow {
    pub id: i64,
    pub gallery_url: String,
    pub gallery_name: String,
    pub user_id: i64,
    pub handle: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_path: Option<String>,
    pub bio: Option<String>,
}

/// Owner's view of an artwork
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Artwork {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image_path: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Published artwork as shown to visitors
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PublicArtwork {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Published artwork joined with its gallery and artist
#[derive(Debug, Clone, FromRow)]
pub struct PublicArtworkRow {
    #[sqlx(flatten)]
    pub artwork: PublicArtwork,
    pub gallery_url: String,
    pub gallery_name: String,
    pub handle: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_path: Option<String>,
    pub bio: Option<String>,
}

const ARTWORK_RETURNING: &str =
    "RETURNING id, title, description, image_path, is_published, created_at, updated_at";

pub struct GalleryRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> GalleryRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn public_gallery(&self, url: &str) -> Result<Option<PublicGalleryRow>, DbError> {
        let row = sqlx::query_as::<_, PublicGalleryRow>(
            r#"
            SELECT ug.id, ug.gallery_url, ug.gallery_name, ug.user_id,
                   u.handle, u.first_name, u.last_name, u.photo_path, u.bio
            FROM user_gallery ug
            JOIN users u ON u.id = ug.user_id
            WHERE ug.gallery_url = $1
            "#,
        )
        .bind(url)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Published artworks of a user, newest first.
    pub async fn published_artworks(&self, user_id: i64) -> Result<Vec<PublicArtwork>, DbError> {
        let rows = sqlx::query_as::<_, PublicArtwork>(
            r#"
            SELECT id, title, description, image_path, created_at, updated_at
            FROM gallery_artworks
            WHERE user_id = $1 AND is_published = TRUE
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// A published artwork, only if it belongs to the gallery at `url`.
    pub async fn public_artwork(
        &self,
        url: &str,
        artwork_id: i64,
    ) -> Result<Option<PublicArtworkRow>, DbError> {
        let row = sqlx::query_as::<_, PublicArtworkRow>(
            r#"
            SELECT ga.id, ga.title, ga.description, ga.image_path, ga.created_at, ga.updated_at,
                   ug.gallery_url, ug.gallery_name,
                   u.handle, u.first_name, u.last_name, u.photo_path, u.bio
            FROM gallery_artworks ga
            JOIN users u ON u.id = ga.user_id
            JOIN user_gallery ug ON ug.user_id = u.id
            WHERE ug.gallery_url = $1 AND ga.id = $2 AND ga.is_published = TRUE
            "#,
        )
        .bind(url)
        .bind(artwork_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn settings(&self, user_id: i64) -> Result<Option<GallerySettings>, DbError> {
        let row = sqlx::query_as::<_, GallerySettings>(
            "SELECT id, gallery_url, gallery_name, created_at FROM user_gallery WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// Owner of a gallery URL, if claimed.
    pub async fn url_owner(&self, url: &str) -> Result<Option<i64>, DbError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT user_id FROM user_gallery WHERE gallery_url = $1")
                .bind(url)
                .fetch_optional(self.pool)
                .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Create settings; a claimed URL is [`DbError::Conflict`].
    pub async fn create_settings(
        &self,
        user_id: i64,
        url: &GalleryUrl,
        name: &str,
    ) -> Result<GallerySettings, DbError> {
        sqlx::query_as::<_, GallerySettings>(
            r#"
            INSERT INTO user_gallery (user_id, gallery_url, gallery_name)
            VALUES ($1, $2, $3)
            RETURNING id, gallery_url, gallery_name, created_at
            "#,
        )
        .bind(user_id)
        .bind(url.as_str())
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from(e).on_unique(URL_TAKEN))
    }

    /// Update settings; `None` when the user has none yet.
    pub async fn update_settings(
        &self,
        user_id: i64,
        url: &GalleryUrl,
        name: &str,
    ) -> Result<Option<GallerySettings>, DbError> {
        sqlx::query_as::<_, GallerySettings>(
            r#"
            UPDATE user_gallery SET gallery_url = $1, gallery_name = $2
            WHERE user_id = $3
            RETURNING id, gallery_url, gallery_name, created_at
            "#,
        )
        .bind(url.as_str())
        .bind(name)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| DbError::from(e).on_unique(URL_TAKEN))
    }

    /// Make sure the user has gallery settings, claiming their handle as URL
    /// or `<handle>-<id>` when the handle is taken.
    pub async fn ensure_settings(&self, user_id: i64, handle: &str) -> Result<(), DbError> {
        if self.settings(user_id).await?.is_some() {
            return Ok(());
        }

        let name = default_gallery_name(handle);
        let candidates = [
            GalleryUrl::new(handle).ok(),
            GalleryUrl::with_user_suffix(handle, user_id).ok(),
        ];

        for url in candidates.into_iter().flatten() {
            let inserted: Option<(i64,)> = sqlx::query_as(
                r#"
                INSERT INTO user_gallery (user_id, gallery_url, gallery_name)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                RETURNING id
                "#,
            )
            .bind(user_id)
            .bind(url.as_str())
            .bind(&name)
            .fetch_optional(self.pool)
            .await?;

            if inserted.is_some() || self.settings(user_id).await?.is_some() {
                tracing::debug!(user_id, gallery_url = url.as_str(), "gallery settings ready");
                return Ok(());
            }
        }

        Err(DbError::Conflict(URL_TAKEN))
    }

    pub async fn list_artworks(&self, user_id: i64) -> Result<Vec<Artwork>, DbError> {
        let rows = sqlx::query_as::<_, Artwork>(
            r#"
            SELECT id, title, description, image_path, is_published, created_at, updated_at
            FROM gallery_artworks
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_artwork(&self, user_id: i64, id: i64) -> Result<Option<Artwork>, DbError> {
        let row = sqlx::query_as::<_, Artwork>(
            r#"
            SELECT id, title, description, image_path, is_published, created_at, updated_at
            FROM gallery_artworks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn create_artwork(
        &self,
        user_id: i64,
        title: &str,
        description: Option<&str>,
        image_path: &str,
        is_published: bool,
    ) -> Result<Artwork, DbError> {
        let sql = format!(
            r#"
            INSERT INTO gallery_artworks (user_id, title, description, image_path, is_published)
            VALUES ($1, $2, $3, $4, $5)
            {ARTWORK_RETURNING}
            "#
        );
        let row = sqlx::query_as::<_, Artwork>(&sql)
            .bind(user_id)
            .bind(title)
            .bind(description)
            .bind(image_path)
            .bind(is_published)
            .fetch_one(self.pool)
            .await?;
        Ok(row)
    }

    pub async fn update_artwork(
        &self,
        user_id: i64,
        id: i64,
        title: &str,
        description: Option<&str>,
        is_published: bool,
    ) -> Result<Option<Artwork>, DbError> {
        let sql = format!(
            r#"
            UPDATE gallery_artworks
            SET title = $1, description = $2, is_published = $3, updated_at = NOW()
            WHERE id = $4 AND user_id = $5
            {ARTWORK_RETURNING}
            "#
        );
        let row = sqlx::query_as::<_, Artwork>(&sql)
            .bind(title)
            .bind(description)
            .bind(is_published)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Delete an artwork, returning its storage key.
    pub async fn delete_artwork(&self, user_id: i64, id: i64) -> Result<Option<String>, DbError> {
        let row: Option<(String,)> = sqlx::query_as(
            "DELETE FROM gallery_artworks WHERE id = $1 AND user_id = $2 RETURNING image_path",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|(path,)| path))
    }
}

/// `"<handle>'s Gallery"`
pub fn default_gallery_name(handle: &str) -> String {
    format!("{}'s Gallery", handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::users::fixtures;

    #[test]
    fn default_name() {
        assert_eq!(default_gallery_name("inkwell"), "inkwell's Gallery");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn ensure_settings_falls_back_to_suffixed_url() {
        let pool = fixtures::pool().await;
        let first = fixtures::user(&pool, "gallery").await;
        let second = fixtures::user(&pool, "gallery").await;
        let repo = GalleryRepo::new(&pool);

        // Second user's handle is already claimed as a URL by the first
        let claimed = GalleryUrl::new(&second.handle).unwrap();
        repo.create_settings(first.id, &claimed, "Mine").await.unwrap();

        repo.ensure_settings(second.id, &second.handle).await.unwrap();
        let settings = repo.settings(second.id).await.unwrap().unwrap();
        assert_eq!(settings.gallery_url, format!("{}-{}", second.handle, second.id));
        assert_eq!(settings.gallery_name, default_gallery_name(&second.handle));

        // Idempotent
        repo.ensure_settings(second.id, &second.handle).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unpublished_artwork_hidden_from_public() {
        let pool = fixtures::pool().await;
        let user = fixtures::user(&pool, "artist").await;
        let repo = GalleryRepo::new(&pool);
        repo.ensure_settings(user.id, &user.handle).await.unwrap();
        let url = repo.settings(user.id).await.unwrap().unwrap().gallery_url;

        let draft = repo
            .create_artwork(user.id, "Draft", None, "gallery/x/art_1.png", false)
            .await
            .unwrap();
        assert!(repo.public_artwork(&url, draft.id).await.unwrap().is_none());

        repo.update_artwork(user.id, draft.id, "Final", Some("oil"), true)
            .await
            .unwrap();
        let public = repo.public_artwork(&url, draft.id).await.unwrap().unwrap();
        assert_eq!(public.artwork.title, "Final");

        let key = repo.delete_artwork(user.id, draft.id).await.unwrap();
        assert_eq!(key.as_deref(), Some("gallery/x/art_1.png"));
    }
}
