//! Read-only blog lookups used for link previews

use sqlx::{FromRow, PgPool};

use super::DbError;

/// Blog joined with its owner
#[derive(Debug, Clone, FromRow)]
pub struct BlogOwner {
    pub blog_url: String,
    pub blog_name: String,
    pub user_id: i64,
    pub handle: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_path: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
}

/// Published post with author and (optional) blog
#[derive(Debug, Clone, FromRow)]
pub struct PostWithAuthor {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub handle: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_path: Option<String>,
    pub blog_url: Option<String>,
    pub blog_name: Option<String>,
}

pub struct BlogRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_blog(&self, blog_url: &str) -> Result<Option<BlogOwner>, DbError> {
        let row = sqlx::query_as::<_, BlogOwner>(
            r#"
            SELECT ub.blog_url, ub.blog_name, ub.user_id,
                   u.handle, u.first_name, u.last_name, u.photo_path
            FROM user_blog ub
            JOIN users u ON u.id = ub.user_id
            WHERE ub.blog_url = $1
            "#,
        )
        .bind(blog_url)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// A published post by the given author.
    pub async fn published_post(&self, post_id: i64, user_id: i64) -> Result<Option<BlogPost>, DbError> {
        let row = sqlx::query_as::<_, BlogPost>(
            r#"
            SELECT id, title, content FROM blog_posts
            WHERE id = $1 AND user_id = $2 AND is_published = TRUE
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    pub async fn published_post_with_author(
        &self,
        post_id: i64,
    ) -> Result<Option<PostWithAuthor>, DbError> {
        let row = sqlx::query_as::<_, PostWithAuthor>(
            r#"
            SELECT bp.id, bp.title, bp.content,
                   u.handle, u.first_name, u.last_name, u.photo_path,
                   ub.blog_url, ub.blog_name
            FROM blog_posts bp
            JOIN users u ON u.id = bp.user_id
            LEFT JOIN user_blog ub ON ub.user_id = u.id
            WHERE bp.id = $1 AND bp.is_published = TRUE
            "#,
        )
        .bind(post_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }
}
