//! User lookups for authentication and collaborator invites

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;

/// Authenticated user identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub handle: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, handle, first_name, last_name FROM users WHERE handle = $1",
        )
        .bind(handle)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Insert a user; the handle must be free.
    pub async fn create(
        &self,
        handle: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<User, DbError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (handle, first_name, last_name)
            VALUES ($1, $2, $3)
            RETURNING id, handle, first_name, last_name
            "#,
        )
        .bind(handle)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::from(e).on_unique("This handle is already taken"))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_then_find() {
        let pool = fixtures::pool().await;
        let user = fixtures::user(&pool, "find").await;

        let found = UserRepo::new(&pool).find_by_handle(&user.handle).await.unwrap();
        assert_eq!(found, Some(user.clone()));

        let dup = UserRepo::new(&pool).create(&user.handle, None, None).await;
        assert!(matches!(dup, Err(DbError::Conflict(_))));
    }
}
