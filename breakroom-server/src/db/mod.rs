//! Database layer - connection pool, schema, and repositories
//!
//! - Bounded connection pool, handles share the pool by clone
//! - Conflicts come back from constraints, not check-then-insert
//! - Multi-statement writes run inside a transaction

pub mod migrations;
pub mod repos;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use repos::*;

/// Connection pool sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    /// How long a request waits for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl PoolSettings {
    /// Default settings with a different connection cap; `None` keeps the default.
    pub fn with_max_connections(max_connections: Option<u32>) -> Self {
        let defaults = Self::default();
        Self {
            max_connections: max_connections.unwrap_or(defaults.max_connections),
            ..defaults
        }
    }

    fn options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections.max(1))
            .acquire_timeout(self.acquire_timeout)
    }
}

/// Open a pool against `database_url`.
///
/// ```ignore
/// let pool = db::connect("postgres://localhost/breakroom", PoolSettings::default()).await?;
/// ```
pub async fn connect(database_url: &str, settings: PoolSettings) -> Result<PgPool, sqlx::Error> {
    tracing::debug!(
        max_connections = settings.max_connections,
        acquire_timeout_ms = settings.acquire_timeout.as_millis() as u64,
        "connecting to database"
    );
    settings.options().connect(database_url).await
}
