//! Command implementations for the breakroom CLI

pub mod layout;
pub mod migrate;
pub mod serve;
pub mod token;

pub use layout::run_layout;
pub use migrate::run_migrate;
pub use serve::run_serve;
pub use token::run_token;

use anyhow::{Context, Result};
use breakroom_server::db::{self, PoolSettings};
use sqlx::PgPool;

/// Connect to Postgres, honoring `DB_MAX_CONNECTIONS`.
pub(crate) async fn connect(database_url: &str, max_connections: Option<u32>) -> Result<PgPool> {
    db::connect(database_url, PoolSettings::with_max_connections(max_connections))
        .await
        .context("Failed to create database pool")
}
