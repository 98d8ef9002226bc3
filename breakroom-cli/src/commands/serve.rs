//! `breakroom serve` - HTTP server

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use breakroom_server::db::migrations;
use breakroom_server::storage::S3Store;
use breakroom_server::{run_server, AppConfig, AppState, ServerConfig};
use clap::Parser;

#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Pool size
    #[arg(long, env = "DB_MAX_CONNECTIONS")]
    pub max_connections: Option<u32>,

    /// Don't apply the schema before serving
    #[arg(long)]
    pub skip_migrations: bool,
}

pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = AppConfig::from_env().context("Invalid server configuration")?;

    let pool = super::connect(&args.database_url, args.max_connections).await?;
    if args.skip_migrations {
        tracing::info!("skipping migrations");
    } else {
        migrations::run(&pool).await.context("Failed to run migrations")?;
    }

    let storage = Arc::new(S3Store::from_env(config.storage.clone()).await);
    tracing::info!(bucket = %config.storage.bucket, region = %config.storage.region, "object storage ready");

    let state = Arc::new(AppState::new(pool, config, storage));
    run_server(state, ServerConfig { bind_addr: args.bind })
        .await
        .context("Server error")?;

    Ok(())
}
