//! `breakroom migrate` - apply the schema

use std::path::PathBuf;

use anyhow::{Context, Result};
use breakroom_server::db::migrations;
use clap::Parser;

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Extra SQL file to run after the embedded schema
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let script = match &args.file {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let pool = super::connect(&args.database_url, Some(1)).await?;
    migrations::run(&pool).await.context("Failed to run migrations")?;

    if let (Some(sql), Some(path)) = (script, &args.file) {
        migrations::run_script(&pool, &sql)
            .await
            .with_context(|| format!("Failed to apply {}", path.display()))?;
        tracing::info!(file = %path.display(), "applied migration file");
    }

    println!("Schema up to date ({} tables)", migrations::tables().count());
    Ok(())
}
