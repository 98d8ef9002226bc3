//! `breakroom layout` - run the packer offline
//!
//! Input is the same `{blocks, positions}` shape the dashboard endpoint
//! returns, with blocks reduced to `{id, x, y, w, h}`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use breakroom_core::{Breakpoint, Dashboard};
use clap::Parser;
use serde_json::json;
use tokio::io::AsyncReadExt;

#[derive(Parser, Debug)]
pub struct LayoutArgs {
    /// Column count to pack for (default: every breakpoint)
    #[arg(long, short = 'c')]
    pub columns: Option<u32>,

    /// Input JSON file (default: stdin)
    #[arg(long = "input", short = 'i', value_name = "PATH")]
    pub input: Option<PathBuf>,
}

pub async fn run_layout(args: LayoutArgs) -> Result<()> {
    let raw = match &args.input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };

    let output = compute(&raw, args.columns)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn compute(raw: &str, columns: Option<u32>) -> Result<serde_json::Value> {
    let dashboard: Dashboard = serde_json::from_str(raw).context("Invalid dashboard JSON")?;
    tracing::debug!(
        blocks = dashboard.blocks.len(),
        positions = dashboard.positions.len(),
        "packing dashboard"
    );

    match columns {
        Some(columns) => {
            Breakpoint::require_columns(columns)?;
            let items = dashboard.layout_for(columns)?;
            Ok(json!({ "col_count": columns, "items": items }))
        }
        None => Ok(json!({ "layouts": dashboard.responsive_layouts()? })),
    }
}
