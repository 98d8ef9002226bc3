//! `breakroom token` - mint a session token

use anyhow::{Context, Result};
use breakroom_server::auth::{TokenService, SESSION_TTL_SECS};
use clap::Parser;

#[derive(Parser, Debug)]
pub struct TokenArgs {
    /// User handle to put in the token
    #[arg(long)]
    pub handle: String,

    /// Signing key
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    /// Lifetime in hours (default: 48)
    #[arg(long)]
    pub ttl_hours: Option<i64>,
}

pub fn run_token(args: TokenArgs) -> Result<()> {
    let ttl_secs = args.ttl_hours.map_or(SESSION_TTL_SECS, |hours| hours * 3600);
    let tokens = TokenService::with_ttl(&args.secret_key, ttl_secs);
    let token = tokens.issue(&args.handle).context("Failed to sign token")?;
    println!("{token}");
    Ok(())
}
