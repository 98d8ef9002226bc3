//! breakroom-server: HTTP API for Prosaurus Breakroom
//!
//! Axum routes over a Postgres pool, grouped by feature:
//! breakroom dashboards, lyrics collaboration, galleries, shortcuts,
//! and test-run reporting. Sessions are sliding JWTs carried in a
//! cookie or bearer header.

pub mod auth;
pub mod config;
pub mod db;
pub mod http;
pub mod models;
pub mod og;
pub mod storage;

pub use config::{AppConfig, ConfigError};
pub use http::{build_router, run_server, AppState, ServerConfig};
