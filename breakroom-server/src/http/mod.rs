//! HTTP layer
//!
//! Axum router with:
//! - Credentialed CORS for the site origins
//! - Sliding session refresh on every request
//! - Request tracing
//! - JSON error responses
//! - SPA fallback for non-API paths

pub mod error;
pub mod extract;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
