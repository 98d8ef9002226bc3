//! Axum server setup
//!
//! - CORS for the configured origin plus the fixed site origins
//! - Session refresh and tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::{middleware, Router};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::auth::{refresh_session, TokenService, API_KEY_HEADER, NEW_TOKEN_HEADER};
use crate::config::AppConfig;
use crate::storage::ObjectStore;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:3000)
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
    pub tokens: TokenService,
    pub storage: Arc<dyn ObjectStore>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig, storage: Arc<dyn ObjectStore>) -> Self {
        let tokens = TokenService::new(&config.secret_key);
        Self {
            pool,
            config,
            tokens,
            storage,
        }
    }
}

/// Assemble the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(routes::health::router())
        .nest("/shortcuts", routes::shortcuts::router())
        .nest("/lyrics", routes::lyrics::router())
        .nest("/gallery", routes::gallery::router())
        .nest("/test-results", routes::test_results::router())
        .nest("/breakroom", routes::breakroom::router())
        .merge(routes::uploads::router())
        .fallback(routes::api_not_found);

    let dist = &state.config.dist_dir;
    let spa = ServeDir::new(dist).fallback(ServeFile::new(dist.join("index.html")));

    Router::new()
        .nest("/api", api)
        .merge(routes::uploads::router())
        .merge(routes::og::router())
        .fallback_service(spa)
        .layer(middleware::from_fn_with_state(state.clone(), refresh_session))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            ACCEPT,
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .expose_headers([HeaderName::from_static(NEW_TOKEN_HEADER)])
}

/// Run the HTTP server until a shutdown signal arrives.
///
/// # Example
///
/// ```ignore
/// let pool = db::connect(&database_url, PoolSettings::default()).await?;
/// let storage = Arc::new(S3Store::from_env(config.storage.clone()).await);
/// let state = Arc::new(AppState::new(pool, config, storage));
/// run_server(state, ServerConfig::default()).await?;
/// ```
pub async fn run_server(state: Arc<AppState>, config: ServerConfig) -> Result<(), ServerError> {
    tracing::info!(
        origin = %state.config.public_origin,
        dist = %state.config.dist_dir.display(),
        production = state.config.production,
        "starting breakroom server"
    );
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3000);
        assert!(config.bind_addr.ip().is_unspecified());
    }
}
