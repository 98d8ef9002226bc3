//! Legacy upload URLs
//!
//! Files live in object storage; `/uploads/<key>` and `/api/uploads/<key>`
//! answer with a permanent redirect to the stored object.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::http::error::ApiError;
use crate::http::extract::Path;
use crate::http::server::AppState;

const KEY_PREFIXES: [&str; 4] = ["profiles/", "chat/", "blog/", "gallery/"];

/// Map a request path to its object key.
///
/// Bare legacy filenames get their folder prefix back; anything else is
/// used as-is.
pub fn object_key(path: &str) -> Option<String> {
    let key = path.trim_start_matches('/');
    if key.is_empty() {
        return None;
    }

    if KEY_PREFIXES.iter().any(|p| key.starts_with(p)) {
        return Some(key.to_string());
    }

    let key = if key.starts_with("profile_") {
        format!("profiles/{key}")
    } else if key.starts_with("chat_") {
        format!("chat/{key}")
    } else {
        key.to_string()
    };
    Some(key)
}

/// GET /uploads/{*key}
async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let key = object_key(&path).ok_or_else(|| ApiError::not_found("File not found"))?;
    let target = state.storage.public_url(&key);
    let location = HeaderValue::from_str(&target).map_err(|e| ApiError::Internal {
        message: format!("bad redirect target {target}: {e}"),
    })?;

    Ok((StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response())
}

/// GET /uploads
async fn missing() -> ApiError {
    ApiError::not_found("File not found")
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/uploads", get(missing))
        .route("/uploads/{*key}", get(redirect))
}
