//! Route handlers organized by feature

pub mod breakroom;
pub mod gallery;
pub mod health;
pub mod lyrics;
pub mod og;
pub mod shortcuts;
pub mod test_results;
pub mod uploads;

use axum::http::Uri;

use crate::http::error::ApiError;

/// Fallback for unmatched `/api/*` paths.
pub async fn api_not_found(uri: Uri) -> ApiError {
    tracing::debug!(path = %uri.path(), "no API route");
    ApiError::not_found("Not found")
}

/// `{"message": ...}` body used by delete endpoints
#[derive(Debug, serde::Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> axum::Json<Self> {
        axum::Json(Self { message })
    }
}
