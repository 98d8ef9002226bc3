//! API error type with IntoResponse
//!
//! Every failure leaves as `{"error": <kind>, "message": <text>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use breakroom_core::LayoutError;
use serde_json::json;

use crate::db::repos::DbError;
use crate::models::ValidationError;
use crate::storage::StorageError;

#[derive(Debug)]
pub enum ApiError {
    /// Input failed a field check (400)
    Validation(ValidationError),

    /// Request is well-formed but not acceptable (400)
    BadRequest(String),

    /// Missing or invalid credentials (401)
    Unauthorized(&'static str),

    /// Authenticated but not allowed (403)
    Forbidden(String),

    /// Resource not found (404)
    NotFound(String),

    /// Database error (500, logged)
    Database(DbError),

    /// Object storage error (500, logged)
    Storage(StorageError),

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Storage(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (kind, message) = match self {
            Self::Validation(e) => ("validation_error", e.to_string()),
            Self::BadRequest(message) => ("bad_request", message),
            Self::Unauthorized(message) => ("unauthorized", message.to_string()),
            Self::Forbidden(message) => ("forbidden", message),
            Self::NotFound(message) => ("not_found", message),
            Self::Database(e) => {
                tracing::error!("Database error: {}", e);
                ("internal_error", "an internal error occurred".to_string())
            }
            Self::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                ("internal_error", "an internal error occurred".to_string())
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                ("internal_error", "an internal error occurred".to_string())
            }
        };

        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, .. } => Self::NotFound(format!("{} not found", capitalize(resource))),
            DbError::Conflict(message) => Self::BadRequest(message.to_string()),
            DbError::Layout(e) => e.into(),
            e => Self::Database(e),
        }
    }
}

impl From<LayoutError> for ApiError {
    fn from(e: LayoutError) -> Self {
        match e {
            LayoutError::UnknownBlock(_) => Self::NotFound("Block not found".to_string()),
            e => Self::BadRequest(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
