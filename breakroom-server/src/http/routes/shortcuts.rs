//! Shortcut endpoints - `/api/shortcuts`

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::auth::AuthUser;
use crate::db::repos::{Shortcut, ShortcutRef, ShortcutRepo};
use crate::http::error::ApiError;
use crate::http::extract::Path;
use crate::http::server::AppState;
use crate::models::{blank_to_none, require_text};

#[derive(Serialize)]
pub struct ShortcutsResponse {
    pub shortcuts: Vec<Shortcut>,
}

#[derive(Serialize)]
pub struct ShortcutResponse {
    pub shortcut: Shortcut,
}

#[derive(Deserialize)]
pub struct CheckQuery {
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct CheckResponse {
    pub exists: bool,
    pub shortcut: Option<ShortcutRef>,
}

#[derive(Deserialize)]
pub struct CreateShortcutRequest {
    pub name: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteByUrlRequest {
    pub url: Option<String>,
}

/// GET /api/shortcuts
async fn list_shortcuts(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ShortcutsResponse>, ApiError> {
    let shortcuts = ShortcutRepo::new(&state.pool).list(user.id).await?;
    Ok(Json(ShortcutsResponse { shortcuts }))
}

/// GET /api/shortcuts/check?url=
async fn check_shortcut(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<CheckQuery>,
) -> Result<Json<CheckResponse>, ApiError> {
    let url = blank_to_none(query.url)
        .ok_or_else(|| ApiError::bad_request("URL parameter is required"))?;

    let shortcut = ShortcutRepo::new(&state.pool).find_by_url(user.id, &url).await?;
    Ok(Json(CheckResponse {
        exists: shortcut.is_some(),
        shortcut,
    }))
}

/// POST /api/shortcuts
async fn create_shortcut(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateShortcutRequest>,
) -> Result<(StatusCode, Json<ShortcutResponse>), ApiError> {
    let name = require_text("Name", req.name.as_deref())?;
    let url = require_text("URL", req.url.as_deref())?;
    let icon = blank_to_none(req.icon);

    let shortcut = ShortcutRepo::new(&state.pool)
        .create(user.id, &name, &url, icon.as_deref())
        .await?;
    tracing::debug!(user_id = user.id, shortcut_id = shortcut.id, "created shortcut");

    Ok((StatusCode::CREATED, Json(ShortcutResponse { shortcut })))
}

/// DELETE /api/shortcuts/{id}
async fn delete_shortcut(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !ShortcutRepo::new(&state.pool).delete(user.id, id).await? {
        return Err(ApiError::not_found("Shortcut not found"));
    }
    Ok(MessageResponse::new("Shortcut deleted successfully"))
}

/// DELETE /api/shortcuts/by-url
async fn delete_by_url(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<DeleteByUrlRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let url = require_text("URL", req.url.as_deref())?;
    if !ShortcutRepo::new(&state.pool).delete_by_url(user.id, &url).await? {
        return Err(ApiError::not_found("Shortcut not found"));
    }
    Ok(MessageResponse::new("Shortcut deleted successfully"))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_shortcuts).post(create_shortcut))
        .route("/check", get(check_shortcut))
        .route("/by-url", delete(delete_by_url))
        .route("/{id}", delete(delete_shortcut))
}
