//! Dashboard endpoints - `/api/breakroom`
//!
//! Blocks carry a default geometry; each breakpoint's layout is packed
//! from that plus whatever positions the user saved at its column count.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use breakroom_core::{validate_placements, Breakpoint, GridRect, LayoutItem, Placement, SavedPositions};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::auth::AuthUser;
use crate::db::repos::{Block, BlockPatch, BreakroomRepo, NewBlock};
use crate::http::error::ApiError;
use crate::http::extract::Path;
use crate::http::server::AppState;
use crate::models::{nullable, require_text};

const DEFAULT_BLOCK_SIZE: u32 = 2;

#[derive(Serialize)]
pub struct DashboardResponse {
    pub blocks: Vec<Block>,
    pub positions: SavedPositions,
}

#[derive(Serialize)]
pub struct ResponsiveResponse {
    pub layouts: BTreeMap<Breakpoint, Vec<LayoutItem>>,
}

#[derive(Serialize)]
pub struct LayoutResponse {
    pub col_count: u32,
    pub items: Vec<LayoutItem>,
}

#[derive(Deserialize)]
pub struct SaveLayoutRequest {
    #[serde(default)]
    pub items: Vec<Placement>,
}

#[derive(Deserialize)]
pub struct LegacyLayoutRequest {
    #[serde(default)]
    pub blocks: Vec<Placement>,
}

#[derive(Deserialize)]
pub struct CreateBlockRequest {
    pub block_type: Option<String>,
    pub content_id: Option<i64>,
    #[serde(default)]
    pub x: u32,
    #[serde(default)]
    pub y: u32,
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub title: Option<String>,
    pub settings: Option<serde_json::Value>,
}

impl CreateBlockRequest {
    fn validate(self) -> Result<NewBlock, ApiError> {
        let block_type = require_text("Block type", self.block_type.as_deref())?;
        let rect = GridRect::new(
            self.x,
            self.y,
            self.w.unwrap_or(DEFAULT_BLOCK_SIZE),
            self.h.unwrap_or(DEFAULT_BLOCK_SIZE),
        );
        if rect.is_empty() {
            return Err(ApiError::bad_request(
                "Block width and height must be at least 1",
            ));
        }
        Ok(NewBlock {
            block_type,
            content_id: self.content_id,
            rect,
            title: self.title,
            settings: self.settings,
        })
    }
}

/// Any subset of block fields; `null` clears `content_id`, `title`, `settings`
#[derive(Deserialize, Default)]
pub struct UpdateBlockRequest {
    pub block_type: Option<String>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub content_id: Option<Option<i64>>,
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub w: Option<u32>,
    pub h: Option<u32>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub settings: Option<Option<serde_json::Value>>,
}

impl UpdateBlockRequest {
    fn validate(self) -> Result<BlockPatch, ApiError> {
        if self.w == Some(0) || self.h == Some(0) {
            return Err(ApiError::bad_request(
                "Block width and height must be at least 1",
            ));
        }
        let block_type = match self.block_type {
            Some(t) => Some(require_text("Block type", Some(&t))?),
            None => None,
        };
        Ok(BlockPatch {
            block_type,
            content_id: self.content_id,
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
            title: self.title,
            settings: self.settings,
        })
    }
}

#[derive(Serialize)]
pub struct BlockResponse {
    pub block: Block,
}

/// GET /api/breakroom/layout
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<DashboardResponse>, ApiError> {
    let repo = BreakroomRepo::new(&state.pool);
    let blocks = repo.blocks(user.id).await?;
    let positions = repo.positions(user.id).await?;
    Ok(Json(DashboardResponse { blocks, positions }))
}

/// GET /api/breakroom/layout/responsive
async fn responsive_layouts(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ResponsiveResponse>, ApiError> {
    let columns = Breakpoint::ALL.map(Breakpoint::columns);
    let dashboard = BreakroomRepo::new(&state.pool)
        .settle(user.id, &columns)
        .await?;
    let layouts = dashboard.responsive_layouts()?;
    Ok(Json(ResponsiveResponse { layouts }))
}

/// GET /api/breakroom/layout/{col_count}
async fn layout_for_columns(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(col_count): Path<u32>,
) -> Result<Json<LayoutResponse>, ApiError> {
    Breakpoint::require_columns(col_count)?;
    let dashboard = BreakroomRepo::new(&state.pool)
        .settle(user.id, &[col_count])
        .await?;
    let items = dashboard.layout_for(col_count)?;
    Ok(Json(LayoutResponse { col_count, items }))
}

/// PUT /api/breakroom/layout/{col_count}
async fn save_layout(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(col_count): Path<u32>,
    Json(req): Json<SaveLayoutRequest>,
) -> Result<Json<LayoutResponse>, ApiError> {
    validate_placements(col_count, &req.items)?;

    let repo = BreakroomRepo::new(&state.pool);
    repo.save_positions(user.id, col_count, &req.items).await?;
    tracing::info!(
        user_id = user.id,
        col_count,
        items = req.items.len(),
        "layout saved"
    );

    let dashboard = repo.settle(user.id, &[col_count]).await?;
    let items = dashboard.layout_for(col_count)?;
    Ok(Json(LayoutResponse { col_count, items }))
}

/// PUT /api/breakroom/layout (default geometry)
async fn update_default_layout(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<LegacyLayoutRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if let Some(empty) = req.blocks.iter().find(|p| p.rect.is_empty()) {
        return Err(ApiError::bad_request(format!(
            "block {} must be at least one cell wide and tall",
            empty.id
        )));
    }
    let updated = BreakroomRepo::new(&state.pool)
        .update_defaults(user.id, &req.blocks)
        .await?;
    tracing::debug!(user_id = user.id, updated, "default layout updated");
    Ok(MessageResponse::new("Layout updated successfully"))
}

/// POST /api/breakroom/blocks
async fn create_block(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateBlockRequest>,
) -> Result<(StatusCode, Json<BlockResponse>), ApiError> {
    let block = BreakroomRepo::new(&state.pool)
        .create_block(user.id, &req.validate()?)
        .await?;
    tracing::info!(user_id = user.id, block_id = block.id, block_type = %block.block_type, "block created");
    Ok((StatusCode::CREATED, Json(BlockResponse { block })))
}

/// PUT /api/breakroom/blocks/{id}
async fn update_block(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateBlockRequest>,
) -> Result<Json<BlockResponse>, ApiError> {
    let block = BreakroomRepo::new(&state.pool)
        .update_block(user.id, id, &req.validate()?)
        .await?
        .ok_or_else(|| ApiError::not_found("Block not found"))?;
    Ok(Json(BlockResponse { block }))
}

/// DELETE /api/breakroom/blocks/{id}
async fn delete_block(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !BreakroomRepo::new(&state.pool).delete_block(user.id, id).await? {
        return Err(ApiError::not_found("Block not found"));
    }
    Ok(MessageResponse::new("Block deleted successfully"))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/layout", get(get_dashboard).put(update_default_layout))
        .route("/layout/responsive", get(responsive_layouts))
        .route("/layout/{col_count}", get(layout_for_columns).put(save_layout))
        .route("/blocks", post(create_block))
        .route("/blocks/{id}", put(update_block).delete(delete_block))
}
