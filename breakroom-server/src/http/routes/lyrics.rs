//! Songwriting endpoints - `/api/lyrics`
//!
//! Songs are owned by one user and shared through collaborator roles.
//! Lyrics belong to their author and optionally to a song; song editors
//! may change any lyric on the song.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::auth::AuthUser;
use crate::db::repos::{
    Collaborator, Lyric, LyricInput, LyricOrder, LyricRepo, LyricWithAuthor, NewSong, Song,
    SongDetail, SongRepo, SongSummary, UserRepo,
};
use crate::http::error::ApiError;
use crate::http::extract::Path;
use crate::http::server::AppState;
use crate::models::{
    blank_to_none, nullable, require_text, CollaboratorRole, SongRole, Visibility,
};

const DEFAULT_SONG_STATUS: &str = "idea";
const DEFAULT_SECTION_TYPE: &str = "idea";
const DEFAULT_LYRIC_STATUS: &str = "draft";

// ---- request / response types ----

#[derive(Deserialize)]
pub struct SongRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub status: Option<String>,
    pub visibility: Option<String>,
}

impl SongRequest {
    fn validate(self) -> Result<NewSong, ApiError> {
        Ok(NewSong {
            title: require_text("Title", self.title.as_deref())?,
            description: blank_to_none(self.description),
            genre: blank_to_none(self.genre),
            status: blank_to_none(self.status).unwrap_or_else(|| DEFAULT_SONG_STATUS.to_string()),
            visibility: Visibility::parse_or_default(self.visibility.as_deref())?,
        })
    }
}

#[derive(Deserialize)]
pub struct AddCollaboratorRequest {
    pub handle: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateLyricRequest {
    pub song_id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub section_type: Option<String>,
    pub section_order: Option<i32>,
    pub mood: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

/// Lyric update; `song_id` and `section_order` keep their value when absent
/// and are cleared by an explicit `null`
#[derive(Deserialize)]
pub struct UpdateLyricRequest {
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub song_id: Option<Option<i64>>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub section_type: Option<String>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub section_order: Option<Option<i32>>,
    pub mood: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct ReorderRequest {
    #[serde(rename = "lyricOrder", default)]
    pub lyric_order: Vec<LyricOrder>,
}

#[derive(Serialize)]
pub struct SongsResponse {
    pub songs: Vec<SongSummary>,
}

#[derive(Serialize)]
pub struct SongResponse {
    pub song: Song,
}

#[derive(Serialize)]
pub struct SongView {
    #[serde(flatten)]
    pub detail: SongDetail,
    pub role: SongRole,
}

#[derive(Serialize)]
pub struct SongDetailResponse {
    pub song: SongView,
    pub lyrics: Vec<LyricWithAuthor>,
    pub collaborators: Vec<Collaborator>,
}

#[derive(Serialize)]
pub struct AddedCollaborator {
    pub user_id: i64,
    pub handle: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: CollaboratorRole,
}

#[derive(Serialize)]
pub struct CollaboratorResponse {
    pub collaborator: AddedCollaborator,
}

#[derive(Serialize)]
pub struct LyricsResponse {
    pub lyrics: Vec<Lyric>,
}

#[derive(Serialize)]
pub struct LyricResponse<T> {
    pub lyric: T,
}

// ---- songs ----

/// GET /api/lyrics/songs
async fn list_songs(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<SongsResponse>, ApiError> {
    let songs = SongRepo::new(&state.pool).list_for_user(user.id).await?;
    Ok(Json(SongsResponse { songs }))
}

/// GET /api/lyrics/songs/{id}
async fn get_song(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<SongDetailResponse>, ApiError> {
    let songs = SongRepo::new(&state.pool);
    let role = songs
        .role(id, user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Song not found"))?;

    let detail = songs.get_detail(id).await?;
    let lyrics = LyricRepo::new(&state.pool).list_for_song(id).await?;
    let collaborators = songs.collaborators(id).await?;

    Ok(Json(SongDetailResponse {
        song: SongView { detail, role },
        lyrics,
        collaborators,
    }))
}

/// POST /api/lyrics/songs
async fn create_song(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<SongRequest>,
) -> Result<(StatusCode, Json<SongResponse>), ApiError> {
    let new_song = req.validate()?;
    let song = SongRepo::new(&state.pool).create(user.id, &new_song).await?;
    tracing::info!(user_id = user.id, song_id = song.id, "song created");
    Ok((StatusCode::CREATED, Json(SongResponse { song })))
}

/// PUT /api/lyrics/songs/{id}
async fn update_song(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<SongRequest>,
) -> Result<Json<SongResponse>, ApiError> {
    let songs = SongRepo::new(&state.pool);
    if !songs.can_edit(id, user.id).await? {
        return Err(ApiError::forbidden("Not authorized to edit this song"));
    }
    let song = songs.update(id, &req.validate()?).await?;
    Ok(Json(SongResponse { song }))
}

/// DELETE /api/lyrics/songs/{id}
async fn delete_song(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !SongRepo::new(&state.pool).delete_owned(id, user.id).await? {
        return Err(ApiError::not_found("Song not found or not authorized"));
    }
    tracing::info!(user_id = user.id, song_id = id, "song deleted");
    Ok(MessageResponse::new("Song deleted successfully"))
}

/// POST /api/lyrics/songs/{id}/collaborators
async fn add_collaborator(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<AddCollaboratorRequest>,
) -> Result<(StatusCode, Json<CollaboratorResponse>), ApiError> {
    let songs = SongRepo::new(&state.pool);
    if !songs.is_owner(id, user.id).await? {
        return Err(ApiError::forbidden("Only the song owner can add collaborators"));
    }

    let role = CollaboratorRole::parse_or_default(req.role.as_deref())?;
    let handle = require_text("Handle", req.handle.as_deref())?;
    let collaborator = UserRepo::new(&state.pool)
        .find_by_handle(&handle)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if collaborator.id == user.id {
        return Err(ApiError::bad_request("Cannot add yourself as a collaborator"));
    }

    songs
        .upsert_collaborator(id, collaborator.id, role, user.id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CollaboratorResponse {
            collaborator: AddedCollaborator {
                user_id: collaborator.id,
                handle: collaborator.handle,
                first_name: collaborator.first_name,
                last_name: collaborator.last_name,
                role,
            },
        }),
    ))
}

/// DELETE /api/lyrics/songs/{id}/collaborators/{user_id}
async fn remove_collaborator(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path((id, collaborator_id)): Path<(i64, i64)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let songs = SongRepo::new(&state.pool);
    if !songs.is_owner(id, user.id).await? {
        return Err(ApiError::forbidden("Only the song owner can remove collaborators"));
    }
    songs.remove_collaborator(id, collaborator_id).await?;
    Ok(MessageResponse::new("Collaborator removed"))
}

/// PUT /api/lyrics/songs/{id}/reorder
async fn reorder_lyrics(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !SongRepo::new(&state.pool).can_edit(id, user.id).await? {
        return Err(ApiError::forbidden("Not authorized to edit this song"));
    }
    LyricRepo::new(&state.pool).reorder(id, &req.lyric_order).await?;
    Ok(MessageResponse::new("Lyrics reordered successfully"))
}

// ---- lyrics ----

/// True when the user wrote the lyric or can edit the song it belongs to.
async fn can_modify(songs: &SongRepo<'_>, lyric: &Lyric, user_id: i64) -> Result<bool, ApiError> {
    if lyric.user_id == user_id {
        return Ok(true);
    }
    match lyric.song_id {
        Some(song_id) => Ok(songs.can_edit(song_id, user_id).await?),
        None => Ok(false),
    }
}

/// GET /api/lyrics/standalone
async fn standalone_lyrics(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<LyricsResponse>, ApiError> {
    let lyrics = LyricRepo::new(&state.pool).standalone(user.id).await?;
    Ok(Json(LyricsResponse { lyrics }))
}

/// GET /api/lyrics/{id}
async fn get_lyric(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<LyricResponse<LyricWithAuthor>>, ApiError> {
    let lyric = LyricRepo::new(&state.pool)
        .get_with_author(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lyric not found"))?;

    if lyric.lyric.user_id != user.id {
        let visible = match lyric.lyric.song_id {
            Some(song_id) => SongRepo::new(&state.pool).role(song_id, user.id).await?.is_some(),
            None => false,
        };
        if !visible {
            return Err(ApiError::forbidden("Not authorized to view this lyric"));
        }
    }

    Ok(Json(LyricResponse { lyric }))
}

/// POST /api/lyrics
async fn create_lyric(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateLyricRequest>,
) -> Result<(StatusCode, Json<LyricResponse<Lyric>>), ApiError> {
    let content = require_text("Content", req.content.as_deref())?;

    if let Some(song_id) = req.song_id {
        if !SongRepo::new(&state.pool).can_edit(song_id, user.id).await? {
            return Err(ApiError::forbidden("Not authorized to add lyrics to this song"));
        }
    }

    let input = LyricInput {
        song_id: req.song_id,
        title: blank_to_none(req.title),
        content,
        section_type: blank_to_none(req.section_type)
            .unwrap_or_else(|| DEFAULT_SECTION_TYPE.to_string()),
        section_order: req.section_order,
        mood: blank_to_none(req.mood),
        notes: blank_to_none(req.notes),
        status: blank_to_none(req.status).unwrap_or_else(|| DEFAULT_LYRIC_STATUS.to_string()),
    };
    let lyric = LyricRepo::new(&state.pool).create(user.id, &input).await?;

    Ok((StatusCode::CREATED, Json(LyricResponse { lyric })))
}

/// PUT /api/lyrics/{id}
async fn update_lyric(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateLyricRequest>,
) -> Result<Json<LyricResponse<Lyric>>, ApiError> {
    let lyrics = LyricRepo::new(&state.pool);
    let songs = SongRepo::new(&state.pool);

    let existing = lyrics
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lyric not found"))?;

    if !can_modify(&songs, &existing, user.id).await? {
        return Err(ApiError::forbidden("Not authorized to edit this lyric"));
    }

    if let Some(Some(target)) = req.song_id {
        if existing.song_id != Some(target) && !songs.can_edit(target, user.id).await? {
            return Err(ApiError::forbidden("Not authorized to add lyrics to that song"));
        }
    }

    let content = require_text("Content", req.content.as_deref())?;
    let input = LyricInput {
        song_id: req.song_id.unwrap_or(existing.song_id),
        title: blank_to_none(req.title),
        content,
        section_type: blank_to_none(req.section_type)
            .unwrap_or_else(|| DEFAULT_SECTION_TYPE.to_string()),
        section_order: req.section_order.unwrap_or(existing.section_order),
        mood: blank_to_none(req.mood),
        notes: blank_to_none(req.notes),
        status: blank_to_none(req.status).unwrap_or_else(|| DEFAULT_LYRIC_STATUS.to_string()),
    };
    let lyric = lyrics.update(id, &input).await?;

    Ok(Json(LyricResponse { lyric }))
}

/// DELETE /api/lyrics/{id}
async fn delete_lyric(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let lyrics = LyricRepo::new(&state.pool);
    let existing = lyrics
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Lyric not found"))?;

    if !can_modify(&SongRepo::new(&state.pool), &existing, user.id).await? {
        return Err(ApiError::forbidden("Not authorized to delete this lyric"));
    }

    lyrics.delete(id).await?;
    Ok(MessageResponse::new("Lyric deleted successfully"))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/songs", get(list_songs).post(create_song))
        .route("/songs/{id}", get(get_song).put(update_song).delete(delete_song))
        .route("/songs/{id}/collaborators", post(add_collaborator))
        .route("/songs/{id}/collaborators/{user_id}", delete(remove_collaborator))
        .route("/songs/{id}/reorder", put(reorder_lyrics))
        .route("/standalone", get(standalone_lyrics))
        .route("/", post(create_lyric))
        .route("/{id}", get(get_lyric).put(update_lyric).delete(delete_lyric))
}
