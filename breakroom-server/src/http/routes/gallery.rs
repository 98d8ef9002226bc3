//! Gallery endpoints - `/api/gallery`
//!
//! Public pages are readable without a session; everything else manages
//! the caller's own gallery.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::auth::AuthUser;
use crate::db::repos::gallery::default_gallery_name;
use crate::db::repos::{Artwork, GalleryRepo, GallerySettings, PublicArtwork};
use crate::http::error::ApiError;
use crate::http::extract::Path;
use crate::http::server::AppState;
use crate::models::{blank_to_none, require_text, ArtworkImage, GalleryUrl};

/// Largest accepted artwork file
pub const MAX_ARTWORK_BYTES: usize = 10 * 1024 * 1024;

/// Room for the other form fields around the file
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Serialize)]
pub struct Artist {
    pub handle: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo_path: Option<String>,
    pub bio: Option<String>,
}

#[derive(Serialize)]
pub struct PublicGallery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub gallery_url: String,
    pub gallery_name: String,
    pub artist: Artist,
}

#[derive(Serialize)]
pub struct PublicGalleryResponse {
    pub gallery: PublicGallery,
    pub artworks: Vec<PublicArtwork>,
}

#[derive(Serialize)]
pub struct PublicArtworkResponse {
    pub artwork: PublicArtwork,
    pub gallery: PublicGallery,
}

#[derive(Serialize)]
pub struct SettingsResponse {
    pub settings: Option<GallerySettings>,
}

#[derive(Deserialize)]
pub struct SettingsRequest {
    pub gallery_url: Option<String>,
    pub gallery_name: Option<String>,
}

#[derive(Serialize)]
pub struct UrlCheckResponse {
    pub available: bool,
    #[serde(rename = "isOwn", skip_serializing_if = "Option::is_none")]
    pub is_own: Option<bool>,
}

#[derive(Serialize)]
pub struct ArtworksResponse {
    pub artworks: Vec<Artwork>,
}

#[derive(Serialize)]
pub struct ArtworkResponse {
    pub artwork: Artwork,
}

#[derive(Deserialize)]
pub struct UpdateArtworkRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "isPublished", default)]
    pub is_published: bool,
}

// ---- public ----

/// GET /api/gallery/public/{gallery_url}
async fn public_gallery(
    State(state): State<Arc<AppState>>,
    Path(gallery_url): Path<String>,
) -> Result<Json<PublicGalleryResponse>, ApiError> {
    let repo = GalleryRepo::new(&state.pool);
    let row = repo
        .public_gallery(&gallery_url)
        .await?
        .ok_or_else(|| ApiError::not_found("Gallery not found"))?;
    let artworks = repo.published_artworks(row.user_id).await?;

    Ok(Json(PublicGalleryResponse {
        gallery: PublicGallery {
            id: Some(row.id),
            gallery_url: row.gallery_url,
            gallery_name: row.gallery_name,
            artist: Artist {
                handle: row.handle,
                first_name: row.first_name,
                last_name: row.last_name,
                photo_path: row.photo_path,
                bio: row.bio,
            },
        },
        artworks,
    }))
}

/// GET /api/gallery/public/{gallery_url}/{artwork_id}
async fn public_artwork(
    State(state): State<Arc<AppState>>,
    Path((gallery_url, artwork_id)): Path<(String, i64)>,
) -> Result<Json<PublicArtworkResponse>, ApiError> {
    let row = GalleryRepo::new(&state.pool)
        .public_artwork(&gallery_url, artwork_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Artwork not found"))?;

    Ok(Json(PublicArtworkResponse {
        artwork: row.artwork,
        gallery: PublicGallery {
            id: None,
            gallery_url: row.gallery_url,
            gallery_name: row.gallery_name,
            artist: Artist {
                handle: row.handle,
                first_name: row.first_name,
                last_name: row.last_name,
                photo_path: row.photo_path,
                bio: row.bio,
            },
        },
    }))
}

// ---- settings ----

/// GET /api/gallery/settings
async fn get_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<SettingsResponse>, ApiError> {
    let settings = GalleryRepo::new(&state.pool).settings(user.id).await?;
    Ok(Json(SettingsResponse { settings }))
}

/// POST /api/gallery/settings
async fn create_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<SettingsRequest>,
) -> Result<(StatusCode, Json<SettingsResponse>), ApiError> {
    let repo = GalleryRepo::new(&state.pool);
    if repo.settings(user.id).await?.is_some() {
        return Err(ApiError::bad_request(
            "Gallery settings already exist. Use PUT to update.",
        ));
    }

    let url = match blank_to_none(req.gallery_url) {
        Some(url) => GalleryUrl::new(&url)?,
        None => GalleryUrl::new(&user.handle)?,
    };
    let name = blank_to_none(req.gallery_name).unwrap_or_else(|| default_gallery_name(&user.handle));

    let settings = repo.create_settings(user.id, &url, &name).await?;
    tracing::info!(user_id = user.id, gallery_url = url.as_str(), "gallery created");

    Ok((
        StatusCode::CREATED,
        Json(SettingsResponse {
            settings: Some(settings),
        }),
    ))
}

/// PUT /api/gallery/settings
async fn update_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let url = GalleryUrl::new(req.gallery_url.as_deref().unwrap_or_default())?;
    let repo = GalleryRepo::new(&state.pool);

    if let Some(owner) = repo.url_owner(url.as_str()).await? {
        if owner != user.id {
            return Err(ApiError::bad_request(crate::db::repos::gallery::URL_TAKEN));
        }
    }

    let name = blank_to_none(req.gallery_name).unwrap_or_else(|| default_gallery_name(&user.handle));
    let settings = repo
        .update_settings(user.id, &url, &name)
        .await?
        .ok_or_else(|| ApiError::not_found("Gallery settings not found"))?;

    Ok(Json(SettingsResponse {
        settings: Some(settings),
    }))
}

/// GET /api/gallery/check-url/{gallery_url}
async fn check_url(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(gallery_url): Path<String>,
) -> Result<Json<UrlCheckResponse>, ApiError> {
    let owner = GalleryRepo::new(&state.pool).url_owner(gallery_url.trim()).await?;
    let response = match owner {
        None => UrlCheckResponse {
            available: true,
            is_own: None,
        },
        Some(id) if id == user.id => UrlCheckResponse {
            available: true,
            is_own: Some(true),
        },
        Some(_) => UrlCheckResponse {
            available: false,
            is_own: None,
        },
    };
    Ok(Json(response))
}

// ---- artworks ----

/// GET /api/gallery/artworks
async fn list_artworks(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ArtworksResponse>, ApiError> {
    let artworks = GalleryRepo::new(&state.pool).list_artworks(user.id).await?;
    Ok(Json(ArtworksResponse { artworks }))
}

/// GET /api/gallery/artworks/{id}
async fn get_artwork(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ArtworkResponse>, ApiError> {
    let artwork = GalleryRepo::new(&state.pool)
        .get_artwork(user.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Artwork not found"))?;
    Ok(Json(ArtworkResponse { artwork }))
}

/// Parsed `multipart/form-data` artwork upload
#[derive(Debug, Default)]
struct ArtworkForm {
    image: Option<(ArtworkImage, Vec<u8>)>,
    title: Option<String>,
    description: Option<String>,
    is_published: bool,
}

async fn read_artwork_form(mut multipart: Multipart) -> Result<ArtworkForm, ApiError> {
    let mut form = ArtworkForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let image = ArtworkImage::check(&file_name, &content_type)?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                if bytes.len() > MAX_ARTWORK_BYTES {
                    return Err(ApiError::bad_request("Image must be 10MB or smaller"));
                }
                form.image = Some((image, bytes.to_vec()));
            }
            "title" | "description" | "isPublished" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                match name.as_str() {
                    "title" => form.title = Some(text),
                    "description" => form.description = Some(text),
                    _ => form.is_published = text.trim() == "true",
                }
            }
            other => tracing::debug!(field = other, "ignoring unknown artwork form field"),
        }
    }

    Ok(form)
}

/// POST /api/gallery/artworks (multipart: image, title, description, isPublished)
async fn create_artwork(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ArtworkResponse>), ApiError> {
    let form = read_artwork_form(multipart).await?;
    let (image, bytes) = form
        .image
        .ok_or_else(|| ApiError::bad_request("Image file is required"))?;
    let title = require_text("Title", form.title.as_deref())?;
    let description = blank_to_none(form.description);

    let repo = GalleryRepo::new(&state.pool);
    repo.ensure_settings(user.id, &user.handle).await?;

    let key = image.storage_key(user.id, Utc::now().timestamp_millis());
    state.storage.put(&key, bytes, &image.content_type).await?;

    let artwork = repo
        .create_artwork(user.id, &title, description.as_deref(), &key, form.is_published)
        .await?;
    tracing::info!(user_id = user.id, artwork_id = artwork.id, key = %key, "artwork uploaded");

    Ok((StatusCode::CREATED, Json(ArtworkResponse { artwork })))
}

/// PUT /api/gallery/artworks/{id}
async fn update_artwork(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateArtworkRequest>,
) -> Result<Json<ArtworkResponse>, ApiError> {
    let repo = GalleryRepo::new(&state.pool);
    if repo.get_artwork(user.id, id).await?.is_none() {
        return Err(ApiError::not_found("Artwork not found"));
    }

    let title = require_text("Title", req.title.as_deref())?;
    let description = blank_to_none(req.description);
    let artwork = repo
        .update_artwork(user.id, id, &title, description.as_deref(), req.is_published)
        .await?
        .ok_or_else(|| ApiError::not_found("Artwork not found"))?;

    Ok(Json(ArtworkResponse { artwork }))
}

/// DELETE /api/gallery/artworks/{id}
async fn delete_artwork(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let key = GalleryRepo::new(&state.pool)
        .delete_artwork(user.id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Artwork not found"))?;

    if !key.is_empty() {
        if let Err(e) = state.storage.delete(&key).await {
            tracing::warn!(error = %e, key = %key, "failed to delete artwork object");
        }
    }

    Ok(MessageResponse::new("Artwork deleted successfully"))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/public/{gallery_url}", get(public_gallery))
        .route("/public/{gallery_url}/{artwork_id}", get(public_artwork))
        .route(
            "/settings",
            get(get_settings).post(create_settings).put(update_settings),
        )
        .route("/check-url/{gallery_url}", get(check_url))
        .route(
            "/artworks",
            get(list_artworks)
                .post(create_artwork)
                .layer(DefaultBodyLimit::max(MAX_ARTWORK_BYTES + FORM_OVERHEAD_BYTES)),
        )
        .route(
            "/artworks/{id}",
            get(get_artwork).put(update_artwork).delete(delete_artwork),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_check_serialization() {
        let own = UrlCheckResponse {
            available: true,
            is_own: Some(true),
        };
        assert_eq!(
            serde_json::to_value(&own).unwrap(),
            serde_json::json!({"available": true, "isOwn": true})
        );

        let free = UrlCheckResponse {
            available: true,
            is_own: None,
        };
        assert_eq!(serde_json::to_value(&free).unwrap(), serde_json::json!({"available": true}));
    }

    #[test]
    fn update_request_defaults_to_unpublished() {
        let req: UpdateArtworkRequest = serde_json::from_str(r#"{"title": "Dusk"}"#).unwrap();
        assert!(!req.is_published);

        let req: UpdateArtworkRequest =
            serde_json::from_str(r#"{"title": "Dusk", "isPublished": true}"#).unwrap();
        assert!(req.is_published);
    }
}
