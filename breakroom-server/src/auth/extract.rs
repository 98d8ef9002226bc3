//! Request extractors for authenticated users and test reporters

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;

use crate::db::repos::{User, UserRepo};
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Cookie carrying the web session token
pub const SESSION_COOKIE: &str = "jwtToken";

/// Header carrying the test reporter key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Session token from `Authorization: Bearer`, falling back to the cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_owned());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|t| !t.is_empty())
}

/// The user behind a valid session token
///
/// Rejects with 401 `Not authenticated`, `Invalid token`, or `User not found`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            session_token(&parts.headers).ok_or(ApiError::Unauthorized("Not authenticated"))?;

        let claims = state.tokens.verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "rejected session token");
            ApiError::Unauthorized("Invalid token")
        })?;

        let user = UserRepo::new(&state.pool)
            .find_by_handle(&claims.username)
            .await?
            .ok_or(ApiError::Unauthorized("User not found"))?;

        Ok(Self(user))
    }
}

/// Gate for test reporter endpoints
///
/// When a reporter key is configured, `x-api-key` must match it.
/// Without one the endpoints are open.
#[derive(Debug, Clone, Copy)]
pub struct ReporterKey;

impl FromRequestParts<Arc<AppState>> for ReporterKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.test_api_key.as_deref() else {
            return Ok(Self);
        };

        let given = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());

        if given == Some(expected) {
            Ok(Self)
        } else {
            Err(ApiError::Unauthorized("Invalid API key"))
        }
    }
}
