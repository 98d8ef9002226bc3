//! Sliding session refresh
//!
//! Any request carrying a valid token gets a new 48h token in both the
//! `jwtToken` cookie and the `X-New-Token` header. Invalid or expired
//! tokens pass through untouched; the route decides what to do.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, SameSite};

use super::extract::{session_token, SESSION_COOKIE};
use crate::config::AppConfig;
use crate::http::server::AppState;

/// Response header carrying the refreshed token for non-browser clients
pub const NEW_TOKEN_HEADER: &str = "x-new-token";

/// Session cookie for `token`, readable by the frontend.
pub fn session_cookie(config: &AppConfig, token: String, ttl_secs: i64) -> Cookie<'static> {
    let mut builder = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .max_age(time::Duration::seconds(ttl_secs))
        .http_only(false)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies());

    if let Some(domain) = config.session_cookie_domain() {
        builder = builder.domain(domain.to_owned());
    }

    builder.build()
}

/// Middleware: refresh the caller's session token.
pub async fn refresh_session(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let refreshed = session_token(request.headers())
        .and_then(|token| state.tokens.verify(&token).ok())
        .and_then(|claims| match state.tokens.issue(&claims.username) {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!(error = %e, "failed to refresh session token");
                None
            }
        });

    let mut response = next.run(request).await;

    if let Some(token) = refreshed {
        let cookie = session_cookie(&state.config, token.clone(), state.tokens.ttl_secs());
        let headers = response.headers_mut();
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "session cookie is not a valid header"),
        }
        if let Ok(value) = HeaderValue::from_str(&token) {
            headers.insert(NEW_TOKEN_HEADER, value);
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_cookie_attributes() {
        let mut config = AppConfig::new("k");
        config.public_origin = "http://localhost:5173".into();
        let cookie = session_cookie(&config, "tok".into(), 172_800).to_string();

        assert!(cookie.starts_with("jwtToken=tok"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=172800"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));
        assert!(!cookie.contains("Domain"));
    }

    #[test]
    fn production_cookie_attributes() {
        let mut config = AppConfig::new("k");
        config.production = true;
        config.cookie_domain = Some(".prosaurus.com".into());
        let cookie = session_cookie(&config, "tok".into(), 60).to_string();

        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Domain=prosaurus.com") || cookie.contains("Domain=.prosaurus.com"));
    }
}
