//! Link preview pages for blogs and the privacy policy

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::db::repos::{BlogRepo, DbError};
use crate::http::server::AppState;
use crate::og::{self, OgPage};

async fn render(state: &AppState, page: Result<Option<OgPage>, DbError>) -> Html<String> {
    let html = og::index_html(&state.config.dist_dir).await;
    match page {
        Ok(Some(page)) => Html(page.inject(&html)),
        Ok(None) => Html(html),
        Err(e) => {
            tracing::error!("Error generating OG tags: {}", e);
            Html(html)
        }
    }
}

async fn blog_page(
    state: &AppState,
    blog_url: &str,
    post_id: Option<i64>,
) -> Result<Option<OgPage>, DbError> {
    let repo = BlogRepo::new(&state.pool);
    let Some(blog) = repo.find_blog(blog_url).await? else {
        return Ok(None);
    };
    let base = &state.config.public_origin;

    match post_id {
        None => Ok(Some(og::blog_landing(base, &blog))),
        Some(id) => Ok(repo
            .published_post(id, blog.user_id)
            .await?
            .map(|post| og::blog_post(base, &blog, &post))),
    }
}

/// GET /b/{blog_url}
async fn blog_landing(
    State(state): State<Arc<AppState>>,
    Path(blog_url): Path<String>,
) -> Html<String> {
    let page = blog_page(&state, &blog_url, None).await;
    render(&state, page).await
}

/// GET /b/{blog_url}/{post_id}
async fn blog_post(
    State(state): State<Arc<AppState>>,
    Path((blog_url, post_id)): Path<(String, String)>,
) -> Html<String> {
    // Non-numeric ids are left for the SPA to resolve
    let page = match post_id.parse::<i64>() {
        Ok(id) => blog_page(&state, &blog_url, Some(id)).await,
        Err(_) => Ok(None),
    };
    render(&state, page).await
}

/// GET /blog/view/{id}
async fn post_view(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Html<String> {
    let page = match id.parse::<i64>() {
        Ok(id) => BlogRepo::new(&state.pool)
            .published_post_with_author(id)
            .await
            .map(|post| post.map(|p| og::post_view(&state.config.public_origin, &p))),
        Err(_) => Ok(None),
    };
    render(&state, page).await
}

/// GET /privacy
async fn privacy(State(state): State<Arc<AppState>>) -> Html<String> {
    let page = og::privacy(&state.config.public_origin);
    render(&state, Ok(Some(page))).await
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/b/{blog_url}", get(blog_landing))
        .route("/b/{blog_url}/{post_id}", get(blog_post))
        .route("/blog/view/{id}", get(post_view))
        .route("/privacy", get(privacy))
}
