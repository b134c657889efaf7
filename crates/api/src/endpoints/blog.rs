//! Public blog endpoints.

use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use serde::Serialize;

use afrikmarket_common::AppResult;
use afrikmarket_db::entities::blog_post;

use crate::{middleware::AppState, response::ApiResponse};

/// Blog post response.
#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author_id: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<blog_post::Model> for BlogPostResponse {
    fn from(post: blog_post::Model) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            author_id: post.author_id,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// All blog posts, newest first.
async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<BlogPostResponse>>> {
    let posts = state.blog_service.list().await?;
    Ok(ApiResponse::ok(posts.into_iter().map(Into::into).collect()))
}

/// A single blog post.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<BlogPostResponse>> {
    let post = state.blog_service.get(&id).await?;
    Ok(ApiResponse::ok(post.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(show))
}
