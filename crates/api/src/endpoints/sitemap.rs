//! Sitemap endpoint.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::compression::CompressionLayer;

use afrikmarket_common::AppResult;

use crate::middleware::AppState;

/// `GET /sitemap.xml` — served gzip-compressed via the route's
/// compression layer; the XML itself comes from the service cache.
async fn sitemap(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let xml = state.sitemap_service.xml().await?;
    Ok(([(header::CONTENT_TYPE, "application/xml")], xml))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sitemap.xml", get(sitemap))
        .layer(CompressionLayer::new())
}
