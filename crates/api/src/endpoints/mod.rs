//! API endpoints.

pub mod admin;
pub mod ads;
pub mod auth;
pub mod blog;
pub mod home;
pub mod notifications;
pub mod profile;
pub mod sitemap;

use axum::Router;

use crate::middleware::AppState;

/// Build the full application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(home::router())
        .merge(profile::router())
        .merge(sitemap::router())
        .nest("/auth", auth::router())
        .nest("/ads", ads::router())
        .nest("/blog", blog::router())
        .nest("/notifications", notifications::router())
        .nest("/admin", admin::router())
}
