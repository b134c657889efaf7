//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Key, SignedCookieJar};
use afrikmarket_core::{
    AdService, BlogService, ModerationService, NotificationService, SessionService,
    SitemapService, StatsService, TestimonialService, UserService,
};

/// Name of the signed session cookie.
pub const SESSION_COOKIE: &str = "market_session";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub session_service: SessionService,
    pub ad_service: AdService,
    pub moderation_service: ModerationService,
    pub notification_service: NotificationService,
    pub blog_service: BlogService,
    pub testimonial_service: TestimonialService,
    pub stats_service: StatsService,
    pub sitemap_service: SitemapService,
    pub cookie_key: Key,
}

impl axum::extract::FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Session middleware.
///
/// Resolves the signed session cookie to its user and stores the model in
/// request extensions for the extractors. An invalid or expired session
/// simply leaves the request anonymous.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && let Ok(user) = state.session_service.authenticate(cookie.value()).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}

/// Method-override middleware.
///
/// HTML forms only speak GET and POST; state-changing PUT/DELETE routes
/// are reached by posting with a `_method` query parameter
/// (`POST /ads/42?_method=PUT`). Only POST may be overridden.
pub async fn method_override_middleware(mut req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::POST
        && let Some(query) = req.uri().query()
    {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key == "_method" {
                match value.to_ascii_lowercase().as_str() {
                    "put" => *req.method_mut() = Method::PUT,
                    "delete" => *req.method_mut() = Method::DELETE,
                    _ => {}
                }
                break;
            }
        }
    }

    next.run(req).await
}
