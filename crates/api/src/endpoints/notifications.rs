//! Notification endpoints.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    routing::{get, post},
    Router,
};
use serde::Serialize;

use afrikmarket_common::AppResult;
use afrikmarket_db::entities::notification;

use crate::{
    extractors::AuthUser,
    flash::FlashRedirect,
    middleware::AppState,
    response::ApiResponse,
};

/// How many notifications the inbox shows.
const INBOX_LIMIT: u64 = 50;

/// Notification response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            message: n.message,
            link: n.link,
            is_read: n.is_read,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// Inbox response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: u64,
}

/// The user's inbox, newest first.
async fn inbox(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<InboxResponse>> {
    let notifications = state
        .notification_service
        .list_for_user(&user.id, INBOX_LIMIT)
        .await?;
    let unread_count = state.notification_service.count_unread(&user.id).await?;

    Ok(ApiResponse::ok(InboxResponse {
        notifications: notifications.into_iter().map(Into::into).collect(),
        unread_count,
    }))
}

/// Mark all notifications as read, then bounce back where the user was.
async fn mark_all_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> FlashRedirect {
    let back = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("/")
        .to_string();

    match state.notification_service.mark_all_read(&user.id).await {
        Ok(_) => FlashRedirect::to(back),
        Err(err) => FlashRedirect::from_error(&err, back),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(inbox))
        .route("/mark-as-read", post(mark_all_read))
}
