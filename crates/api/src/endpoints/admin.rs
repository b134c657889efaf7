//! Admin endpoints: dashboard, moderation queue, user and blog management.

use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use afrikmarket_common::AppResult;
use afrikmarket_core::{CreateBlogPostInput, DashboardStats, UpdateBlogPostInput};
use afrikmarket_db::entities::ad::AdStatus;

use crate::{
    endpoints::{
        ads::{read_multipart_form, AdResponse},
        blog::BlogPostResponse,
        profile::UserResponse,
    },
    extractors::AdminUser,
    flash::{self, FlashMessage, FlashRedirect},
    middleware::AppState,
    response::ApiResponse,
};

/// Rows per admin listing page.
const ADMIN_PAGE_SIZE: u64 = 10;

/// Dashboard response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub flash: Option<FlashMessage>,
}

/// Dashboard: counts plus chart data.
async fn dashboard(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<DashboardResponse>)> {
    let (flash, jar) = flash::take(jar);
    let stats = state.stats_service.dashboard().await?;
    Ok((jar, ApiResponse::ok(DashboardResponse { stats, flash })))
}

/// Moderation queue request.
#[derive(Debug, Deserialize)]
pub struct AdsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
}

const fn default_page() -> u64 {
    1
}

/// Moderation queue response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAdsResponse {
    pub ads: Vec<AdResponse>,
    pub current_status: Option<String>,
    pub page: u64,
    pub total_pages: u64,
    pub flash: Option<FlashMessage>,
}

/// Ads for the moderation screen, optionally filtered by status.
async fn list_ads(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AdsQuery>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<AdminAdsResponse>)> {
    let (flash, jar) = flash::take(jar);

    let status = query.status.as_deref().and_then(parse_status);
    let page = state
        .ad_service
        .list_admin(status, query.page, ADMIN_PAGE_SIZE)
        .await?;

    Ok((
        jar,
        ApiResponse::ok(AdminAdsResponse {
            ads: page.items.into_iter().map(Into::into).collect(),
            current_status: query.status,
            page: page.page,
            total_pages: page.total_pages,
            flash,
        }),
    ))
}

/// Approve a pending ad.
async fn approve_ad(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> FlashRedirect {
    match state.moderation_service.approve(&id).await {
        Ok(_) => FlashRedirect::success(
            "/admin/ads?status=pending",
            "Annonce approuvée avec succès.",
        ),
        Err(err) => FlashRedirect::from_error(&err, "/admin/ads"),
    }
}

/// Reject a pending ad.
async fn reject_ad(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> FlashRedirect {
    match state.moderation_service.reject(&id).await {
        Ok(_) => FlashRedirect::success(
            "/admin/ads?status=pending",
            "Annonce rejetée avec succès.",
        ),
        Err(err) => FlashRedirect::from_error(&err, "/admin/ads"),
    }
}

/// User management request.
#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    #[serde(default = "default_page")]
    pub page: u64,
}

/// User management response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUsersResponse {
    pub users: Vec<UserResponse>,
    pub page: u64,
    pub total_pages: u64,
    pub flash: Option<FlashMessage>,
}

/// Users, newest first.
async fn list_users(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<UsersQuery>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<AdminUsersResponse>)> {
    let (flash, jar) = flash::take(jar);

    let (users, _total, total_pages) = state
        .user_service
        .list(query.page, ADMIN_PAGE_SIZE)
        .await?;

    Ok((
        jar,
        ApiResponse::ok(AdminUsersResponse {
            users: users.into_iter().map(Into::into).collect(),
            page: query.page,
            total_pages,
            flash,
        }),
    ))
}

/// Promote a user to admin.
async fn promote_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> FlashRedirect {
    match state.user_service.promote(&admin, &id).await {
        Ok(_) => FlashRedirect::success("/admin/users", "Utilisateur promu administrateur."),
        Err(err) => FlashRedirect::from_error(&err, "/admin/users"),
    }
}

/// Demote an admin back to a regular user.
async fn demote_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> FlashRedirect {
    match state.user_service.demote(&admin, &id).await {
        Ok(_) => FlashRedirect::success("/admin/users", "Administrateur rétrogradé utilisateur."),
        Err(err) => FlashRedirect::from_error(&err, "/admin/users"),
    }
}

/// Delete a user together with their ads.
async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> FlashRedirect {
    match state.user_service.delete(&admin, &id).await {
        Ok(()) => FlashRedirect::success("/admin/users", "Utilisateur et ses annonces supprimés."),
        Err(err) => FlashRedirect::from_error(&err, "/admin/users"),
    }
}

/// Blog management response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminBlogResponse {
    pub posts: Vec<BlogPostResponse>,
    pub flash: Option<FlashMessage>,
}

/// All blog posts for the management screen.
async fn list_blog(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<AdminBlogResponse>)> {
    let (flash, jar) = flash::take(jar);
    let posts = state.blog_service.list().await?;
    Ok((
        jar,
        ApiResponse::ok(AdminBlogResponse {
            posts: posts.into_iter().map(Into::into).collect(),
            flash,
        }),
    ))
}

/// Create a blog post from a multipart form (optional cover image).
async fn create_blog_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> FlashRedirect {
    let (fields, mut images) = match read_multipart_form(multipart).await {
        Ok(parsed) => parsed,
        Err(err) => return FlashRedirect::from_error(&err, "/admin/blog"),
    };

    let input = CreateBlogPostInput {
        title: fields.get("title").cloned().unwrap_or_default(),
        content: fields.get("content").cloned().unwrap_or_default(),
    };

    let cover = if images.is_empty() {
        None
    } else {
        Some(images.remove(0))
    };

    match state.blog_service.create(&admin, input, cover).await {
        Ok(_) => FlashRedirect::success("/admin/blog", "Article créé avec succès."),
        Err(err) => FlashRedirect::from_error(&err, "/admin/blog"),
    }
}

/// Edit form context for a blog post.
async fn edit_blog_form(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<BlogPostResponse>, FlashRedirect> {
    match state.blog_service.get(&id).await {
        Ok(post) => Ok(ApiResponse::ok(post.into())),
        Err(err) => Err(FlashRedirect::from_error(&err, "/admin/blog")),
    }
}

/// Update a blog post.
async fn update_blog_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> FlashRedirect {
    let (fields, mut images) = match read_multipart_form(multipart).await {
        Ok(parsed) => parsed,
        Err(err) => return FlashRedirect::from_error(&err, "/admin/blog"),
    };

    let input = UpdateBlogPostInput {
        title: fields.get("title").cloned().unwrap_or_default(),
        content: fields.get("content").cloned().unwrap_or_default(),
    };

    let cover = if images.is_empty() {
        None
    } else {
        Some(images.remove(0))
    };

    match state.blog_service.update(&id, &admin, input, cover).await {
        Ok(_) => FlashRedirect::success("/admin/blog", "Article mis à jour avec succès."),
        Err(err) => FlashRedirect::from_error(&err, format!("/admin/blog/{id}/edit")),
    }
}

/// Delete a blog post.
async fn delete_blog_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> FlashRedirect {
    match state.blog_service.delete(&id, &admin).await {
        Ok(()) => FlashRedirect::success("/admin/blog", "Article supprimé avec succès."),
        Err(err) => FlashRedirect::from_error(&err, "/admin/blog"),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/ads", get(list_ads))
        .route("/ads/{id}/approve", post(approve_ad))
        .route("/ads/{id}/reject", post(reject_ad))
        .route("/users", get(list_users))
        .route("/users/{id}/promote", post(promote_user))
        .route("/users/{id}/demote", post(demote_user))
        .route("/users/{id}", axum::routing::delete(delete_user))
        .route("/blog", get(list_blog).post(create_blog_post))
        .route(
            "/blog/{id}",
            axum::routing::put(update_blog_post).delete(delete_blog_post),
        )
        .route("/blog/{id}/edit", get(edit_blog_form))
}

fn parse_status(value: &str) -> Option<AdStatus> {
    match value {
        "pending" => Some(AdStatus::Pending),
        "approved" => Some(AdStatus::Approved),
        "rejected" => Some(AdStatus::Rejected),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("pending"), Some(AdStatus::Pending));
        assert_eq!(parse_status("approved"), Some(AdStatus::Approved));
        assert_eq!(parse_status("rejected"), Some(AdStatus::Rejected));
        assert_eq!(parse_status("everything"), None);
    }
}
