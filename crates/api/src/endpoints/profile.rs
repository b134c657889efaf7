//! Profile endpoints: own profile and public user pages.

use axum::{
    extract::{Multipart, Path, State},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use afrikmarket_common::AppResult;
use afrikmarket_core::UpdateProfileInput;
use afrikmarket_db::entities::user;

use crate::{
    endpoints::ads::{read_multipart_form, AdResponse},
    extractors::{AuthUser, MaybeAuthUser},
    flash::{self, FlashMessage, FlashRedirect},
    middleware::AppState,
    response::ApiResponse,
};

/// User response; the password hash never leaves the service layer.
#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: format!("{:?}", user.role).to_lowercase(),
            avatar_url: user.avatar_url,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Own profile: the user plus their ads grouped by status.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub approved_ads: Vec<AdResponse>,
    pub pending_ads: Vec<AdResponse>,
    pub rejected_ads: Vec<AdResponse>,
    pub flash: Option<FlashMessage>,
}

/// Own profile view.
async fn profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<ProfileResponse>)> {
    let (flash, jar) = flash::take(jar);

    let ads = state.ad_service.ads_for_author(&user.id).await?;

    Ok((
        jar,
        ApiResponse::ok(ProfileResponse {
            user: user.into(),
            approved_ads: ads.approved.into_iter().map(Into::into).collect(),
            pending_ads: ads.pending.into_iter().map(Into::into).collect(),
            rejected_ads: ads.rejected.into_iter().map(Into::into).collect(),
            flash,
        }),
    ))
}

/// Update the own profile (username, email, optional avatar).
async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> FlashRedirect {
    let (fields, mut images) = match read_multipart_form(multipart).await {
        Ok(parsed) => parsed,
        Err(err) => return FlashRedirect::from_error(&err, "/profile"),
    };

    let input = UpdateProfileInput {
        username: fields.get("username").cloned().unwrap_or_default(),
        email: fields.get("email").cloned().unwrap_or_default(),
    };

    // At most one avatar; extra files are ignored
    let avatar = if images.is_empty() {
        None
    } else {
        Some(images.remove(0))
    };

    match state.user_service.update_profile(&user.id, input, avatar).await {
        Ok(_) => FlashRedirect::success("/profile", "Profil mis à jour avec succès !"),
        Err(err) => FlashRedirect::from_error(&err, "/profile"),
    }
}

/// Public profile: basic user info plus approved ads only.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileResponse {
    pub user: UserResponse,
    pub approved_ads: Vec<AdResponse>,
}

/// Public profile view. Viewing yourself redirects to the own profile.
async fn public_profile(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<PublicProfileResponse>, FlashRedirect> {
    if viewer.as_ref().is_some_and(|u| u.id == id) {
        return Err(FlashRedirect::to("/profile"));
    }

    let user = match state.user_service.get(&id).await {
        Ok(user) => user,
        Err(err) => return Err(FlashRedirect::from_error(&err, "/")),
    };

    let ads = match state.ad_service.approved_ads_for_author(&user.id).await {
        Ok(ads) => ads,
        Err(err) => return Err(FlashRedirect::from_error(&err, "/")),
    };

    Ok(ApiResponse::ok(PublicProfileResponse {
        user: user.into(),
        approved_ads: ads.into_iter().map(Into::into).collect(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile).put(update_profile))
        .route("/users/{id}", get(public_profile))
}
