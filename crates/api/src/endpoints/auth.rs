//! Authentication endpoints.

use axum::{
    extract::State,
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};

use afrikmarket_common::AppError;
use afrikmarket_core::RegisterInput;

use crate::{
    flash::{self, FlashMessage, FlashRedirect},
    middleware::{AppState, SESSION_COOKIE},
    response::ApiResponse,
};

/// Context for the registration and login forms.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthFormContext {
    pub flash: Option<FlashMessage>,
}

/// Registration form context.
async fn register_form(jar: CookieJar) -> (CookieJar, ApiResponse<AuthFormContext>) {
    let (flash, jar) = flash::take(jar);
    (jar, ApiResponse::ok(AuthFormContext { flash }))
}

/// Registration form body.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> FlashRedirect {
    let input = RegisterInput {
        username: form.username,
        email: form.email,
        password: form.password,
    };

    match state.user_service.register(input).await {
        Ok(_) => FlashRedirect::success(
            "/auth/login",
            "Vous êtes maintenant inscrit et pouvez vous connecter.",
        ),
        Err(err) => FlashRedirect::from_error(&err, "/auth/register"),
    }
}

/// Login form context.
async fn login_form(jar: CookieJar) -> (CookieJar, ApiResponse<AuthFormContext>) {
    let (flash, jar) = flash::take(jar);
    (jar, ApiResponse::ok(AuthFormContext { flash }))
}

/// Login form body.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Log in: verify credentials, open a session, set the signed cookie.
async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(SignedCookieJar, FlashRedirect), FlashRedirect> {
    let user = match state
        .user_service
        .authenticate(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        // Unknown email and wrong password share one message
        Err(AppError::Unauthorized) => {
            return Err(FlashRedirect::error(
                "/auth/login",
                "E-mail ou mot de passe invalide.",
            ));
        }
        Err(err) => return Err(FlashRedirect::from_error(&err, "/auth/login")),
    };

    let session = match state.session_service.create(&user.id).await {
        Ok(session) => session,
        Err(err) => return Err(FlashRedirect::from_error(&err, "/auth/login")),
    };

    let cookie = Cookie::build((SESSION_COOKIE, session.id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        FlashRedirect::success("/", "Connexion réussie !"),
    ))
}

/// Log out: destroy the server-side session and clear the cookie.
async fn logout(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, FlashRedirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE)
        && let Err(e) = state.session_service.destroy(cookie.value()).await
    {
        tracing::warn!(error = %e, "Failed to destroy session");
    }

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    (jar, FlashRedirect::to("/auth/login"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", post(logout))
}
