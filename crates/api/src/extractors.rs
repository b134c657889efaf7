//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use afrikmarket_db::entities::user;

use crate::flash::FlashRedirect;

/// Authenticated user extractor.
///
/// Rejection is a login redirect with a flash, not a bare 401: every
/// gated route in the form flow lands on the login page.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = FlashRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get user from request extensions (set by session middleware)
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                FlashRedirect::error(
                    "/auth/login",
                    "Vous devez être connecté pour accéder à cette page.",
                )
            })
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// Admin extractor: authenticated AND role admin.
///
/// Non-admins are sent home, matching the admin-area gate of the site.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = FlashRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if user.is_admin() {
            Ok(Self(user))
        } else {
            Err(FlashRedirect::error(
                "/",
                "Accès non autorisé. Cette section est réservée aux administrateurs.",
            ))
        }
    }
}
