//! One-shot flash messages.
//!
//! A flash is a single user-facing notice shown on the next rendered page
//! after a redirect. It travels in a short-lived cookie set by the
//! redirect response and removed by the first read that consumes it — the
//! message is part of the handler's result, never shared session state.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use afrikmarket_common::AppError;

/// Name of the flash cookie.
pub const FLASH_COOKIE: &str = "market_flash";

/// Flash severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// A one-shot user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

/// A redirect carrying an optional flash message.
#[derive(Debug)]
pub struct FlashRedirect {
    location: String,
    flash: Option<FlashMessage>,
}

impl FlashRedirect {
    /// Redirect without a message.
    #[must_use]
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            flash: None,
        }
    }

    /// Redirect with a success message.
    #[must_use]
    pub fn success(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            flash: Some(FlashMessage {
                level: FlashLevel::Success,
                message: message.into(),
            }),
        }
    }

    /// Redirect with an error message.
    #[must_use]
    pub fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            flash: Some(FlashMessage {
                level: FlashLevel::Error,
                message: message.into(),
            }),
        }
    }

    /// Turn a service error into an error flash at the fallback location.
    #[must_use]
    pub fn from_error(err: &AppError, fallback: impl Into<String>) -> Self {
        // Server-side causes still get logged with full detail
        if err.is_server_error() {
            tracing::error!(error = %err, "Request failed, redirecting with flash");
        }
        Self::error(fallback, err.user_message())
    }
}

impl IntoResponse for FlashRedirect {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, self.location.clone())],
        )
            .into_response();

        if let Some(flash) = self.flash {
            let cookie = build_cookie(&flash);
            if let Ok(value) = cookie.to_string().parse() {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }

        response
    }
}

fn build_cookie(flash: &FlashMessage) -> Cookie<'static> {
    let level = match flash.level {
        FlashLevel::Success => "success",
        FlashLevel::Error => "error",
    };
    let value = format!("{}|{}", level, urlencoding::encode(&flash.message));

    // No Max-Age: the consuming read removes it, and an unread flash dies
    // with the browser session.
    Cookie::build((FLASH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Consume the pending flash, if any.
///
/// Returns the message and a jar with the cookie removed; handlers that
/// surface the flash must return the jar so the removal reaches the client.
#[must_use]
pub fn take(jar: CookieJar) -> (Option<FlashMessage>, CookieJar) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (None, jar);
    };

    let flash = parse_cookie_value(cookie.value());
    let jar = jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/").build());
    (flash, jar)
}

fn parse_cookie_value(value: &str) -> Option<FlashMessage> {
    let (level, encoded) = value.split_once('|')?;
    let level = match level {
        "success" => FlashLevel::Success,
        "error" => FlashLevel::Error,
        _ => return None,
    };
    let message = urlencoding::decode(encoded).ok()?.into_owned();
    Some(FlashMessage { level, message })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_sets_location_and_cookie() {
        let response =
            FlashRedirect::success("/ads", "Annonce créée avec succès !").into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/ads");

        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("market_flash=success|"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn test_plain_redirect_has_no_cookie() {
        let response = FlashRedirect::to("/").into_response();
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn test_cookie_value_roundtrip() {
        let flash = FlashMessage {
            level: FlashLevel::Error,
            message: "E-mail ou mot de passe invalide.".to_string(),
        };
        let cookie = build_cookie(&flash);
        let parsed = parse_cookie_value(cookie.value()).unwrap();
        assert_eq!(parsed, flash);
    }

    #[test]
    fn test_from_error_uses_user_message() {
        let err = AppError::Database("connection refused at 10.0.0.3".to_string());
        let redirect = FlashRedirect::from_error(&err, "/ads");
        let flash = redirect.flash.unwrap();
        assert_eq!(flash.level, FlashLevel::Error);
        assert!(!flash.message.contains("10.0.0.3"));
    }
}
