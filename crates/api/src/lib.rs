//! HTTP API layer for afrikmarket-rs.
//!
//! This crate provides the marketplace's HTTP surface:
//!
//! - **Endpoints**: public browsing, auth, listings, profile, blog, admin
//! - **Extractors**: session-backed authentication and admin gating
//! - **Middleware**: session loading, `_method` override for HTML forms
//! - **Flash**: one-shot messages carried alongside redirects
//!
//! Built on Axum 0.8 with Tower middleware stack. Reads return JSON data
//! for the external template layer; writes redirect with a flash message.

pub mod endpoints;
pub mod extractors;
pub mod flash;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use flash::{FlashLevel, FlashMessage, FlashRedirect};
pub use middleware::{AppState, SESSION_COOKIE};
