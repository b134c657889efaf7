//! Home page endpoints.

use axum::{
    extract::State,
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use afrikmarket_common::AppResult;
use afrikmarket_core::CreateTestimonialInput;
use afrikmarket_db::entities::testimonial;

use crate::{
    endpoints::ads::AdResponse,
    flash::{self, FlashMessage, FlashRedirect},
    middleware::AppState,
    response::ApiResponse,
};

/// Recent ads shown on the home page.
const RECENT_ADS: u64 = 4;

/// Testimonials shown on the home page.
const RECENT_TESTIMONIALS: u64 = 6;

/// Testimonial response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialResponse {
    pub id: String,
    pub name: String,
    pub message: String,
    pub rating: i16,
    pub created_at: String,
}

impl From<testimonial::Model> for TestimonialResponse {
    fn from(t: testimonial::Model) -> Self {
        Self {
            id: t.id,
            name: t.name,
            message: t.message,
            rating: t.rating,
            created_at: t.created_at.to_rfc3339(),
        }
    }
}

/// Home page response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub recent_ads: Vec<AdResponse>,
    pub testimonials: Vec<TestimonialResponse>,
    pub flash: Option<FlashMessage>,
}

/// Home page: recent approved ads plus testimonials.
async fn home(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<HomeResponse>)> {
    let (flash, jar) = flash::take(jar);

    let recent_ads = state.ad_service.recent_approved(RECENT_ADS).await?;
    let testimonials = state
        .testimonial_service
        .recent(RECENT_TESTIMONIALS)
        .await?;

    Ok((
        jar,
        ApiResponse::ok(HomeResponse {
            recent_ads: recent_ads.into_iter().map(Into::into).collect(),
            testimonials: testimonials.into_iter().map(Into::into).collect(),
            flash,
        }),
    ))
}

/// Testimonial form body.
#[derive(Debug, Deserialize)]
pub struct TestimonialForm {
    pub name: String,
    pub message: String,
    pub rating: i16,
}

/// Submit a testimonial.
async fn submit_testimonial(
    State(state): State<AppState>,
    Form(form): Form<TestimonialForm>,
) -> FlashRedirect {
    let input = CreateTestimonialInput {
        name: form.name,
        message: form.message,
        rating: form.rating,
    };

    match state.testimonial_service.create(input).await {
        Ok(_) => FlashRedirect::success("/", "Merci pour votre témoignage !"),
        Err(err) => FlashRedirect::from_error(&err, "/"),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/testimonials", post(submit_testimonial))
}
