//! Ad endpoints.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use afrikmarket_common::{AppError, AppResult};
use afrikmarket_core::{CreateAdInput, ImageUpload, UpdateAdInput};
use afrikmarket_db::entities::ad::{self, Category};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    flash::{self, FlashMessage, FlashRedirect},
    middleware::AppState,
    response::ApiResponse,
};

/// Ads shown per public listing page.
const PUBLIC_PAGE_SIZE: u64 = 8;

/// Ad response.
#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub image_urls: Vec<String>,
    pub affiliate_link: Option<String>,
    pub author_id: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<ad::Model> for AdResponse {
    fn from(ad: ad::Model) -> Self {
        let image_urls = ad.image_url_list();
        Self {
            id: ad.id,
            title: ad.title,
            description: ad.description,
            price: ad.price,
            category: ad.category.label().to_string(),
            location: ad.location,
            phone: ad.phone,
            image_urls,
            affiliate_link: ad.affiliate_link,
            author_id: ad.author_id,
            status: format!("{:?}", ad.status).to_lowercase(),
            created_at: ad.created_at.to_rfc3339(),
            updated_at: ad.updated_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Listing page request.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
}

const fn default_page() -> u64 {
    1
}

/// Paginated listing response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdListResponse {
    pub ads: Vec<AdResponse>,
    pub page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub flash: Option<FlashMessage>,
}

/// All approved ads, paginated newest-first.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<AdListResponse>)> {
    let (flash, jar) = flash::take(jar);

    let page = state
        .ad_service
        .list_approved(query.page, PUBLIC_PAGE_SIZE)
        .await?;

    Ok((
        jar,
        ApiResponse::ok(AdListResponse {
            ads: page.items.into_iter().map(Into::into).collect(),
            page: page.page,
            total_pages: page.total_pages,
            total_items: page.total_items,
            flash,
        }),
    ))
}

/// Context for the creation form.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdFormContext {
    pub categories: Vec<&'static str>,
    pub flash: Option<FlashMessage>,
}

/// Creation form context (categories for the select).
async fn new_form(
    AuthUser(_user): AuthUser,
    jar: CookieJar,
) -> (CookieJar, ApiResponse<AdFormContext>) {
    let (flash, jar) = flash::take(jar);
    (
        jar,
        ApiResponse::ok(AdFormContext {
            categories: category_labels(),
            flash,
        }),
    )
}

/// Create a new ad from a multipart form.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> FlashRedirect {
    let (fields, images) = match read_multipart_form(multipart).await {
        Ok(parsed) => parsed,
        Err(err) => return FlashRedirect::from_error(&err, "/ads/new"),
    };

    let input = match ad_input_from_fields(&fields) {
        Ok(input) => input,
        Err(err) => return FlashRedirect::from_error(&err, "/ads/new"),
    };

    match state.ad_service.create(&user, input, images).await {
        Ok(_) => FlashRedirect::success(
            "/ads",
            "Annonce créée avec succès ! Elle est en attente d'approbation.",
        ),
        Err(err) => FlashRedirect::from_error(&err, "/ads/new"),
    }
}

/// Ad detail response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdDetailResponse {
    pub ad: AdResponse,
    pub is_owner: bool,
    pub flash: Option<FlashMessage>,
}

/// One ad. Non-approved ads are only visible to their owner and admins.
async fn show(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<String>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<AdDetailResponse>)> {
    let (flash, jar) = flash::take(jar);

    let ad = state.ad_service.get_public(&id, viewer.as_ref()).await?;
    let is_owner = viewer.as_ref().is_some_and(|u| u.id == ad.author_id);

    Ok((
        jar,
        ApiResponse::ok(AdDetailResponse {
            ad: ad.into(),
            is_owner,
            flash,
        }),
    ))
}

/// Edit form context.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditAdContext {
    pub ad: AdResponse,
    pub categories: Vec<&'static str>,
}

/// Edit form context. Owner-or-admin gated.
async fn edit_form(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<EditAdContext>, FlashRedirect> {
    match state.ad_service.get_for_edit(&id, &user).await {
        Ok(ad) => Ok(ApiResponse::ok(EditAdContext {
            ad: ad.into(),
            categories: category_labels(),
        })),
        Err(err) => Err(FlashRedirect::from_error(&err, "/ads")),
    }
}

/// Update an ad. Resets its status to pending.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> FlashRedirect {
    let edit_url = format!("/ads/{id}/edit");

    let (fields, images) = match read_multipart_form(multipart).await {
        Ok(parsed) => parsed,
        Err(err) => return FlashRedirect::from_error(&err, edit_url),
    };

    let input = match update_input_from_fields(&fields) {
        Ok(input) => input,
        Err(err) => return FlashRedirect::from_error(&err, edit_url),
    };

    match state.ad_service.update(&id, &user, input, images).await {
        Ok(ad) => FlashRedirect::success(
            format!("/ads/{}", ad.id),
            "Annonce mise à jour et en attente d'approbation.",
        ),
        Err(err) => FlashRedirect::from_error(&err, edit_url),
    }
}

/// Delete an ad and its images.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> FlashRedirect {
    match state.ad_service.delete(&id, &user).await {
        Ok(()) => FlashRedirect::success("/ads", "Annonce supprimée avec succès."),
        Err(err) => FlashRedirect::from_error(&err, "/ads"),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/new", get(new_form))
        .route("/{id}", get(show).put(update).delete(delete))
        .route("/{id}/edit", get(edit_form))
}

fn category_labels() -> Vec<&'static str> {
    Category::all().iter().map(|c| c.label()).collect()
}

/// Read a multipart form into text fields plus image payloads.
///
/// Any file part is treated as an image; empty file parts (no file chosen
/// in the form) are skipped.
pub(crate) async fn read_multipart_form(
    mut multipart: Multipart,
) -> AppResult<(HashMap<String, String>, Vec<ImageUpload>)> {
    let mut fields = HashMap::new();
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name() {
            Some(filename) if !filename.is_empty() => {
                let filename = filename.to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid file upload: {e}")))?;

                images.push(ImageUpload {
                    filename,
                    content_type,
                    data: data.to_vec(),
                });
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid form field: {e}")))?;
                fields.insert(name, value);
            }
        }
    }

    Ok((fields, images))
}

fn text_field(fields: &HashMap<String, String>, name: &str) -> String {
    fields.get(name).map(|s| s.trim().to_string()).unwrap_or_default()
}

fn optional_field(fields: &HashMap<String, String>, name: &str) -> Option<String> {
    fields
        .get(name)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn price_field(fields: &HashMap<String, String>) -> AppResult<i64> {
    text_field(fields, "price")
        .parse()
        .map_err(|_| AppError::Validation("Le prix doit être une valeur numérique.".to_string()))
}

pub(crate) fn ad_input_from_fields(fields: &HashMap<String, String>) -> AppResult<CreateAdInput> {
    Ok(CreateAdInput {
        title: text_field(fields, "title"),
        description: text_field(fields, "description"),
        price: price_field(fields)?,
        category: text_field(fields, "category"),
        location: optional_field(fields, "location"),
        phone: optional_field(fields, "phone"),
        affiliate_link: optional_field(fields, "affiliate_link"),
    })
}

fn update_input_from_fields(fields: &HashMap<String, String>) -> AppResult<UpdateAdInput> {
    Ok(UpdateAdInput {
        title: text_field(fields, "title"),
        description: text_field(fields, "description"),
        price: price_field(fields)?,
        category: text_field(fields, "category"),
        location: optional_field(fields, "location"),
        phone: optional_field(fields, "phone"),
        affiliate_link: optional_field(fields, "affiliate_link"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_field_rejects_garbage() {
        let mut fields = HashMap::new();
        fields.insert("price".to_string(), "fifty".to_string());
        assert!(price_field(&fields).is_err());

        fields.insert("price".to_string(), " 50 ".to_string());
        assert_eq!(price_field(&fields).unwrap(), 50);
    }

    #[test]
    fn test_submitted_status_field_is_ignored() {
        // A hostile form can post status=approved; the input type simply
        // has no such field, so it never reaches the service.
        let mut fields = HashMap::new();
        fields.insert("title".to_string(), "Bike".to_string());
        fields.insert("description".to_string(), "A bike".to_string());
        fields.insert("price".to_string(), "50".to_string());
        fields.insert("category".to_string(), "Loisirs".to_string());
        fields.insert("status".to_string(), "approved".to_string());

        let input = ad_input_from_fields(&fields).unwrap();
        assert_eq!(input.title, "Bike");
        // No status on CreateAdInput; nothing to assert beyond it parsing.
    }

    #[test]
    fn test_optional_field_blank_is_none() {
        let mut fields = HashMap::new();
        fields.insert("location".to_string(), "   ".to_string());
        assert_eq!(optional_field(&fields, "location"), None);

        fields.insert("location".to_string(), "Dakar".to_string());
        assert_eq!(optional_field(&fields, "location").as_deref(), Some("Dakar"));
    }

    #[test]
    fn test_category_labels_match_enum() {
        let labels = category_labels();
        assert_eq!(labels.len(), 7);
        assert!(labels.contains(&"Loisirs"));
        assert!(labels.contains(&"Maison & Jardin"));
    }
}
