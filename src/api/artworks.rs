//! Artwork API endpoints
//!
//! Public catalogue browsing under `/api/artworks`, plus admin-only
//! create/update/delete and image upload.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{self, ApiError, AppState};
use crate::api::responses::{ImageUploadResponse, MessageResponse};
use crate::models::{Artwork, ArtworkFilter, ArtworkInput, ListParams};

/// Optional pagination for `GET /`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `GET /search` parameters
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, alias = "titre")]
    pub title: Option<String>,
    #[serde(default)]
    pub technique: Option<String>,
    #[serde(default, alias = "year")]
    pub annee: Option<i32>,
}

/// Build the artwork router
pub fn router() -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/", post(create_artwork))
        .route("/{id}", put(update_artwork).delete(delete_artwork))
        .route("/upload", post(upload_image))
        .route_layer(axum_middleware::from_fn(middleware::require_admin));

    Router::new()
        .route("/", get(list_artworks))
        .route("/{id}", get(get_artwork))
        .route("/search", get(search_artworks))
        .route("/recent", get(list_recent))
        .route("/alphabetical", get(list_alphabetical))
        .route("/technique/{technique}", get(list_by_technique))
        .route("/year/{year}", get(list_by_year))
        .route("/images/{file}", get(serve_image))
        .merge(admin_routes)
}

/// GET /api/artworks - All artworks, or one page when `page`/`perPage` is given
async fn list_artworks(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Response, ApiError> {
    if query.page.is_none() && query.per_page.is_none() {
        let artworks = state.artwork_service.list().await?;
        return Ok(Json(artworks).into_response());
    }

    let defaults = ListParams::default();
    let params = ListParams::new(
        query.page.unwrap_or(defaults.page),
        query.per_page.unwrap_or(defaults.per_page),
    );
    let page = state.artwork_service.list_paged(&params).await?;
    Ok(Json(page).into_response())
}

/// GET /api/artworks/{id}
async fn get_artwork(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Artwork>, ApiError> {
    Ok(Json(state.artwork_service.get_by_id(id).await?))
}

/// GET /api/artworks/search - Free text with `q`, otherwise structured filters
async fn search_artworks(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<Artwork>>, ApiError> {
    let artworks = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => state.artwork_service.search(q).await?,
        _ => {
            let filter = ArtworkFilter::new(query.title, query.technique, query.annee);
            state.artwork_service.filter(&filter).await?
        }
    };
    Ok(Json(artworks))
}

async fn list_recent(State(state): State<AppState>) -> Result<Json<Vec<Artwork>>, ApiError> {
    Ok(Json(state.artwork_service.list_recent().await?))
}

async fn list_alphabetical(State(state): State<AppState>) -> Result<Json<Vec<Artwork>>, ApiError> {
    Ok(Json(state.artwork_service.list_alphabetical().await?))
}

async fn list_by_technique(
    State(state): State<AppState>,
    ApiPath(technique): ApiPath<String>,
) -> Result<Json<Vec<Artwork>>, ApiError> {
    Ok(Json(state.artwork_service.list_by_technique(&technique).await?))
}

async fn list_by_year(
    State(state): State<AppState>,
    ApiPath(year): ApiPath<i32>,
) -> Result<Json<Vec<Artwork>>, ApiError> {
    Ok(Json(state.artwork_service.list_by_year(year).await?))
}

/// POST /api/artworks (admin)
async fn create_artwork(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ArtworkInput>,
) -> Result<(StatusCode, Json<Artwork>), ApiError> {
    let artwork = state.artwork_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(artwork)))
}

/// PUT /api/artworks/{id} (admin) - Full replacement
async fn update_artwork(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ArtworkInput>,
) -> Result<Json<Artwork>, ApiError> {
    Ok(Json(state.artwork_service.update(id, input).await?))
}

/// DELETE /api/artworks/{id} (admin)
async fn delete_artwork(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.artwork_service.delete(id).await?;
    Ok(Json(MessageResponse::new("Artwork deleted successfully")))
}

/// POST /api/artworks/upload (admin)
///
/// Accepts multipart/form-data with a single file field named "file".
async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageUploadResponse>, ApiError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("image").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        let image_url = state.artwork_service.store_image(&filename, &data).await?;
        return Ok(Json(ImageUploadResponse { image_url }));
    }

    Err(ApiError::validation_error("No file provided"))
}

/// GET /api/artworks/images/{file}
async fn serve_image(
    State(state): State<AppState>,
    ApiPath(file): ApiPath<String>,
) -> Result<Response, ApiError> {
    let (contents, content_type) = state.artwork_service.read_image(&file).await?;
    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        contents,
    )
        .into_response())
}
