//! Contact API endpoints
//!
//! The public contact form posts to `/api/contact`; everything else is the
//! admin inbox.

use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{self, ApiError, AppState};
use crate::api::responses::MessageResponse;
use crate::models::{ContactMessage, ContactStats, CreateContactInput};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Inclusive creation-time window, RFC 3339 timestamps
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Build the contact router
pub fn router() -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/", get(list_messages))
        .route("/unread", get(list_unread))
        .route("/unresponded", get(list_unresponded))
        .route("/oldest-unread", get(list_oldest_unread))
        .route("/search", get(search_messages))
        .route("/date-range", get(list_by_date_range))
        .route("/email/{email}", get(list_by_email))
        .route("/stats", get(contact_stats))
        .route("/{id}", get(get_message).delete(delete_message))
        .route("/{id}/read", post(mark_read))
        .route("/{id}/responded", post(mark_responded))
        .route_layer(axum_middleware::from_fn(middleware::require_admin));

    Router::new()
        .route("/", post(submit_message))
        .merge(admin_routes)
}

/// POST /api/contact - Public contact form
async fn submit_message(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateContactInput>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state.contact_service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Message sent successfully")),
    ))
}

async fn list_messages(State(state): State<AppState>) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    Ok(Json(state.contact_service.list().await?))
}

async fn list_unread(State(state): State<AppState>) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    Ok(Json(state.contact_service.list_unread().await?))
}

async fn list_unresponded(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    Ok(Json(state.contact_service.list_unresponded().await?))
}

async fn list_oldest_unread(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    Ok(Json(state.contact_service.list_oldest_unread().await?))
}

async fn search_messages(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    Ok(Json(state.contact_service.search(&query.q).await?))
}

async fn list_by_date_range(
    State(state): State<AppState>,
    ApiQuery(range): ApiQuery<DateRangeQuery>,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    Ok(Json(
        state
            .contact_service
            .list_by_date_range(range.start, range.end)
            .await?,
    ))
}

async fn list_by_email(
    State(state): State<AppState>,
    ApiPath(email): ApiPath<String>,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    Ok(Json(state.contact_service.list_by_email(&email).await?))
}

async fn contact_stats(State(state): State<AppState>) -> Result<Json<ContactStats>, ApiError> {
    Ok(Json(state.contact_service.stats().await?))
}

async fn get_message(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ContactMessage>, ApiError> {
    Ok(Json(state.contact_service.get_by_id(id).await?))
}

async fn mark_read(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.contact_service.mark_read(id).await?;
    Ok(Json(MessageResponse::new("Message marked as read")))
}

async fn mark_responded(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.contact_service.mark_responded(id).await?;
    Ok(Json(MessageResponse::new("Message marked as responded")))
}

async fn delete_message(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.contact_service.delete(id).await?;
    Ok(Json(MessageResponse::new("Message deleted successfully")))
}
