//! Review API endpoints
//!
//! Public listing and submission of reviews under `/api/reviews`, plus the
//! admin moderation queue.

use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{self, ApiError, AppState};
use crate::api::responses::{HelpfulResponse, MessageResponse};
use crate::models::{CreateReviewInput, RatingSummary, Review, ReviewStats, ReviewStatus};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Admin search across the moderation states
#[derive(Debug, Default, Deserialize)]
pub struct ModerationSearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub status: Option<ReviewStatus>,
}

/// Build the review router
pub fn router() -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/pending", get(list_pending))
        .route("/stats", get(review_stats))
        .route("/search/all", get(search_all_reviews))
        .route("/{id}/approve", post(approve_review))
        .route("/{id}/reject", post(reject_review))
        .route("/{id}", delete(delete_review))
        .route_layer(axum_middleware::from_fn(middleware::require_admin));

    Router::new()
        .route("/", get(list_approved).post(create_review))
        .route("/artwork/{id}", get(list_for_artwork))
        .route("/artwork/{id}/rating", get(artwork_rating))
        .route("/helpful", get(list_most_helpful))
        .route("/search", get(search_reviews))
        .route("/rating/{rating}", get(list_by_rating))
        .route("/{id}/helpful", post(mark_helpful))
        .merge(admin_routes)
}

/// GET /api/reviews - Approved reviews, newest first
async fn list_approved(State(state): State<AppState>) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(state.review_service.list_approved().await?))
}

/// POST /api/reviews - Submit a review; it stays hidden until approved
async fn create_review(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateReviewInput>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let review = state.review_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn list_for_artwork(
    State(state): State<AppState>,
    ApiPath(artwork_id): ApiPath<i64>,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(state.review_service.list_for_artwork(artwork_id).await?))
}

/// GET /api/reviews/artwork/{id}/rating - `{average, count}` over approved reviews
async fn artwork_rating(
    State(state): State<AppState>,
    ApiPath(artwork_id): ApiPath<i64>,
) -> Result<Json<RatingSummary>, ApiError> {
    Ok(Json(state.review_service.rating_summary(artwork_id).await?))
}

async fn list_most_helpful(State(state): State<AppState>) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(state.review_service.list_most_helpful().await?))
}

async fn search_reviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(state.review_service.search(&query.q).await?))
}

/// GET /api/reviews/rating/{rating} - Approved reviews with exactly this rating
async fn list_by_rating(
    State(state): State<AppState>,
    ApiPath(rating): ApiPath<i32>,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(state.review_service.list_by_rating(rating).await?))
}

/// POST /api/reviews/{id}/helpful
async fn mark_helpful(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<HelpfulResponse>, ApiError> {
    let helpful = state.review_service.mark_helpful(id).await?;
    Ok(Json(HelpfulResponse {
        message: "Review marked as helpful".to_string(),
        helpful,
    }))
}

/// GET /api/reviews/pending (admin) - Moderation queue, oldest first
async fn list_pending(State(state): State<AppState>) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(state.review_service.list_pending().await?))
}

async fn review_stats(State(state): State<AppState>) -> Result<Json<ReviewStats>, ApiError> {
    Ok(Json(state.review_service.stats().await?))
}

/// GET /api/reviews/search/all (admin) - Any status unless `status` is given
async fn search_all_reviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ModerationSearchQuery>,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(
        state
            .review_service
            .search_all(&query.q, query.status)
            .await?,
    ))
}

async fn approve_review(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.review_service.approve(id).await?;
    Ok(Json(MessageResponse::new("Review approved successfully")))
}

async fn reject_review(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.review_service.reject(id).await?;
    Ok(Json(MessageResponse::new("Review rejected successfully")))
}

async fn delete_review(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.review_service.delete(id).await?;
    Ok(Json(MessageResponse::new("Review deleted successfully")))
}
