//! Stats API endpoints (admin only)

use axum::{extract::State, middleware as axum_middleware, routing::get, Json, Router};

use crate::api::middleware::{self, ApiError, AppState};
use crate::models::{ArtworkStats, ContactStats, GlobalStats, ReviewStats};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(global_stats))
        .route("/artworks", get(artwork_stats))
        .route("/reviews", get(review_stats))
        .route("/contact", get(contact_stats))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
}

/// GET /api/stats - Dashboard totals
async fn global_stats(State(state): State<AppState>) -> Result<Json<GlobalStats>, ApiError> {
    Ok(Json(state.stats_service.global().await?))
}

async fn artwork_stats(State(state): State<AppState>) -> Result<Json<ArtworkStats>, ApiError> {
    Ok(Json(state.stats_service.artworks().await?))
}

async fn review_stats(State(state): State<AppState>) -> Result<Json<ReviewStats>, ApiError> {
    Ok(Json(state.stats_service.reviews().await?))
}

async fn contact_stats(State(state): State<AppState>) -> Result<Json<ContactStats>, ApiError> {
    Ok(Json(state.stats_service.contact().await?))
}
