//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api`:
//! - Artwork catalogue, search and image upload
//! - Reviews and the moderation queue
//! - Contact form and admin inbox
//! - Authentication and account management
//! - Admin statistics

pub mod artworks;
pub mod auth;
pub mod contact;
pub mod extract;
pub mod middleware;
pub mod responses;
pub mod reviews;
pub mod stats;


use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the `/api` router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/artworks", artworks::router())
        .nest("/auth", auth::router())
        .nest("/contact", contact::router())
        .nest("/reviews", reviews::router())
        .nest("/stats", stats::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str, max_body_size: usize) -> Router {
    Router::new()
        .nest("/api", build_api_router())
        // Identity filter runs before route-level access rules
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

/// CORS for the gallery front-end. `*` allows any origin.
fn cors_layer(cors_origin: &str) -> CorsLayer {
    let origin = if cors_origin.trim() == "*" {
        AllowOrigin::from(Any)
    } else {
        match cors_origin.parse::<HeaderValue>() {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!("Invalid CORS origin '{}', allowing any origin", cors_origin);
                AllowOrigin::from(Any)
            }
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
