//! Authentication API endpoints
//!
//! Handles HTTP requests under `/api/auth`:
//! - POST /login - Exchange email and password for a bearer token
//! - POST /validate - Check the bearer token in the Authorization header
//! - POST /create-admin - Idempotent default administrator bootstrap
//! - GET /me - Current user
//! - /users - Account management, search and admin listing (admin)

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::{self, bearer_token, ApiError, AppState, AuthenticatedUser};
use crate::api::responses::{
    AdminCreatedResponse, LoginResponse, MessageResponse, TokenValidResponse,
};
use crate::models::{CreateUserInput, UpdateUserInput, User};
use crate::services::LoginInput;

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Build the auth router
pub fn router() -> Router<AppState> {
    let authenticated_routes = Router::new()
        .route("/me", get(me))
        .route_layer(axum_middleware::from_fn(middleware::require_auth));

    let admin_routes = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/admins", get(list_admins))
        .route("/users/search", get(search_users))
        .route("/users/{id}", put(update_user).delete(delete_user))
        .route_layer(axum_middleware::from_fn(middleware::require_admin));

    Router::new()
        .route("/login", post(login))
        .route("/validate", post(validate))
        .route("/create-admin", post(create_admin))
        .merge(authenticated_routes)
        .merge(admin_routes)
}

/// POST /api/auth/login
///
/// Unknown email and wrong password both answer 401 with the same message.
async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Json<LoginResponse>, ApiError> {
    let result = state.user_service.login(input).await?;
    Ok(Json(LoginResponse::bearer(result.token, result.user)))
}

/// POST /api/auth/validate - Always 200, `{valid: false}` for any bad token
async fn validate(State(state): State<AppState>, headers: HeaderMap) -> Json<TokenValidResponse> {
    let valid = match bearer_token(&headers) {
        Some(token) => match state.user_service.resolve_token(token).await {
            Ok(user) => user.is_some(),
            Err(e) => {
                tracing::error!("Token validation failed: {}", e);
                false
            }
        },
        None => false,
    };
    Json(TokenValidResponse { valid })
}

/// POST /api/auth/create-admin
async fn create_admin(State(state): State<AppState>) -> Result<Json<AdminCreatedResponse>, ApiError> {
    let admin = state
        .user_service
        .ensure_default_admin(&state.default_admin)
        .await?;
    Ok(Json(AdminCreatedResponse {
        message: "Admin account ready".to_string(),
        username: admin.username,
        email: admin.email,
    }))
}

/// GET /api/auth/me
async fn me(user: AuthenticatedUser) -> Json<User> {
    Json(user.0)
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.user_service.list().await?))
}

async fn list_admins(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.user_service.list_admins().await?))
}

/// GET /api/auth/users/search?q= - Username or email substring
async fn search_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserSearchQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.user_service.search(&query.q).await?))
}

async fn create_user(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateUserInput>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.user_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<UpdateUserInput>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.update(id, input).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.user_service.delete(id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
