//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The `ApiError` response type and service error mappings
//! - The bearer-token filter that attaches an identity to requests
//! - Route-level access rules (`require_auth`, `require_admin`)

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::DefaultAdminConfig;
use crate::models::{User, UserRole};
use crate::services::{
    ArtworkService, ArtworkServiceError, ContactService, ContactServiceError, ReviewService,
    ReviewServiceError, StatsService, StatsServiceError, UserService, UserServiceError,
    INVALID_CREDENTIALS,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub artwork_service: Arc<ArtworkService>,
    pub review_service: Arc<ReviewService>,
    pub contact_service: Arc<ContactService>,
    pub stats_service: Arc<StatsService>,
    pub default_admin: Arc<DefaultAdminConfig>,
}

/// Authenticated user attached to the request by [`authenticate`]
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn role(&self) -> UserRole {
        self.0.role
    }
}

/// Error response for API errors, serialized as `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Log the cause and answer with a generic message
    pub fn internal_error(cause: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {:#}", cause);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<ArtworkServiceError> for ApiError {
    fn from(err: ArtworkServiceError) -> Self {
        match err {
            ArtworkServiceError::NotFound(id) => Self::not_found(format!("Artwork not found: {}", id)),
            ArtworkServiceError::ValidationError(msg) => Self::validation_error(msg),
            ArtworkServiceError::ImageNotFound(name) => Self::not_found(format!("Image not found: {}", name)),
            ArtworkServiceError::StorageError(msg) => {
                tracing::error!("Upload storage failure: {}", msg);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store file")
            }
            ArtworkServiceError::InternalError(e) => Self::internal_error(e),
        }
    }
}

impl From<ReviewServiceError> for ApiError {
    fn from(err: ReviewServiceError) -> Self {
        match err {
            ReviewServiceError::NotFound(id) => Self::not_found(format!("Review not found: {}", id)),
            ReviewServiceError::ArtworkNotFound(id) => {
                Self::not_found(format!("Artwork not found: {}", id))
            }
            ReviewServiceError::ValidationError(msg) => Self::validation_error(msg),
            ReviewServiceError::InternalError(e) => Self::internal_error(e),
        }
    }
}

impl From<ContactServiceError> for ApiError {
    fn from(err: ContactServiceError) -> Self {
        match err {
            ContactServiceError::NotFound(id) => {
                Self::not_found(format!("Contact message not found: {}", id))
            }
            ContactServiceError::ValidationError(msg) => Self::validation_error(msg),
            ContactServiceError::InternalError(e) => Self::internal_error(e),
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::InvalidCredentials => Self::unauthorized(INVALID_CREDENTIALS),
            UserServiceError::NotFound(key) => Self::not_found(format!("User not found: {}", key)),
            UserServiceError::EmailTaken(_) => Self::conflict("Email is already registered"),
            UserServiceError::UsernameTaken(_) => Self::conflict("Username is already taken"),
            UserServiceError::ValidationError(msg) => Self::validation_error(msg),
            UserServiceError::InternalError(e) => Self::internal_error(e),
        }
    }
}

impl From<StatsServiceError> for ApiError {
    fn from(err: StatsServiceError) -> Self {
        match err {
            StatsServiceError::InternalError(e) => Self::internal_error(e),
        }
    }
}

/// Bearer token from the `Authorization` header.
///
/// `None` when the header is missing or uses another scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Request filter applied to every route.
///
/// Attaches an [`AuthenticatedUser`] when the request carries a valid bearer
/// token for an existing account. It never rejects a request; access rules
/// are enforced separately by [`require_auth`] and [`require_admin`].
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers()).map(str::to_string);

    match token {
        None => {
            if request.headers().contains_key(header::AUTHORIZATION) {
                tracing::debug!("Authorization header without a bearer token, continuing unauthenticated");
            }
        }
        Some(token) if request.extensions().get::<AuthenticatedUser>().is_none() => {
            match state.user_service.resolve_token(&token).await {
                Ok(Some(user)) => {
                    request.extensions_mut().insert(AuthenticatedUser(user));
                }
                Ok(None) => {}
                Err(e) => tracing::error!("Failed to resolve bearer token: {}", e),
            }
        }
        Some(_) => {}
    }

    next.run(request).await
}

/// Reject requests without an attached identity (401)
pub async fn require_auth(request: Request, next: Next) -> Result<Response, ApiError> {
    if request.extensions().get::<AuthenticatedUser>().is_none() {
        return Err(ApiError::unauthorized("Authentication required"));
    }
    Ok(next.run(request).await)
}

/// Admin authorization middleware: 401 without identity, 403 for non-admins
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if user.role() != UserRole::Admin {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Extract the identity attached by [`authenticate`]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_api_error_body() {
        let response = ApiError::not_found("Artwork not found: 3").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Artwork not found: 3"}));
    }

    #[test]
    fn test_service_error_statuses() {
        let cases = [
            (ApiError::from(UserServiceError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (
                ApiError::from(UserServiceError::EmailTaken("a@b.c".into())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(UserServiceError::UsernameTaken("a".into())),
                StatusCode::CONFLICT,
            ),
            (ApiError::from(ReviewServiceError::NotFound(1)), StatusCode::NOT_FOUND),
            (
                ApiError::from(ReviewServiceError::ValidationError("bad".into())),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::from(ArtworkServiceError::NotFound(1)), StatusCode::NOT_FOUND),
            (
                ApiError::from(ArtworkServiceError::StorageError("disk".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::from(ContactServiceError::NotFound(1)), StatusCode::NOT_FOUND),
            (
                ApiError::from(StatsServiceError::InternalError(anyhow::anyhow!("db down"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.status, status, "{}", error.message);
        }
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let error = ApiError::internal_error("connection refused at 10.0.0.3");
        assert_eq!(error.message, "Internal server error");
    }
}
