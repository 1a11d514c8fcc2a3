//! Shared API response types
//!
//! Small JSON bodies returned by several endpoints. Entities themselves are
//! serialized straight from the models.

use serde::{Deserialize, Serialize};

use crate::models::{User, UserRole};

/// Plain success body: `{"message": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

impl LoginResponse {
    pub fn bearer(token: String, user: User) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenValidResponse {
    pub valid: bool,
}

/// Result of the default-admin bootstrap
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminCreatedResponse {
    pub message: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HelpfulResponse {
    pub message: String,
    pub helpful: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub image_url: String,
}
