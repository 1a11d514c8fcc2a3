//! User model
//!
//! Back-office accounts. Only `ADMIN` users may manage gallery content;
//! `USER` accounts can authenticate but hold no extra privileges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::require_text;

pub const USERNAME_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 255;

/// User entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique), also the token subject
    pub email: String,
    /// Password hash (argon2), never sent over the wire
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new unsaved user.
    ///
    /// The password must already be hashed, see `services::password::hash_password()`.
    pub fn new(username: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username,
            email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// User role for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// Full access to the back office
    Admin,
    #[default]
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::User => "USER",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Ok(UserRole::Admin),
            "USER" => Ok(UserRole::User),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// Plaintext password (will be hashed)
    #[serde(default)]
    pub password: String,
    /// Defaults to `USER`
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl CreateUserInput {
    pub fn validate(&self) -> Result<(), String> {
        require_text("username", &self.username, USERNAME_MAX_LEN)?;
        require_text("email", &self.email, EMAIL_MAX_LEN)?;
        if self.password.is_empty() {
            return Err("password is required".to_string());
        }
        Ok(())
    }
}

/// Input for updating a user.
///
/// Username and email are always overwritten. A missing role keeps the
/// current one, and a missing or empty password keeps the current hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl UpdateUserInput {
    pub fn validate(&self) -> Result<(), String> {
        require_text("username", &self.username, USERNAME_MAX_LEN)?;
        require_text("email", &self.email, EMAIL_MAX_LEN)?;
        Ok(())
    }

    /// The replacement password, if one was actually supplied
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}
