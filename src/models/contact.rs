//! Contact message model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{check_max_len, normalize_optional, require_text};

pub const NAME_MAX_LEN: usize = 100;
pub const EMAIL_MAX_LEN: usize = 255;
pub const SUBJECT_MAX_LEN: usize = 255;
pub const PHONE_MAX_LEN: usize = 50;

/// A message left through the public contact form.
///
/// `is_read` and `is_responded` only ever move from false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub phone: Option<String>,
    pub is_read: bool,
    pub is_responded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for the public contact form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CreateContactInput {
    pub fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name, NAME_MAX_LEN)?;
        require_text("email", &self.email, EMAIL_MAX_LEN)?;
        if self.message.trim().is_empty() {
            return Err("message is required".to_string());
        }
        check_max_len("subject", self.subject.as_deref(), SUBJECT_MAX_LEN)?;
        check_max_len("phone", self.phone.as_deref(), PHONE_MAX_LEN)?;
        Ok(())
    }

    /// Validate and build an unsaved message with both flags cleared
    pub fn into_message(self) -> Result<ContactMessage, String> {
        self.validate()?;
        let now = Utc::now();
        Ok(ContactMessage {
            id: 0,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: normalize_optional(self.subject),
            message: self.message,
            phone: normalize_optional(self.phone),
            is_read: false,
            is_responded: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Message count for one value of the read flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadStatusCount {
    pub is_read: bool,
    pub count: i64,
}
