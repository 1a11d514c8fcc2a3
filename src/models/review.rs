//! Review model
//!
//! Visitor reviews go through moderation before they are shown publicly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::require_text;

pub const AUTHOR_NAME_MAX_LEN: usize = 100;
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Moderation status of a review.
///
/// Every review starts as `Pending`. Moderators may move it to `Approved`
/// or `Rejected` from any state, any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(anyhow::anyhow!("Invalid review status: {}", s)),
        }
    }
}

/// Review entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub artwork_id: i64,
    pub author_name: String,
    pub rating: i32,
    pub comment: String,
    pub helpful: i64,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reference to an artwork in the nested `{"artwork": {"id": 1}}` form
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArtworkRef {
    pub id: i64,
}

/// Input for submitting a review.
///
/// A caller-supplied `status` is accepted on the wire but never honoured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewInput {
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub artwork_id: Option<i64>,
    #[serde(default)]
    pub artwork: Option<ArtworkRef>,
    #[serde(default)]
    pub status: Option<ReviewStatus>,
}

impl CreateReviewInput {
    /// The referenced artwork, from either `artworkId` or `artwork.id`
    pub fn target_artwork_id(&self) -> Option<i64> {
        self.artwork_id.or(self.artwork.map(|a| a.id))
    }

    pub fn validate(&self) -> Result<(), String> {
        require_text("authorName", &self.author_name, AUTHOR_NAME_MAX_LEN)?;
        validate_rating(self.rating)?;
        if self.comment.trim().is_empty() {
            return Err("comment is required".to_string());
        }
        if self.target_artwork_id().is_none() {
            return Err("artworkId is required".to_string());
        }
        Ok(())
    }
}

pub fn validate_rating(rating: i32) -> Result<(), String> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(format!(
            "rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        ))
    }
}

/// Approved-review rating summary for one artwork
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
}
