//! Artwork model
//!
//! An artwork is the central gallery entity; reviews reference it by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{check_max_len, normalize_optional, require_text};

pub const TITLE_MAX_LEN: usize = 255;
pub const TECHNIQUE_MAX_LEN: usize = 255;
pub const DIMENSIONS_MAX_LEN: usize = 100;
pub const IMAGE_URL_MAX_LEN: usize = 500;

/// Artwork entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub technique: Option<String>,
    pub dimensions: Option<String>,
    pub year: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or fully replacing an artwork.
///
/// `titre` and `annee` are accepted as aliases for `title` and `year` so
/// older gallery front-ends keep working.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkInput {
    #[serde(default, alias = "titre")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technique: Option<String>,
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(default, alias = "annee")]
    pub year: Option<i32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ArtworkInput {
    /// Check field constraints before anything reaches the database
    pub fn validate(&self) -> Result<(), String> {
        require_text("title", &self.title, TITLE_MAX_LEN)?;
        check_max_len("technique", self.technique.as_deref(), TECHNIQUE_MAX_LEN)?;
        check_max_len("dimensions", self.dimensions.as_deref(), DIMENSIONS_MAX_LEN)?;
        check_max_len("imageUrl", self.image_url.as_deref(), IMAGE_URL_MAX_LEN)?;
        if self.year.is_none() {
            return Err("year is required".to_string());
        }
        Ok(())
    }

    /// Validate and turn the input into an unsaved artwork (id 0)
    pub fn into_artwork(self) -> Result<Artwork, String> {
        self.validate()?;
        let now = Utc::now();
        Ok(Artwork {
            id: 0,
            title: self.title.trim().to_string(),
            description: normalize_optional(self.description),
            technique: normalize_optional(self.technique),
            dimensions: normalize_optional(self.dimensions),
            year: self.year.unwrap_or_default(),
            image_url: normalize_optional(self.image_url),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Filters for the structured artwork search. Every filter is optional and
/// the set filters are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtworkFilter {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Case-insensitive substring of the technique
    pub technique: Option<String>,
    /// Exact year
    pub year: Option<i32>,
}

impl ArtworkFilter {
    pub fn new(title: Option<String>, technique: Option<String>, year: Option<i32>) -> Self {
        Self {
            title: normalize_optional(title),
            technique: normalize_optional(technique),
            year,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.technique.is_none() && self.year.is_none()
    }
}

/// Number of artworks sharing a technique
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechniqueCount {
    pub technique: String,
    pub count: i64,
}

/// Number of artworks created in a given year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearCount {
    pub year: i32,
    pub count: i64,
}
