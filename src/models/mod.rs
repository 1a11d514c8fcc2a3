//! Data models
//!
//! Gallery entities (Artwork, Review, ContactMessage, User), their input
//! types with field validation, and the aggregate shapes used by stats.
//! Everything serializes with camelCase keys.

mod artwork;
mod contact;
mod pagination;
mod review;
mod stats;
mod user;

pub use artwork::{Artwork, ArtworkFilter, ArtworkInput, TechniqueCount, YearCount};
pub use contact::{ContactMessage, CreateContactInput, ReadStatusCount};
pub use pagination::{ListParams, PagedResult};
pub use review::{
    validate_rating, ArtworkRef, CreateReviewInput, RatingSummary, Review, ReviewStatus,
    MAX_RATING, MIN_RATING,
};
pub use stats::{ArtworkStats, ContactStats, GlobalStats, ReviewStats};
pub use user::{CreateUserInput, UpdateUserInput, User, UserRole};

/// Require a non-blank value of at most `max` characters
pub(crate) fn require_text(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    check_max_len(field, Some(value), max)
}

pub(crate) fn check_max_len(field: &str, value: Option<&str>, max: usize) -> Result<(), String> {
    match value {
        Some(v) if v.chars().count() > max => Err(format!(
            "{} must be at most {} characters",
            field, max
        )),
        _ => Ok(()),
    }
}

/// Treat blank optional strings as absent
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
