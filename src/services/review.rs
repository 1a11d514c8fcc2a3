//! Review service
//!
//! Submission, moderation and public queries for visitor reviews.
//! New reviews always start as PENDING and only APPROVED reviews are shown
//! on public listings.

use crate::db::repositories::{ArtworkRepository, ReviewRepository};
use crate::models::{CreateReviewInput, RatingSummary, Review, ReviewStats, ReviewStatus};
use chrono::Utc;
use std::sync::Arc;

/// Error types for review service operations
#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error("Review not found: {0}")]
    NotFound(i64),

    /// The referenced artwork does not exist
    #[error("Artwork not found: {0}")]
    ArtworkNotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct ReviewService {
    repo: Arc<dyn ReviewRepository>,
    artwork_repo: Arc<dyn ArtworkRepository>,
}

impl ReviewService {
    pub fn new(repo: Arc<dyn ReviewRepository>, artwork_repo: Arc<dyn ArtworkRepository>) -> Self {
        Self { repo, artwork_repo }
    }

    /// Submit a review for moderation.
    ///
    /// Any status in the input is ignored; the stored review is PENDING.
    pub async fn create(&self, input: CreateReviewInput) -> Result<Review, ReviewServiceError> {
        input.validate().map_err(ReviewServiceError::ValidationError)?;
        let artwork_id = input
            .target_artwork_id()
            .ok_or_else(|| ReviewServiceError::ValidationError("artworkId is required".to_string()))?;

        if self.artwork_repo.get_by_id(artwork_id).await?.is_none() {
            return Err(ReviewServiceError::ArtworkNotFound(artwork_id));
        }

        let now = Utc::now();
        let review = Review {
            id: 0,
            artwork_id,
            author_name: input.author_name.trim().to_string(),
            rating: input.rating,
            comment: input.comment,
            helpful: 0,
            status: ReviewStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&review).await?;
        tracing::info!(id = created.id, artwork_id, "Review submitted for moderation");
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Review, ReviewServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ReviewServiceError::NotFound(id))
    }

    /// All reviews in any status, ordered by id
    pub async fn list(&self) -> Result<Vec<Review>, ReviewServiceError> {
        Ok(self.repo.list().await?)
    }

    /// All reviews in any status, newest first
    pub async fn list_recent(&self) -> Result<Vec<Review>, ReviewServiceError> {
        Ok(self.repo.list_recent().await?)
    }

    pub async fn approve(&self, id: i64) -> Result<Review, ReviewServiceError> {
        self.set_status(id, ReviewStatus::Approved).await
    }

    pub async fn reject(&self, id: i64) -> Result<Review, ReviewServiceError> {
        self.set_status(id, ReviewStatus::Rejected).await
    }

    async fn set_status(&self, id: i64, status: ReviewStatus) -> Result<Review, ReviewServiceError> {
        let review = self
            .repo
            .set_status(id, status)
            .await?
            .ok_or(ReviewServiceError::NotFound(id))?;
        tracing::info!(id, status = %status, "Review moderated");
        Ok(review)
    }

    /// Count one more helpful vote and return the new total
    pub async fn mark_helpful(&self, id: i64) -> Result<i64, ReviewServiceError> {
        self.repo
            .increment_helpful(id)
            .await?
            .ok_or(ReviewServiceError::NotFound(id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ReviewServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ReviewServiceError::NotFound(id));
        }
        tracing::info!(id, "Review deleted");
        Ok(())
    }

    /// Approved reviews of one artwork, newest first
    pub async fn list_for_artwork(&self, artwork_id: i64) -> Result<Vec<Review>, ReviewServiceError> {
        Ok(self.repo.list_approved_by_artwork(artwork_id).await?)
    }

    /// Moderation queue, oldest first
    pub async fn list_pending(&self) -> Result<Vec<Review>, ReviewServiceError> {
        Ok(self.repo.list_pending().await?)
    }

    pub async fn list_approved(&self) -> Result<Vec<Review>, ReviewServiceError> {
        Ok(self.repo.list_approved().await?)
    }

    pub async fn list_most_helpful(&self) -> Result<Vec<Review>, ReviewServiceError> {
        Ok(self.repo.list_most_helpful().await?)
    }

    pub async fn list_by_rating(&self, rating: i32) -> Result<Vec<Review>, ReviewServiceError> {
        crate::models::validate_rating(rating).map_err(ReviewServiceError::ValidationError)?;
        Ok(self.repo.list_approved_by_rating(rating).await?)
    }

    /// Case-insensitive search over approved reviews' comments and authors
    pub async fn search(&self, term: &str) -> Result<Vec<Review>, ReviewServiceError> {
        if term.trim().is_empty() {
            return self.list_approved().await;
        }
        Ok(self.repo.search(term, Some(ReviewStatus::Approved)).await?)
    }

    /// Moderation search over every review, optionally narrowed to one status
    pub async fn search_all(
        &self,
        term: &str,
        status: Option<ReviewStatus>,
    ) -> Result<Vec<Review>, ReviewServiceError> {
        Ok(self.repo.search(term.trim(), status).await?)
    }

    /// Average rating over approved reviews; 0.0 when there are none
    pub async fn rating_summary(&self, artwork_id: i64) -> Result<RatingSummary, ReviewServiceError> {
        Ok(self.repo.rating_summary(artwork_id).await?)
    }

    pub async fn average_rating(&self, artwork_id: i64) -> Result<f64, ReviewServiceError> {
        Ok(self.rating_summary(artwork_id).await?.average)
    }

    pub async fn count_by_status(&self, status: ReviewStatus) -> Result<i64, ReviewServiceError> {
        Ok(self.repo.count_by_status(status).await?)
    }

    /// Total and per-status counts
    pub async fn stats(&self) -> Result<ReviewStats, ReviewServiceError> {
        Ok(ReviewStats {
            total_reviews: self.repo.count().await?,
            approved_reviews: self.repo.count_by_status(ReviewStatus::Approved).await?,
            pending_reviews: self.repo.count_by_status(ReviewStatus::Pending).await?,
            rejected_reviews: self.repo.count_by_status(ReviewStatus::Rejected).await?,
        })
    }
}
