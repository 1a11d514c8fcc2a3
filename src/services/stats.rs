//! Dashboard statistics
//!
//! Read-only aggregation across the other services' repositories.

use crate::db::repositories::{
    ArtworkRepository, ContactRepository, ReviewRepository, UserRepository,
};
use crate::models::{ArtworkStats, ContactStats, GlobalStats, ReviewStats, ReviewStatus, UserRole};
use std::sync::Arc;

/// Error types for stats operations
#[derive(Debug, thiserror::Error)]
pub enum StatsServiceError {
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct StatsService {
    users: Arc<dyn UserRepository>,
    artworks: Arc<dyn ArtworkRepository>,
    reviews: Arc<dyn ReviewRepository>,
    contacts: Arc<dyn ContactRepository>,
}

impl StatsService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        artworks: Arc<dyn ArtworkRepository>,
        reviews: Arc<dyn ReviewRepository>,
        contacts: Arc<dyn ContactRepository>,
    ) -> Self {
        Self {
            users,
            artworks,
            reviews,
            contacts,
        }
    }

    /// Site-wide totals
    pub async fn global(&self) -> Result<GlobalStats, StatsServiceError> {
        let total_users = self.users.count().await?;
        let total_admins = self.users.count_by_role(UserRole::Admin).await?;
        let review_stats = self.reviews().await?;

        let approved = self.reviews.list_approved().await?;
        let average_rating = average(approved.iter().map(|r| r.rating));

        Ok(GlobalStats {
            total_users,
            total_admins,
            total_regular_users: self.users.count_by_role(UserRole::User).await?,
            total_artworks: self.artworks.count().await?,
            total_reviews: review_stats.total_reviews,
            pending_reviews: review_stats.pending_reviews,
            approved_reviews: review_stats.approved_reviews,
            rejected_reviews: review_stats.rejected_reviews,
            total_contact_messages: self.contacts.count().await?,
            unread_messages: self.contacts.count_unread().await?,
            unresponded_messages: self.contacts.count_unresponded().await?,
            average_rating,
        })
    }

    pub async fn artworks(&self) -> Result<ArtworkStats, StatsServiceError> {
        Ok(ArtworkStats {
            total_artworks: self.artworks.count().await?,
            by_technique: self.artworks.count_by_technique().await?,
            by_year: self.artworks.count_by_year().await?,
        })
    }

    pub async fn reviews(&self) -> Result<ReviewStats, StatsServiceError> {
        Ok(ReviewStats {
            total_reviews: self.reviews.count().await?,
            approved_reviews: self.reviews.count_by_status(ReviewStatus::Approved).await?,
            pending_reviews: self.reviews.count_by_status(ReviewStatus::Pending).await?,
            rejected_reviews: self.reviews.count_by_status(ReviewStatus::Rejected).await?,
        })
    }

    pub async fn contact(&self) -> Result<ContactStats, StatsServiceError> {
        Ok(ContactStats {
            total_messages: self.contacts.count().await?,
            unread_messages: self.contacts.count_unread().await?,
            unresponded_messages: self.contacts.count_unresponded().await?,
            by_read_status: self.contacts.count_by_read_status().await?,
        })
    }
}

/// Arithmetic mean, 0.0 for an empty input
fn average(ratings: impl Iterator<Item = i32>) -> f64 {
    let (sum, count) = ratings.fold((0i64, 0i64), |(sum, count), r| (sum + r as i64, count + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}
