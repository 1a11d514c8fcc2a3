//! Read-side aggregates for the admin dashboard

use serde::{Deserialize, Serialize};

use super::{ReadStatusCount, TechniqueCount, YearCount};

/// Site-wide totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_users: i64,
    pub total_admins: i64,
    pub total_regular_users: i64,
    pub total_artworks: i64,
    pub total_reviews: i64,
    pub pending_reviews: i64,
    pub approved_reviews: i64,
    pub rejected_reviews: i64,
    pub total_contact_messages: i64,
    pub unread_messages: i64,
    pub unresponded_messages: i64,
    /// Mean rating over approved reviews, 0.0 when there are none
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtworkStats {
    pub total_artworks: i64,
    #[serde(rename = "techniques")]
    pub by_technique: Vec<TechniqueCount>,
    /// Ordered by year, most recent first
    #[serde(rename = "yearlyStats")]
    pub by_year: Vec<YearCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_reviews: i64,
    pub approved_reviews: i64,
    pub pending_reviews: i64,
    pub rejected_reviews: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactStats {
    pub total_messages: i64,
    pub unread_messages: i64,
    pub unresponded_messages: i64,
    #[serde(rename = "readStatusStats")]
    pub by_read_status: Vec<ReadStatusCount>,
}
