//! Review repository
//!
//! Database operations for visitor reviews and their moderation status.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{RatingSummary, Review, ReviewStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

use super::{bind_mysql, bind_sqlite, execute, fetch_count, like_pattern, SqlArg};

const SELECT_REVIEW: &str = r#"
    SELECT id, artwork_id, author_name, rating, comment, helpful, status, created_at, updated_at
    FROM reviews
"#;

/// Review repository trait
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Insert a review with the status carried by `review`
    async fn create(&self, review: &Review) -> Result<Review>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Review>>;

    /// Every review regardless of status, ordered by id
    async fn list(&self) -> Result<Vec<Review>>;

    /// Every review regardless of status, newest first
    async fn list_recent(&self) -> Result<Vec<Review>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Set the moderation status; `None` when the review does not exist
    async fn set_status(&self, id: i64, status: ReviewStatus) -> Result<Option<Review>>;

    /// Add one to the helpful counter in a single statement and return the
    /// new value; `None` when the review does not exist
    async fn increment_helpful(&self, id: i64) -> Result<Option<i64>>;

    /// Approved reviews for an artwork, newest first
    async fn list_approved_by_artwork(&self, artwork_id: i64) -> Result<Vec<Review>>;

    /// Pending reviews, oldest first
    async fn list_pending(&self) -> Result<Vec<Review>>;

    /// Approved reviews, newest first
    async fn list_approved(&self) -> Result<Vec<Review>>;

    /// Approved reviews by helpful count, then newest first
    async fn list_most_helpful(&self) -> Result<Vec<Review>>;

    /// Approved reviews with an exact rating, newest first
    async fn list_approved_by_rating(&self, rating: i32) -> Result<Vec<Review>>;

    /// Case-insensitive substring match on comment or author name,
    /// optionally restricted to one status
    async fn search(&self, term: &str, status: Option<ReviewStatus>) -> Result<Vec<Review>>;

    /// Average rating and count over approved reviews of one artwork
    async fn rating_summary(&self, artwork_id: i64) -> Result<RatingSummary>;

    async fn count(&self) -> Result<i64>;

    async fn count_by_status(&self, status: ReviewStatus) -> Result<i64>;
}

/// SQLx-based review repository implementation
pub struct SqlxReviewRepository {
    pool: DynDatabasePool,
}

impl SqlxReviewRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ReviewRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_all(&self, sql: &str, args: &[SqlArg]) -> Result<Vec<Review>> {
        match self.pool.backend()? {
            Backend::Sqlite(pool) => fetch_reviews_sqlite(pool, sql, args).await,
            Backend::Mysql(pool) => fetch_reviews_mysql(pool, sql, args).await,
        }
    }

    async fn fetch_where(&self, clause: &str, args: &[SqlArg]) -> Result<Vec<Review>> {
        let sql = format!("{} {}", SELECT_REVIEW, clause);
        self.fetch_all(&sql, args).await
    }
}

#[async_trait]
impl ReviewRepository for SqlxReviewRepository {
    async fn create(&self, review: &Review) -> Result<Review> {
        let now = Utc::now();
        let outcome = execute(
            &self.pool,
            r#"
            INSERT INTO reviews (artwork_id, author_name, rating, comment, helpful, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            &[
                SqlArg::Int(review.artwork_id),
                SqlArg::Text(review.author_name.clone()),
                SqlArg::Int(review.rating as i64),
                SqlArg::Text(review.comment.clone()),
                SqlArg::Int(review.helpful),
                SqlArg::Text(review.status.to_string()),
                SqlArg::Time(now),
                SqlArg::Time(now),
            ],
        )
        .await
        .context("Failed to create review")?;

        Ok(Review {
            id: outcome.last_insert_id,
            created_at: now,
            updated_at: now,
            ..review.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Review>> {
        let reviews = self
            .fetch_where("WHERE id = ?", &[SqlArg::Int(id)])
            .await
            .context("Failed to get review by ID")?;
        Ok(reviews.into_iter().next())
    }

    async fn list(&self) -> Result<Vec<Review>> {
        self.fetch_where("ORDER BY id ASC", &[])
            .await
            .context("Failed to list reviews")
    }

    async fn list_recent(&self) -> Result<Vec<Review>> {
        self.fetch_where("ORDER BY created_at DESC, id DESC", &[])
            .await
            .context("Failed to list recent reviews")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let outcome = execute(&self.pool, "DELETE FROM reviews WHERE id = ?", &[SqlArg::Int(id)])
            .await
            .context("Failed to delete review")?;
        Ok(outcome.rows_affected > 0)
    }

    async fn set_status(&self, id: i64, status: ReviewStatus) -> Result<Option<Review>> {
        execute(
            &self.pool,
            "UPDATE reviews SET status = ?, updated_at = ? WHERE id = ?",
            &[
                SqlArg::Text(status.to_string()),
                SqlArg::Time(Utc::now()),
                SqlArg::Int(id),
            ],
        )
        .await
        .context("Failed to update review status")?;

        self.get_by_id(id).await
    }

    async fn increment_helpful(&self, id: i64) -> Result<Option<i64>> {
        let outcome = execute(
            &self.pool,
            "UPDATE reviews SET helpful = helpful + 1, updated_at = ? WHERE id = ?",
            &[SqlArg::Time(Utc::now()), SqlArg::Int(id)],
        )
        .await
        .context("Failed to increment helpful count")?;

        // The counter always changes, so zero affected rows means no such review
        if outcome.rows_affected == 0 {
            return Ok(None);
        }

        let helpful = fetch_count(
            &self.pool,
            "SELECT helpful AS count FROM reviews WHERE id = ?",
            &[SqlArg::Int(id)],
        )
        .await
        .context("Failed to read helpful count")?;
        Ok(Some(helpful))
    }

    async fn list_approved_by_artwork(&self, artwork_id: i64) -> Result<Vec<Review>> {
        self.fetch_where(
            "WHERE artwork_id = ? AND status = ? ORDER BY created_at DESC, id DESC",
            &[
                SqlArg::Int(artwork_id),
                SqlArg::Text(ReviewStatus::Approved.to_string()),
            ],
        )
        .await
        .context("Failed to list reviews for artwork")
    }

    async fn list_pending(&self) -> Result<Vec<Review>> {
        self.fetch_where(
            "WHERE status = ? ORDER BY created_at ASC, id ASC",
            &[SqlArg::Text(ReviewStatus::Pending.to_string())],
        )
        .await
        .context("Failed to list pending reviews")
    }

    async fn list_approved(&self) -> Result<Vec<Review>> {
        self.fetch_where(
            "WHERE status = ? ORDER BY created_at DESC, id DESC",
            &[SqlArg::Text(ReviewStatus::Approved.to_string())],
        )
        .await
        .context("Failed to list approved reviews")
    }

    async fn list_most_helpful(&self) -> Result<Vec<Review>> {
        self.fetch_where(
            "WHERE status = ? ORDER BY helpful DESC, created_at DESC, id DESC",
            &[SqlArg::Text(ReviewStatus::Approved.to_string())],
        )
        .await
        .context("Failed to list most helpful reviews")
    }

    async fn list_approved_by_rating(&self, rating: i32) -> Result<Vec<Review>> {
        self.fetch_where(
            "WHERE rating = ? AND status = ? ORDER BY created_at DESC, id DESC",
            &[
                SqlArg::Int(rating as i64),
                SqlArg::Text(ReviewStatus::Approved.to_string()),
            ],
        )
        .await
        .context("Failed to list reviews by rating")
    }

    async fn search(&self, term: &str, status: Option<ReviewStatus>) -> Result<Vec<Review>> {
        let pattern = like_pattern(term);
        let mut args = vec![SqlArg::Text(pattern.clone()), SqlArg::Text(pattern)];
        let mut clause =
            String::from("WHERE (LOWER(comment) LIKE LOWER(?) ESCAPE '!' OR LOWER(author_name) LIKE LOWER(?) ESCAPE '!')");
        if let Some(status) = status {
            clause.push_str(" AND status = ?");
            args.push(SqlArg::Text(status.to_string()));
        }
        clause.push_str(" ORDER BY created_at DESC, id DESC");

        self.fetch_where(&clause, &args)
            .await
            .context("Failed to search reviews")
    }

    async fn rating_summary(&self, artwork_id: i64) -> Result<RatingSummary> {
        let args = [
            SqlArg::Int(artwork_id),
            SqlArg::Text(ReviewStatus::Approved.to_string()),
        ];
        let (average, count): (Option<f64>, i64) = match self.pool.backend()? {
            Backend::Sqlite(pool) => {
                let row = bind_sqlite(
                    sqlx::query(
                        "SELECT AVG(rating) AS average, COUNT(*) AS count FROM reviews WHERE artwork_id = ? AND status = ?",
                    ),
                    &args,
                )
                .fetch_one(pool)
                .await
                .context("Failed to compute rating summary")?;
                (row.try_get("average")?, row.try_get("count")?)
            }
            Backend::Mysql(pool) => {
                // AVG over INT yields DECIMAL in MySQL
                let row = bind_mysql(
                    sqlx::query(
                        "SELECT CAST(AVG(rating) AS DOUBLE) AS average, COUNT(*) AS count FROM reviews WHERE artwork_id = ? AND status = ?",
                    ),
                    &args,
                )
                .fetch_one(pool)
                .await
                .context("Failed to compute rating summary")?;
                (row.try_get("average")?, row.try_get("count")?)
            }
        };

        Ok(RatingSummary {
            average: average.unwrap_or(0.0),
            count,
        })
    }

    async fn count(&self) -> Result<i64> {
        fetch_count(&self.pool, "SELECT COUNT(*) AS count FROM reviews", &[])
            .await
            .context("Failed to count reviews")
    }

    async fn count_by_status(&self, status: ReviewStatus) -> Result<i64> {
        fetch_count(
            &self.pool,
            "SELECT COUNT(*) AS count FROM reviews WHERE status = ?",
            &[SqlArg::Text(status.to_string())],
        )
        .await
        .context("Failed to count reviews by status")
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn fetch_reviews_sqlite(pool: &SqlitePool, sql: &str, args: &[SqlArg]) -> Result<Vec<Review>> {
    let rows = bind_sqlite(sqlx::query(sql), args).fetch_all(pool).await?;
    rows.iter().map(row_to_review_sqlite).collect()
}

fn row_to_review_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Review> {
    let status_str: String = row.try_get("status")?;
    let status = ReviewStatus::from_str(&status_str)
        .with_context(|| format!("Invalid review status in database: {}", status_str))?;

    Ok(Review {
        id: row.try_get("id")?,
        artwork_id: row.try_get("artwork_id")?,
        author_name: row.try_get("author_name")?,
        rating: row.try_get("rating")?,
        comment: row.try_get("comment")?,
        helpful: row.try_get("helpful")?,
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn fetch_reviews_mysql(pool: &MySqlPool, sql: &str, args: &[SqlArg]) -> Result<Vec<Review>> {
    let rows = bind_mysql(sqlx::query(sql), args).fetch_all(pool).await?;
    rows.iter().map(row_to_review_mysql).collect()
}

fn row_to_review_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Review> {
    let status_str: String = row.try_get("status")?;
    let status = ReviewStatus::from_str(&status_str)
        .with_context(|| format!("Invalid review status in database: {}", status_str))?;

    Ok(Review {
        id: row.try_get("id")?,
        artwork_id: row.try_get("artwork_id")?,
        author_name: row.try_get("author_name")?,
        rating: row.try_get("rating")?,
        comment: row.try_get("comment")?,
        helpful: row.try_get("helpful")?,
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
