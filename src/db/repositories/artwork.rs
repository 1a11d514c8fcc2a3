//! Artwork repository
//!
//! Database operations for artworks.
//!
//! This module provides:
//! - `ArtworkRepository` trait defining the interface for artwork data access
//! - `SqlxArtworkRepository` implementing the trait for SQLite and MySQL

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Artwork, ArtworkFilter, TechniqueCount, YearCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::{bind_mysql, bind_sqlite, execute, fetch_count, like_pattern, SqlArg};

const SELECT_ARTWORK: &str = r#"
    SELECT id, title, description, technique, dimensions, year, image_url, created_at, updated_at
    FROM artworks
"#;

/// Artwork repository trait
#[async_trait]
pub trait ArtworkRepository: Send + Sync {
    /// Insert a new artwork, returning it with its id and timestamps
    async fn create(&self, artwork: &Artwork) -> Result<Artwork>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Artwork>>;

    /// All artworks ordered by id
    async fn list(&self) -> Result<Vec<Artwork>>;

    /// One page of artworks ordered by id
    async fn list_paged(&self, offset: i64, limit: i64) -> Result<Vec<Artwork>>;

    async fn count(&self) -> Result<i64>;

    /// Overwrite every mutable field; `None` when the id does not exist
    async fn update(&self, artwork: &Artwork) -> Result<Option<Artwork>>;

    /// Delete an artwork; returns whether a row was removed
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Case-insensitive substring match across title, description and technique
    async fn search(&self, term: &str) -> Result<Vec<Artwork>>;

    /// Structured search, every set filter combined with AND
    async fn filter(&self, filter: &ArtworkFilter) -> Result<Vec<Artwork>>;

    /// Newest first
    async fn list_recent(&self) -> Result<Vec<Artwork>>;

    /// Ordered by title
    async fn list_alphabetical(&self) -> Result<Vec<Artwork>>;

    async fn count_by_technique(&self) -> Result<Vec<TechniqueCount>>;

    /// Ordered by year, most recent first
    async fn count_by_year(&self) -> Result<Vec<YearCount>>;
}

/// SQLx-based artwork repository implementation
pub struct SqlxArtworkRepository {
    pool: DynDatabasePool,
}

impl SqlxArtworkRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArtworkRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_all(&self, sql: &str, args: &[SqlArg]) -> Result<Vec<Artwork>> {
        match self.pool.backend()? {
            Backend::Sqlite(pool) => fetch_artworks_sqlite(pool, sql, args).await,
            Backend::Mysql(pool) => fetch_artworks_mysql(pool, sql, args).await,
        }
    }

    async fn fetch_optional(&self, sql: &str, args: &[SqlArg]) -> Result<Option<Artwork>> {
        Ok(self.fetch_all(sql, args).await?.into_iter().next())
    }
}

#[async_trait]
impl ArtworkRepository for SqlxArtworkRepository {
    async fn create(&self, artwork: &Artwork) -> Result<Artwork> {
        let now = Utc::now();
        let outcome = execute(
            &self.pool,
            r#"
            INSERT INTO artworks (title, description, technique, dimensions, year, image_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            &[
                SqlArg::Text(artwork.title.clone()),
                SqlArg::OptText(artwork.description.clone()),
                SqlArg::OptText(artwork.technique.clone()),
                SqlArg::OptText(artwork.dimensions.clone()),
                SqlArg::Int(artwork.year as i64),
                SqlArg::OptText(artwork.image_url.clone()),
                SqlArg::Time(now),
                SqlArg::Time(now),
            ],
        )
        .await
        .context("Failed to create artwork")?;

        Ok(Artwork {
            id: outcome.last_insert_id,
            created_at: now,
            updated_at: now,
            ..artwork.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Artwork>> {
        let sql = format!("{} WHERE id = ?", SELECT_ARTWORK);
        self.fetch_optional(&sql, &[SqlArg::Int(id)])
            .await
            .context("Failed to get artwork by ID")
    }

    async fn list(&self) -> Result<Vec<Artwork>> {
        let sql = format!("{} ORDER BY id ASC", SELECT_ARTWORK);
        self.fetch_all(&sql, &[]).await.context("Failed to list artworks")
    }

    async fn list_paged(&self, offset: i64, limit: i64) -> Result<Vec<Artwork>> {
        let sql = format!("{} ORDER BY id ASC LIMIT ? OFFSET ?", SELECT_ARTWORK);
        self.fetch_all(&sql, &[SqlArg::Int(limit), SqlArg::Int(offset)])
            .await
            .context("Failed to list artworks page")
    }

    async fn count(&self) -> Result<i64> {
        fetch_count(&self.pool, "SELECT COUNT(*) AS count FROM artworks", &[])
            .await
            .context("Failed to count artworks")
    }

    async fn update(&self, artwork: &Artwork) -> Result<Option<Artwork>> {
        execute(
            &self.pool,
            r#"
            UPDATE artworks
            SET title = ?, description = ?, technique = ?, dimensions = ?, year = ?, image_url = ?, updated_at = ?
            WHERE id = ?
            "#,
            &[
                SqlArg::Text(artwork.title.clone()),
                SqlArg::OptText(artwork.description.clone()),
                SqlArg::OptText(artwork.technique.clone()),
                SqlArg::OptText(artwork.dimensions.clone()),
                SqlArg::Int(artwork.year as i64),
                SqlArg::OptText(artwork.image_url.clone()),
                SqlArg::Time(Utc::now()),
                SqlArg::Int(artwork.id),
            ],
        )
        .await
        .context("Failed to update artwork")?;

        // MySQL reports unchanged rows as unaffected, so existence is read back
        self.get_by_id(artwork.id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let outcome = execute(&self.pool, "DELETE FROM artworks WHERE id = ?", &[SqlArg::Int(id)])
            .await
            .context("Failed to delete artwork")?;
        Ok(outcome.rows_affected > 0)
    }

    async fn search(&self, term: &str) -> Result<Vec<Artwork>> {
        let pattern = like_pattern(term);
        let sql = format!(
            r#"{}
            WHERE LOWER(title) LIKE LOWER(?) ESCAPE '!'
               OR LOWER(description) LIKE LOWER(?) ESCAPE '!'
               OR LOWER(technique) LIKE LOWER(?) ESCAPE '!'
            ORDER BY id ASC"#,
            SELECT_ARTWORK
        );
        self.fetch_all(
            &sql,
            &[
                SqlArg::Text(pattern.clone()),
                SqlArg::Text(pattern.clone()),
                SqlArg::Text(pattern),
            ],
        )
        .await
        .context("Failed to search artworks")
    }

    async fn filter(&self, filter: &ArtworkFilter) -> Result<Vec<Artwork>> {
        let mut conditions = Vec::new();
        let mut args = Vec::new();

        if let Some(title) = &filter.title {
            conditions.push("LOWER(title) LIKE LOWER(?) ESCAPE '!'");
            args.push(SqlArg::Text(like_pattern(title)));
        }
        if let Some(technique) = &filter.technique {
            conditions.push("LOWER(technique) LIKE LOWER(?) ESCAPE '!'");
            args.push(SqlArg::Text(like_pattern(technique)));
        }
        if let Some(year) = filter.year {
            conditions.push("year = ?");
            args.push(SqlArg::Int(year as i64));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!("{} {} ORDER BY id ASC", SELECT_ARTWORK, where_clause);

        self.fetch_all(&sql, &args)
            .await
            .context("Failed to filter artworks")
    }

    async fn list_recent(&self) -> Result<Vec<Artwork>> {
        let sql = format!("{} ORDER BY created_at DESC, id DESC", SELECT_ARTWORK);
        self.fetch_all(&sql, &[])
            .await
            .context("Failed to list recent artworks")
    }

    async fn list_alphabetical(&self) -> Result<Vec<Artwork>> {
        let sql = format!("{} ORDER BY LOWER(title) ASC, id ASC", SELECT_ARTWORK);
        self.fetch_all(&sql, &[])
            .await
            .context("Failed to list artworks by title")
    }

    async fn count_by_technique(&self) -> Result<Vec<TechniqueCount>> {
        let sql = r#"
            SELECT technique, COUNT(*) AS count
            FROM artworks
            WHERE technique IS NOT NULL
            GROUP BY technique
            ORDER BY count DESC, technique ASC
        "#;
        match self.pool.backend()? {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to count artworks by technique")?;
                rows.iter()
                    .map(|row| -> Result<TechniqueCount> {
                        Ok(TechniqueCount {
                            technique: row.try_get("technique")?,
                            count: row.try_get("count")?,
                        })
                    })
                    .collect()
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to count artworks by technique")?;
                rows.iter()
                    .map(|row| -> Result<TechniqueCount> {
                        Ok(TechniqueCount {
                            technique: row.try_get("technique")?,
                            count: row.try_get("count")?,
                        })
                    })
                    .collect()
            }
        }
    }

    async fn count_by_year(&self) -> Result<Vec<YearCount>> {
        let sql = "SELECT year, COUNT(*) AS count FROM artworks GROUP BY year ORDER BY year DESC";
        match self.pool.backend()? {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to count artworks by year")?;
                rows.iter()
                    .map(|row| -> Result<YearCount> {
                        Ok(YearCount {
                            year: row.try_get("year")?,
                            count: row.try_get("count")?,
                        })
                    })
                    .collect()
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to count artworks by year")?;
                rows.iter()
                    .map(|row| -> Result<YearCount> {
                        Ok(YearCount {
                            year: row.try_get("year")?,
                            count: row.try_get("count")?,
                        })
                    })
                    .collect()
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn fetch_artworks_sqlite(pool: &SqlitePool, sql: &str, args: &[SqlArg]) -> Result<Vec<Artwork>> {
    let rows = bind_sqlite(sqlx::query(sql), args).fetch_all(pool).await?;
    rows.iter().map(row_to_artwork_sqlite).collect()
}

fn row_to_artwork_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Artwork> {
    Ok(Artwork {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        technique: row.try_get("technique")?,
        dimensions: row.try_get("dimensions")?,
        year: row.try_get("year")?,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn fetch_artworks_mysql(pool: &MySqlPool, sql: &str, args: &[SqlArg]) -> Result<Vec<Artwork>> {
    let rows = bind_mysql(sqlx::query(sql), args).fetch_all(pool).await?;
    rows.iter().map(row_to_artwork_mysql).collect()
}

fn row_to_artwork_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Artwork> {
    Ok(Artwork {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        technique: row.try_get("technique")?,
        dimensions: row.try_get("dimensions")?,
        year: row.try_get("year")?,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::models::ArtworkInput;

    async fn setup() -> SqlxArtworkRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxArtworkRepository::new(pool)
    }

    fn artwork(title: &str, technique: Option<&str>, year: i32) -> Artwork {
        ArtworkInput {
            title: title.to_string(),
            description: Some(format!("About {}", title)),
            technique: technique.map(str::to_string),
            dimensions: None,
            year: Some(year),
            image_url: None,
        }
        .into_artwork()
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;
        let created = repo.create(&artwork("Nocturne", Some("Oil"), 1875)).await.unwrap();
        assert!(created.id > 0);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Nocturne");
        assert_eq!(fetched.technique.as_deref(), Some("Oil"));
        assert_eq!(fetched.year, 1875);
        assert!(fetched.dimensions.is_none());

        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_ordered_by_id_and_paged() {
        let repo = setup().await;
        for title in ["C", "A", "B"] {
            repo.create(&artwork(title, None, 2000)).await.unwrap();
        }

        let all = repo.list().await.unwrap();
        let titles: Vec<_> = all.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["C", "A", "B"]);

        let page = repo.list_paged(1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "A");
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_update_overwrites_all_fields() {
        let repo = setup().await;
        let created = repo.create(&artwork("Draft", Some("Ink"), 1999)).await.unwrap();

        let mut changed = artwork("Final", None, 2001);
        changed.id = created.id;
        let updated = repo.update(&changed).await.unwrap().unwrap();

        assert_eq!(updated.title, "Final");
        assert!(updated.technique.is_none());
        assert_eq!(updated.year, 2001);
        assert!(updated.updated_at >= created.updated_at);

        let mut missing = changed.clone();
        missing.id = 4242;
        assert!(repo.update(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        let created = repo.create(&artwork("Gone", None, 1900)).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let repo = setup().await;
        repo.create(&artwork("XABCY", None, 2010)).await.unwrap();
        repo.create(&artwork("Other", Some("watercolour"), 2011)).await.unwrap();

        let found = repo.search("abc").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "XABCY");

        // description and technique are searched too
        assert_eq!(repo.search("WATER").await.unwrap().len(), 1);
        assert_eq!(repo.search("about").await.unwrap().len(), 2);
        assert!(repo.search("nothing-like-this").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filter_combines_with_and() {
        let repo = setup().await;
        repo.create(&artwork("Blue Study", Some("Oil"), 1901)).await.unwrap();
        repo.create(&artwork("Blue Period", Some("Gouache"), 1903)).await.unwrap();
        repo.create(&artwork("Red Room", Some("Oil"), 1901)).await.unwrap();

        let all = repo.filter(&ArtworkFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let blue = repo
            .filter(&ArtworkFilter::new(Some("blue".into()), None, None))
            .await
            .unwrap();
        assert_eq!(blue.len(), 2);

        let oil_1901 = repo
            .filter(&ArtworkFilter::new(None, Some("OIL".into()), Some(1901)))
            .await
            .unwrap();
        assert_eq!(oil_1901.len(), 2);

        let narrow = repo
            .filter(&ArtworkFilter::new(Some("blue".into()), Some("oil".into()), Some(1901)))
            .await
            .unwrap();
        assert_eq!(narrow.len(), 1);
        assert_eq!(narrow[0].title, "Blue Study");
    }

    #[tokio::test]
    async fn test_recent_and_alphabetical_order() {
        let repo = setup().await;
        repo.create(&artwork("banana", None, 2000)).await.unwrap();
        repo.create(&artwork("Apple", None, 2000)).await.unwrap();
        repo.create(&artwork("cherry", None, 2000)).await.unwrap();

        let recent: Vec<_> = repo.list_recent().await.unwrap().into_iter().map(|a| a.title).collect();
        assert_eq!(recent, ["cherry", "Apple", "banana"]);

        let alpha: Vec<_> = repo
            .list_alphabetical()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(alpha, ["Apple", "banana", "cherry"]);
    }

    #[tokio::test]
    async fn test_grouped_counts() {
        let repo = setup().await;
        repo.create(&artwork("a", Some("Oil"), 1990)).await.unwrap();
        repo.create(&artwork("b", Some("Oil"), 2005)).await.unwrap();
        repo.create(&artwork("c", Some("Ink"), 2005)).await.unwrap();
        repo.create(&artwork("d", None, 1980)).await.unwrap();

        let by_technique = repo.count_by_technique().await.unwrap();
        assert_eq!(
            by_technique,
            vec![
                TechniqueCount { technique: "Oil".into(), count: 2 },
                TechniqueCount { technique: "Ink".into(), count: 1 },
            ]
        );

        let by_year = repo.count_by_year().await.unwrap();
        assert_eq!(
            by_year,
            vec![
                YearCount { year: 2005, count: 2 },
                YearCount { year: 1990, count: 1 },
                YearCount { year: 1980, count: 1 },
            ]
        );
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(16))]

            #[test]
            fn prop_search_ignores_case(needle in "[a-z]{1,8}") {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async {
                    let repo = setup().await;
                    let title = format!("X{}Y", needle.to_uppercase());
                    repo.create(&artwork(&title, None, 2000)).await.unwrap();

                    let found = repo.search(&needle).await.unwrap();
                    assert_eq!(found.len(), 1);
                    assert_eq!(found[0].title, title);
                });
            }
        }
    }
}
