//! Artwork service
//!
//! Implements business logic for the gallery catalogue:
//! - CRUD with model-level validation
//! - Free-text and filtered search, recent/alphabetical listings
//! - Image upload into the configured directory and serving it back
//! - Grouped counts used by the dashboard

use crate::db::repositories::ArtworkRepository;
use crate::models::{
    Artwork, ArtworkFilter, ArtworkInput, ListParams, PagedResult, TechniqueCount, YearCount,
};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

/// Public path prefix under which stored images are served
pub const IMAGE_URL_PREFIX: &str = "/api/artworks/images/";

/// Error types for artwork service operations
#[derive(Debug, thiserror::Error)]
pub enum ArtworkServiceError {
    /// Artwork not found
    #[error("Artwork not found: {0}")]
    NotFound(i64),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Stored image not found
    #[error("Image not found: {0}")]
    ImageNotFound(String),

    /// Reading or writing the upload directory failed
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Artwork service
pub struct ArtworkService {
    repo: Arc<dyn ArtworkRepository>,
    upload_dir: PathBuf,
}

impl ArtworkService {
    /// Create a new artwork service storing uploads under `upload_dir`
    pub fn new(repo: Arc<dyn ArtworkRepository>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Validate and insert a new artwork
    pub async fn create(&self, input: ArtworkInput) -> Result<Artwork, ArtworkServiceError> {
        let artwork = input
            .into_artwork()
            .map_err(ArtworkServiceError::ValidationError)?;

        let created = self.repo.create(&artwork).await?;
        tracing::info!(id = created.id, title = %created.title, "Artwork created");
        Ok(created)
    }

    /// Get an artwork by id
    pub async fn get_by_id(&self, id: i64) -> Result<Artwork, ArtworkServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ArtworkServiceError::NotFound(id))
    }

    /// Every artwork, ordered by id
    pub async fn list(&self) -> Result<Vec<Artwork>, ArtworkServiceError> {
        Ok(self.repo.list().await?)
    }

    /// One page of the id-ordered listing plus the total count
    pub async fn list_paged(
        &self,
        params: &ListParams,
    ) -> Result<PagedResult<Artwork>, ArtworkServiceError> {
        let items = self.repo.list_paged(params.offset(), params.limit()).await?;
        let total = self.repo.count().await?;
        Ok(PagedResult::new(items, total, params))
    }

    /// Replace every mutable field of an existing artwork.
    ///
    /// Optional fields missing from the input are cleared.
    pub async fn update(&self, id: i64, input: ArtworkInput) -> Result<Artwork, ArtworkServiceError> {
        let mut artwork = input
            .into_artwork()
            .map_err(ArtworkServiceError::ValidationError)?;
        artwork.id = id;

        self.repo
            .update(&artwork)
            .await?
            .ok_or(ArtworkServiceError::NotFound(id))
    }

    /// Delete an artwork together with its reviews
    pub async fn delete(&self, id: i64) -> Result<(), ArtworkServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ArtworkServiceError::NotFound(id));
        }
        tracing::info!(id, "Artwork deleted");
        Ok(())
    }

    /// Case-insensitive match on title, description or technique.
    /// A blank term returns everything.
    pub async fn search(&self, term: &str) -> Result<Vec<Artwork>, ArtworkServiceError> {
        if term.trim().is_empty() {
            return self.list().await;
        }
        Ok(self.repo.search(term).await?)
    }

    /// Structured search; unset filters are ignored
    pub async fn filter(&self, filter: &ArtworkFilter) -> Result<Vec<Artwork>, ArtworkServiceError> {
        if filter.is_empty() {
            return self.list().await;
        }
        Ok(self.repo.filter(filter).await?)
    }

    pub async fn list_recent(&self) -> Result<Vec<Artwork>, ArtworkServiceError> {
        Ok(self.repo.list_recent().await?)
    }

    pub async fn list_alphabetical(&self) -> Result<Vec<Artwork>, ArtworkServiceError> {
        Ok(self.repo.list_alphabetical().await?)
    }

    /// Artworks whose technique contains `technique`, ignoring case
    pub async fn list_by_technique(&self, technique: &str) -> Result<Vec<Artwork>, ArtworkServiceError> {
        self.filter(&ArtworkFilter::new(None, Some(technique.to_string()), None))
            .await
    }

    pub async fn list_by_year(&self, year: i32) -> Result<Vec<Artwork>, ArtworkServiceError> {
        self.filter(&ArtworkFilter::new(None, None, Some(year))).await
    }

    pub async fn count(&self) -> Result<i64, ArtworkServiceError> {
        Ok(self.repo.count().await?)
    }

    pub async fn count_by_technique(&self) -> Result<Vec<TechniqueCount>, ArtworkServiceError> {
        Ok(self.repo.count_by_technique().await?)
    }

    /// Counts per year, most recent year first
    pub async fn count_by_year(&self) -> Result<Vec<YearCount>, ArtworkServiceError> {
        Ok(self.repo.count_by_year().await?)
    }

    /// Write an uploaded image to the upload directory and return its public URL.
    ///
    /// The stored name is a fresh UUID followed by the sanitized original
    /// name, so concurrent uploads never overwrite each other.
    pub async fn store_image(
        &self,
        original_name: &str,
        data: &[u8],
    ) -> Result<String, ArtworkServiceError> {
        if data.is_empty() {
            return Err(ArtworkServiceError::ValidationError(
                "Uploaded file is empty".to_string(),
            ));
        }

        fs::create_dir_all(&self.upload_dir)
            .await
            .with_context(|| format!("Failed to create upload dir {:?}", self.upload_dir))
            .map_err(|e| ArtworkServiceError::StorageError(format!("{:#}", e)))?;

        let file_name = format!("{}_{}", Uuid::new_v4(), sanitize_file_name(original_name));
        let path = self.upload_dir.join(&file_name);
        fs::write(&path, data)
            .await
            .map_err(|e| ArtworkServiceError::StorageError(format!("Failed to save file: {}", e)))?;

        tracing::info!(file = %file_name, size = data.len(), "Artwork image stored");
        Ok(format!("{}{}", IMAGE_URL_PREFIX, file_name))
    }

    /// Read a stored image, returning its bytes and content type
    pub async fn read_image(
        &self,
        file_name: &str,
    ) -> Result<(Vec<u8>, &'static str), ArtworkServiceError> {
        if !is_plain_file_name(file_name) {
            return Err(ArtworkServiceError::ImageNotFound(file_name.to_string()));
        }

        match fs::read(self.upload_dir.join(file_name)).await {
            Ok(contents) => Ok((contents, content_type_for(file_name))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ArtworkServiceError::ImageNotFound(file_name.to_string()))
            }
            Err(e) => Err(ArtworkServiceError::StorageError(format!(
                "Failed to read file: {}",
                e
            ))),
        }
    }
}

/// Keep only the final path component and replace anything outside
/// `[A-Za-z0-9._-]` with `_`
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

/// Get content type from file extension
fn content_type_for(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxArtworkRepository;
    use crate::db::{create_test_pool, migrations};
    use tempfile::TempDir;

    async fn setup_test_service() -> (TempDir, ArtworkService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let dir = TempDir::new().unwrap();
        let service = ArtworkService::new(
            SqlxArtworkRepository::boxed(pool),
            dir.path().join("uploads"),
        );
        (dir, service)
    }

    fn input(title: &str, technique: Option<&str>, year: i32) -> ArtworkInput {
        ArtworkInput {
            title: title.to_string(),
            description: Some(format!("About {}", title)),
            technique: technique.map(str::to_string),
            dimensions: None,
            year: Some(year),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_dir, service) = setup_test_service().await;
        let created = service
            .create(input("Water Lilies", Some("Oil"), 1916))
            .await
            .unwrap();

        let fetched = service.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.title, "Water Lilies");
        assert_eq!(fetched.year, 1916);
    }

    #[tokio::test]
    async fn test_create_validation_error() {
        let (_dir, service) = setup_test_service().await;
        let mut bad = input("x", None, 2000);
        bad.year = None;

        let result = service.create(bad).await;
        assert!(matches!(result, Err(ArtworkServiceError::ValidationError(_))));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let (_dir, service) = setup_test_service().await;

        assert!(matches!(service.get_by_id(9).await, Err(ArtworkServiceError::NotFound(9))));
        assert!(matches!(
            service.update(9, input("x", None, 2000)).await,
            Err(ArtworkServiceError::NotFound(9))
        ));
        assert!(matches!(service.delete(9).await, Err(ArtworkServiceError::NotFound(9))));
    }

    #[tokio::test]
    async fn test_update_clears_absent_optionals() {
        let (_dir, service) = setup_test_service().await;
        let created = service
            .create(input("Sketch", Some("Charcoal"), 1890))
            .await
            .unwrap();

        let replacement = ArtworkInput {
            title: "Final Sketch".to_string(),
            year: Some(1891),
            ..Default::default()
        };
        let updated = service.update(created.id, replacement).await.unwrap();
        assert_eq!(updated.title, "Final Sketch");
        assert_eq!(updated.year, 1891);
        assert!(updated.technique.is_none());
        assert!(updated.description.is_none());
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_search_and_filters() {
        let (_dir, service) = setup_test_service().await;
        service.create(input("XABCY", Some("Oil on canvas"), 1900)).await.unwrap();
        service.create(input("Bridge", Some("Watercolor"), 1900)).await.unwrap();
        service.create(input("Harbor", Some("oil"), 1910)).await.unwrap();

        assert_eq!(service.search("abc").await.unwrap().len(), 1);
        assert_eq!(service.search("  ").await.unwrap().len(), 3);

        let oils = service.list_by_technique("OIL").await.unwrap();
        assert_eq!(oils.len(), 2);

        assert_eq!(service.list_by_year(1900).await.unwrap().len(), 2);

        let filtered = service
            .filter(&ArtworkFilter::new(None, Some("oil".to_string()), Some(1910)))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Harbor");

        assert_eq!(service.filter(&ArtworkFilter::default()).await.unwrap().len(), 3);

        let titles: Vec<_> = service
            .list_alphabetical()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, ["Bridge", "Harbor", "XABCY"]);
    }

    #[tokio::test]
    async fn test_list_paged() {
        let (_dir, service) = setup_test_service().await;
        for i in 0..5 {
            service.create(input(&format!("Study {}", i), None, 2000 + i)).await.unwrap();
        }

        let page = service.list_paged(&ListParams::new(2, 2)).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title, "Study 2");
        assert!(page.has_next());
    }

    #[tokio::test]
    async fn test_store_and_read_image() {
        let (_dir, service) = setup_test_service().await;
        let url = service
            .store_image("../../my painting.PNG", b"\x89PNG fake")
            .await
            .unwrap();

        assert!(url.starts_with(IMAGE_URL_PREFIX));
        assert!(url.ends_with("_my_painting.PNG"));

        let file_name = url.trim_start_matches(IMAGE_URL_PREFIX);
        let (bytes, content_type) = service.read_image(file_name).await.unwrap();
        assert_eq!(bytes, b"\x89PNG fake");
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn test_same_name_uploads_do_not_collide() {
        let (_dir, service) = setup_test_service().await;
        let first = service.store_image("a.jpg", b"one").await.unwrap();
        let second = service.store_image("a.jpg", b"two").await.unwrap();
        assert_ne!(first, second);

        let (bytes, _) = service
            .read_image(first.trim_start_matches(IMAGE_URL_PREFIX))
            .await
            .unwrap();
        assert_eq!(bytes, b"one");
    }

    #[tokio::test]
    async fn test_read_image_rejects_traversal_and_missing() {
        let (_dir, service) = setup_test_service().await;
        for name in ["../secret", "..", "a/b.png", ".hidden", "missing.png"] {
            assert!(matches!(
                service.read_image(name).await,
                Err(ArtworkServiceError::ImageNotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let (_dir, service) = setup_test_service().await;
        assert!(matches!(
            service.store_image("a.png", b"").await,
            Err(ArtworkServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("photo.jpg"), "photo.jpg");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\pic 1.png"), "pic_1.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("..."), "image");
        assert_eq!(sanitize_file_name(""), "image");
        assert_eq!(sanitize_file_name("tableau-é.jpg"), "tableau-_.jpg");
    }
}
