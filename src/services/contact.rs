//! Contact service
//!
//! Public contact form intake and the admin inbox. The read and responded
//! flags only ever move from false to true.

use crate::db::repositories::ContactRepository;
use crate::models::{ContactMessage, ContactStats, CreateContactInput};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Error types for contact service operations
#[derive(Debug, thiserror::Error)]
pub enum ContactServiceError {
    #[error("Contact message not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct ContactService {
    repo: Arc<dyn ContactRepository>,
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactRepository>) -> Self {
        Self { repo }
    }

    /// Store a message from the public form with both flags cleared
    pub async fn create(&self, input: CreateContactInput) -> Result<ContactMessage, ContactServiceError> {
        let message = input
            .into_message()
            .map_err(ContactServiceError::ValidationError)?;
        let created = self.repo.create(&message).await?;
        tracing::info!(id = created.id, "Contact message received");
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<ContactMessage, ContactServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ContactServiceError::NotFound(id))
    }

    /// Every message, newest first
    pub async fn list(&self) -> Result<Vec<ContactMessage>, ContactServiceError> {
        Ok(self.repo.list().await?)
    }

    pub async fn mark_read(&self, id: i64) -> Result<ContactMessage, ContactServiceError> {
        self.repo
            .mark_read(id)
            .await?
            .ok_or(ContactServiceError::NotFound(id))
    }

    pub async fn mark_responded(&self, id: i64) -> Result<ContactMessage, ContactServiceError> {
        self.repo
            .mark_responded(id)
            .await?
            .ok_or(ContactServiceError::NotFound(id))
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContactServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ContactServiceError::NotFound(id));
        }
        tracing::info!(id, "Contact message deleted");
        Ok(())
    }

    pub async fn list_unread(&self) -> Result<Vec<ContactMessage>, ContactServiceError> {
        Ok(self.repo.list_unread().await?)
    }

    pub async fn list_unresponded(&self) -> Result<Vec<ContactMessage>, ContactServiceError> {
        Ok(self.repo.list_unresponded().await?)
    }

    /// Unread messages in arrival order
    pub async fn list_oldest_unread(&self) -> Result<Vec<ContactMessage>, ContactServiceError> {
        Ok(self.repo.list_oldest_unread().await?)
    }

    pub async fn list_by_email(&self, email: &str) -> Result<Vec<ContactMessage>, ContactServiceError> {
        Ok(self.repo.list_by_email(email.trim()).await?)
    }

    pub async fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ContactMessage>, ContactServiceError> {
        if start > end {
            return Err(ContactServiceError::ValidationError(
                "start must not be after end".to_string(),
            ));
        }
        Ok(self.repo.list_by_date_range(start, end).await?)
    }

    /// Case-insensitive search; a blank term returns every message
    pub async fn search(&self, term: &str) -> Result<Vec<ContactMessage>, ContactServiceError> {
        if term.trim().is_empty() {
            return self.list().await;
        }
        Ok(self.repo.search(term).await?)
    }

    pub async fn count_unread(&self) -> Result<i64, ContactServiceError> {
        Ok(self.repo.count_unread().await?)
    }

    pub async fn count_unresponded(&self) -> Result<i64, ContactServiceError> {
        Ok(self.repo.count_unresponded().await?)
    }

    pub async fn stats(&self) -> Result<ContactStats, ContactServiceError> {
        Ok(ContactStats {
            total_messages: self.repo.count().await?,
            unread_messages: self.repo.count_unread().await?,
            unresponded_messages: self.repo.count_unresponded().await?,
            by_read_status: self.repo.count_by_read_status().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxContactRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::ReadStatusCount;
    use chrono::Duration;

    async fn setup_test_service() -> ContactService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ContactService::new(SqlxContactRepository::boxed(pool))
    }

    fn input(name: &str, email: &str) -> CreateContactInput {
        CreateContactInput {
            name: name.to_string(),
            email: email.to_string(),
            subject: Some("Visit".to_string()),
            message: format!("Message from {}", name),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_create_starts_unread_and_unresponded() {
        let service = setup_test_service().await;
        let created = service.create(input("Alice", "alice@example.com")).await.unwrap();

        assert!(created.id > 0);
        assert!(!created.is_read);
        assert!(!created.is_responded);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let service = setup_test_service().await;
        let result = service.create(input("", "alice@example.com")).await;
        assert!(matches!(result, Err(ContactServiceError::ValidationError(_))));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flags_are_sticky() {
        let service = setup_test_service().await;
        let created = service.create(input("Bob", "bob@example.com")).await.unwrap();

        let read = service.mark_read(created.id).await.unwrap();
        assert!(read.is_read);
        let responded = service.mark_responded(created.id).await.unwrap();
        assert!(responded.is_read);
        assert!(responded.is_responded);

        let again = service.mark_read(created.id).await.unwrap();
        assert!(again.is_read && again.is_responded);

        assert!(matches!(service.mark_read(77).await, Err(ContactServiceError::NotFound(77))));
        assert!(matches!(service.mark_responded(77).await, Err(ContactServiceError::NotFound(77))));
    }

    #[tokio::test]
    async fn test_queries_and_stats() {
        let service = setup_test_service().await;
        let first = service.create(input("Carla", "carla@example.com")).await.unwrap();
        let second = service.create(input("Dan", "dan@example.com")).await.unwrap();
        service.create(input("Carla", "carla@example.com")).await.unwrap();
        service.mark_read(second.id).await.unwrap();

        assert_eq!(service.list_unread().await.unwrap().len(), 2);
        assert_eq!(service.list_unresponded().await.unwrap().len(), 3);
        assert_eq!(service.list_oldest_unread().await.unwrap()[0].id, first.id);
        assert_eq!(service.list_by_email(" carla@example.com ").await.unwrap().len(), 2);
        assert_eq!(service.search("DAN").await.unwrap().len(), 1);
        assert_eq!(service.search("").await.unwrap().len(), 3);

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.unread_messages, 2);
        assert_eq!(stats.unresponded_messages, 3);
        assert_eq!(
            stats.by_read_status,
            vec![
                ReadStatusCount { is_read: false, count: 2 },
                ReadStatusCount { is_read: true, count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_date_range() {
        let service = setup_test_service().await;
        service.create(input("Eve", "eve@example.com")).await.unwrap();
        let now = Utc::now();

        let hits = service
            .list_by_date_range(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let inverted = service
            .list_by_date_range(now + Duration::hours(1), now - Duration::hours(1))
            .await;
        assert!(matches!(inverted, Err(ContactServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = setup_test_service().await;
        let created = service.create(input("Finn", "finn@example.com")).await.unwrap();
        service.delete(created.id).await.unwrap();
        assert!(matches!(service.delete(created.id).await, Err(ContactServiceError::NotFound(_))));
        assert!(matches!(service.get_by_id(created.id).await, Err(ContactServiceError::NotFound(_))));
    }
}
