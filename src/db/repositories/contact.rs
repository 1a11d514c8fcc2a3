//! Contact message repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::{ContactMessage, ReadStatusCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::{bind_mysql, bind_sqlite, execute, fetch_count, like_pattern, SqlArg};

const SELECT_MESSAGE: &str = r#"
    SELECT id, name, email, subject, message, phone, is_read, is_responded, created_at, updated_at
    FROM contact_messages
"#;

/// Contact message repository trait
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, message: &ContactMessage) -> Result<ContactMessage>;

    async fn get_by_id(&self, id: i64) -> Result<Option<ContactMessage>>;

    /// All messages, newest first
    async fn list(&self) -> Result<Vec<ContactMessage>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Set the read flag; `None` when the message does not exist
    async fn mark_read(&self, id: i64) -> Result<Option<ContactMessage>>;

    /// Set the responded flag; `None` when the message does not exist
    async fn mark_responded(&self, id: i64) -> Result<Option<ContactMessage>>;

    /// Unread messages, newest first
    async fn list_unread(&self) -> Result<Vec<ContactMessage>>;

    /// Messages not yet answered, newest first
    async fn list_unresponded(&self) -> Result<Vec<ContactMessage>>;

    /// Unread messages, oldest first
    async fn list_oldest_unread(&self) -> Result<Vec<ContactMessage>>;

    /// Exact sender email match, newest first
    async fn list_by_email(&self, email: &str) -> Result<Vec<ContactMessage>>;

    /// Messages created within `[start, end]`, newest first
    async fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ContactMessage>>;

    /// Case-insensitive match on name, email, subject or body
    async fn search(&self, term: &str) -> Result<Vec<ContactMessage>>;

    async fn count(&self) -> Result<i64>;

    async fn count_unread(&self) -> Result<i64>;

    async fn count_unresponded(&self) -> Result<i64>;

    /// Message counts grouped by the read flag, unread first
    async fn count_by_read_status(&self) -> Result<Vec<ReadStatusCount>>;
}

/// SQLx-based contact repository implementation
pub struct SqlxContactRepository {
    pool: DynDatabasePool,
}

impl SqlxContactRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_where(&self, clause: &str, args: &[SqlArg]) -> Result<Vec<ContactMessage>> {
        let sql = format!("{} {}", SELECT_MESSAGE, clause);
        match self.pool.backend()? {
            Backend::Sqlite(pool) => fetch_messages_sqlite(pool, &sql, args).await,
            Backend::Mysql(pool) => fetch_messages_mysql(pool, &sql, args).await,
        }
    }

    async fn set_flag(&self, column: &str, id: i64) -> Result<Option<ContactMessage>> {
        let sql = format!(
            "UPDATE contact_messages SET {} = ?, updated_at = ? WHERE id = ?",
            column
        );
        execute(
            &self.pool,
            &sql,
            &[SqlArg::Bool(true), SqlArg::Time(Utc::now()), SqlArg::Int(id)],
        )
        .await?;

        // Re-marking leaves the row unchanged, which MySQL reports as unaffected
        self.get_by_id(id).await
    }
}

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn create(&self, message: &ContactMessage) -> Result<ContactMessage> {
        let now = Utc::now();
        let outcome = execute(
            &self.pool,
            r#"
            INSERT INTO contact_messages (name, email, subject, message, phone, is_read, is_responded, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            &[
                SqlArg::Text(message.name.clone()),
                SqlArg::Text(message.email.clone()),
                SqlArg::OptText(message.subject.clone()),
                SqlArg::Text(message.message.clone()),
                SqlArg::OptText(message.phone.clone()),
                SqlArg::Bool(message.is_read),
                SqlArg::Bool(message.is_responded),
                SqlArg::Time(now),
                SqlArg::Time(now),
            ],
        )
        .await
        .context("Failed to create contact message")?;

        Ok(ContactMessage {
            id: outcome.last_insert_id,
            created_at: now,
            updated_at: now,
            ..message.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ContactMessage>> {
        let messages = self
            .fetch_where("WHERE id = ?", &[SqlArg::Int(id)])
            .await
            .context("Failed to get contact message by ID")?;
        Ok(messages.into_iter().next())
    }

    async fn list(&self) -> Result<Vec<ContactMessage>> {
        self.fetch_where("ORDER BY created_at DESC, id DESC", &[])
            .await
            .context("Failed to list contact messages")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let outcome = execute(
            &self.pool,
            "DELETE FROM contact_messages WHERE id = ?",
            &[SqlArg::Int(id)],
        )
        .await
        .context("Failed to delete contact message")?;
        Ok(outcome.rows_affected > 0)
    }

    async fn mark_read(&self, id: i64) -> Result<Option<ContactMessage>> {
        self.set_flag("is_read", id)
            .await
            .context("Failed to mark contact message as read")
    }

    async fn mark_responded(&self, id: i64) -> Result<Option<ContactMessage>> {
        self.set_flag("is_responded", id)
            .await
            .context("Failed to mark contact message as responded")
    }

    async fn list_unread(&self) -> Result<Vec<ContactMessage>> {
        self.fetch_where(
            "WHERE is_read = ? ORDER BY created_at DESC, id DESC",
            &[SqlArg::Bool(false)],
        )
        .await
        .context("Failed to list unread messages")
    }

    async fn list_unresponded(&self) -> Result<Vec<ContactMessage>> {
        self.fetch_where(
            "WHERE is_responded = ? ORDER BY created_at DESC, id DESC",
            &[SqlArg::Bool(false)],
        )
        .await
        .context("Failed to list unresponded messages")
    }

    async fn list_oldest_unread(&self) -> Result<Vec<ContactMessage>> {
        self.fetch_where(
            "WHERE is_read = ? ORDER BY created_at ASC, id ASC",
            &[SqlArg::Bool(false)],
        )
        .await
        .context("Failed to list oldest unread messages")
    }

    async fn list_by_email(&self, email: &str) -> Result<Vec<ContactMessage>> {
        self.fetch_where(
            "WHERE email = ? ORDER BY created_at DESC, id DESC",
            &[SqlArg::Text(email.to_string())],
        )
        .await
        .context("Failed to list messages by email")
    }

    async fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ContactMessage>> {
        self.fetch_where(
            "WHERE created_at >= ? AND created_at <= ? ORDER BY created_at DESC, id DESC",
            &[SqlArg::Time(start), SqlArg::Time(end)],
        )
        .await
        .context("Failed to list messages by date range")
    }

    async fn search(&self, term: &str) -> Result<Vec<ContactMessage>> {
        let pattern = like_pattern(term);
        self.fetch_where(
            r#"
            WHERE LOWER(name) LIKE LOWER(?) ESCAPE '!'
               OR LOWER(email) LIKE LOWER(?) ESCAPE '!'
               OR LOWER(COALESCE(subject, '')) LIKE LOWER(?) ESCAPE '!'
               OR LOWER(message) LIKE LOWER(?) ESCAPE '!'
            ORDER BY created_at DESC, id DESC
            "#,
            &[
                SqlArg::Text(pattern.clone()),
                SqlArg::Text(pattern.clone()),
                SqlArg::Text(pattern.clone()),
                SqlArg::Text(pattern),
            ],
        )
        .await
        .context("Failed to search contact messages")
    }

    async fn count(&self) -> Result<i64> {
        fetch_count(&self.pool, "SELECT COUNT(*) AS count FROM contact_messages", &[])
            .await
            .context("Failed to count contact messages")
    }

    async fn count_unread(&self) -> Result<i64> {
        fetch_count(
            &self.pool,
            "SELECT COUNT(*) AS count FROM contact_messages WHERE is_read = ?",
            &[SqlArg::Bool(false)],
        )
        .await
        .context("Failed to count unread messages")
    }

    async fn count_unresponded(&self) -> Result<i64> {
        fetch_count(
            &self.pool,
            "SELECT COUNT(*) AS count FROM contact_messages WHERE is_responded = ?",
            &[SqlArg::Bool(false)],
        )
        .await
        .context("Failed to count unresponded messages")
    }

    async fn count_by_read_status(&self) -> Result<Vec<ReadStatusCount>> {
        let sql = "SELECT is_read, COUNT(*) AS count FROM contact_messages GROUP BY is_read ORDER BY is_read ASC";
        match self.pool.backend()? {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to count messages by read status")?;
                rows.iter()
                    .map(|row| -> Result<ReadStatusCount> {
                        Ok(ReadStatusCount {
                            is_read: row.try_get("is_read")?,
                            count: row.try_get("count")?,
                        })
                    })
                    .collect()
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(sql)
                    .fetch_all(pool)
                    .await
                    .context("Failed to count messages by read status")?;
                rows.iter()
                    .map(|row| -> Result<ReadStatusCount> {
                        Ok(ReadStatusCount {
                            is_read: row.try_get("is_read")?,
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

async fn fetch_messages_sqlite(
    pool: &SqlitePool,
    sql: &str,
    args: &[SqlArg],
) -> Result<Vec<ContactMessage>> {
    let rows = bind_sqlite(sqlx::query(sql), args).fetch_all(pool).await?;
    rows.iter().map(row_to_message_sqlite).collect()
}

fn row_to_message_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<ContactMessage> {
    Ok(ContactMessage {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        subject: row.try_get("subject")?,
        message: row.try_get("message")?,
        phone: row.try_get("phone")?,
        is_read: row.try_get("is_read")?,
        is_responded: row.try_get("is_responded")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn fetch_messages_mysql(
    pool: &MySqlPool,
    sql: &str,
    args: &[SqlArg],
) -> Result<Vec<ContactMessage>> {
    let rows = bind_mysql(sqlx::query(sql), args).fetch_all(pool).await?;
    rows.iter().map(row_to_message_mysql).collect()
}

fn row_to_message_mysql(row: &sqlx::mysql::MySqlRow) -> Result<ContactMessage> {
    Ok(ContactMessage {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        subject: row.try_get("subject")?,
        message: row.try_get("message")?,
        phone: row.try_get("phone")?,
        is_read: row.try_get("is_read")?,
        is_responded: row.try_get("is_responded")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations::run_migrations};
    use crate::models::CreateContactInput;
    use chrono::Duration;

    async fn setup() -> SqlxContactRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        SqlxContactRepository::new(pool)
    }

    fn message(name: &str, email: &str, body: &str) -> ContactMessage {
        CreateContactInput {
            name: name.to_string(),
            email: email.to_string(),
            subject: Some(format!("Hello from {}", name)),
            message: body.to_string(),
            phone: None,
        }
        .into_message()
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;
        let created = repo
            .create(&message("Lea", "lea@example.com", "Do you ship abroad?"))
            .await
            .unwrap();
        assert!(created.id > 0);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "lea@example.com");
        assert!(!fetched.is_read);
        assert!(!fetched.is_responded);
        assert!(repo.get_by_id(404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_flags_and_filtered_lists() {
        let repo = setup().await;
        let a = repo.create(&message("A", "a@example.com", "first")).await.unwrap();
        let b = repo.create(&message("B", "b@example.com", "second")).await.unwrap();
        let c = repo.create(&message("C", "c@example.com", "third")).await.unwrap();

        let read = repo.mark_read(b.id).await.unwrap().unwrap();
        assert!(read.is_read);
        assert!(!read.is_responded);

        // marking twice keeps the flag and still finds the row
        assert!(repo.mark_read(b.id).await.unwrap().unwrap().is_read);

        let responded = repo.mark_responded(c.id).await.unwrap().unwrap();
        assert!(responded.is_responded);
        assert!(!responded.is_read);

        assert!(repo.mark_read(999).await.unwrap().is_none());
        assert!(repo.mark_responded(999).await.unwrap().is_none());

        let unread: Vec<_> = repo.list_unread().await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(unread, [c.id, a.id]);

        let oldest: Vec<_> = repo.list_oldest_unread().await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(oldest, [a.id, c.id]);

        let unresponded: Vec<_> = repo.list_unresponded().await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(unresponded, [b.id, a.id]);

        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(repo.count_unread().await.unwrap(), 2);
        assert_eq!(repo.count_unresponded().await.unwrap(), 2);

        let groups = repo.count_by_read_status().await.unwrap();
        assert_eq!(
            groups,
            [
                ReadStatusCount { is_read: false, count: 2 },
                ReadStatusCount { is_read: true, count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_list_by_email_is_exact() {
        let repo = setup().await;
        repo.create(&message("A", "ana@example.com", "one")).await.unwrap();
        repo.create(&message("A", "ana@example.com", "two")).await.unwrap();
        repo.create(&message("H", "hana@example.com", "three")).await.unwrap();

        let found = repo.list_by_email("ana@example.com").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].message, "two");
    }

    #[tokio::test]
    async fn test_search_across_fields() {
        let repo = setup().await;
        repo.create(&message("Marie", "marie@example.com", "About the SCULPTURE"))
            .await
            .unwrap();
        repo.create(&message("Paul", "paul@gallery.org", "Opening hours?"))
            .await
            .unwrap();

        assert_eq!(repo.search("sculpture").await.unwrap().len(), 1);
        assert_eq!(repo.search("GALLERY").await.unwrap().len(), 1);
        assert_eq!(repo.search("hello from").await.unwrap().len(), 2);
        assert!(repo.search("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_date_range_inclusive() {
        let repo = setup().await;
        let created = repo.create(&message("D", "d@example.com", "dated")).await.unwrap();

        let around = repo
            .list_by_date_range(created.created_at - Duration::minutes(1), created.created_at + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(around.len(), 1);

        let exact = repo
            .list_by_date_range(created.created_at, created.created_at)
            .await
            .unwrap();
        assert_eq!(exact.len(), 1);

        let before = repo
            .list_by_date_range(created.created_at - Duration::days(2), created.created_at - Duration::days(1))
            .await
            .unwrap();
        assert!(before.is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = setup().await;
        let created = repo.create(&message("X", "x@example.com", "bye")).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
