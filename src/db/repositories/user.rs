//! User repository
//!
//! Database operations for back-office accounts.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::db::{Backend, DynDatabasePool};
use crate::models::{User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

use super::{bind_mysql, bind_sqlite, execute, fetch_count, like_pattern, SqlArg};

const SELECT_USER: &str = r#"
    SELECT id, username, email, password_hash, role, created_at, updated_at
    FROM users
"#;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update username, email, password hash and role.
    /// Returns `None` when the user does not exist.
    async fn update(&self, user: &User) -> Result<Option<User>>;

    /// Delete a user, returning whether a row was removed
    async fn delete(&self, id: i64) -> Result<bool>;

    /// All users ordered by id
    async fn list(&self) -> Result<Vec<User>>;

    /// Users holding the given role, ordered by id
    async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>>;

    /// Case-insensitive match on username or email
    async fn search(&self, term: &str) -> Result<Vec<User>>;

    /// Count total users
    async fn count(&self) -> Result<i64>;

    async fn count_by_role(&self, role: UserRole) -> Result<i64>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_where(&self, clause: &str, args: &[SqlArg]) -> Result<Vec<User>> {
        let sql = format!("{} {}", SELECT_USER, clause);
        match self.pool.backend()? {
            Backend::Sqlite(pool) => fetch_users_sqlite(pool, &sql, args).await,
            Backend::Mysql(pool) => fetch_users_mysql(pool, &sql, args).await,
        }
    }

    async fn fetch_first(&self, clause: &str, args: &[SqlArg]) -> Result<Option<User>> {
        Ok(self.fetch_where(clause, args).await?.into_iter().next())
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let now = Utc::now();
        let outcome = execute(
            &self.pool,
            r#"
            INSERT INTO users (username, email, password_hash, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            &[
                SqlArg::Text(user.username.clone()),
                SqlArg::Text(user.email.clone()),
                SqlArg::Text(user.password_hash.clone()),
                SqlArg::Text(user.role.to_string()),
                SqlArg::Time(now),
                SqlArg::Time(now),
            ],
        )
        .await
        .context("Failed to create user")?;

        Ok(User {
            id: outcome.last_insert_id,
            created_at: now,
            updated_at: now,
            ..user.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        self.fetch_first("WHERE id = ?", &[SqlArg::Int(id)])
            .await
            .context("Failed to get user by ID")
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        self.fetch_first("WHERE username = ?", &[SqlArg::Text(username.to_string())])
            .await
            .context("Failed to get user by username")
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_first("WHERE email = ?", &[SqlArg::Text(email.to_string())])
            .await
            .context("Failed to get user by email")
    }

    async fn update(&self, user: &User) -> Result<Option<User>> {
        execute(
            &self.pool,
            r#"
            UPDATE users
            SET username = ?, email = ?, password_hash = ?, role = ?, updated_at = ?
            WHERE id = ?
            "#,
            &[
                SqlArg::Text(user.username.clone()),
                SqlArg::Text(user.email.clone()),
                SqlArg::Text(user.password_hash.clone()),
                SqlArg::Text(user.role.to_string()),
                SqlArg::Time(Utc::now()),
                SqlArg::Int(user.id),
            ],
        )
        .await
        .context("Failed to update user")?;

        // Return the updated user
        self.get_by_id(user.id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let outcome = execute(&self.pool, "DELETE FROM users WHERE id = ?", &[SqlArg::Int(id)])
            .await
            .context("Failed to delete user")?;
        Ok(outcome.rows_affected > 0)
    }

    async fn list(&self) -> Result<Vec<User>> {
        self.fetch_where("ORDER BY id ASC", &[])
            .await
            .context("Failed to list users")
    }

    async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>> {
        self.fetch_where("WHERE role = ? ORDER BY id ASC", &[SqlArg::Text(role.to_string())])
            .await
            .context("Failed to list users by role")
    }

    async fn search(&self, term: &str) -> Result<Vec<User>> {
        let pattern = like_pattern(term);
        self.fetch_where(
            "WHERE LOWER(username) LIKE LOWER(?) ESCAPE '!' OR LOWER(email) LIKE LOWER(?) ESCAPE '!' ORDER BY id ASC",
            &[SqlArg::Text(pattern.clone()), SqlArg::Text(pattern)],
        )
        .await
        .context("Failed to search users")
    }

    async fn count(&self) -> Result<i64> {
        fetch_count(&self.pool, "SELECT COUNT(*) AS count FROM users", &[])
            .await
            .context("Failed to count users")
    }

    async fn count_by_role(&self, role: UserRole) -> Result<i64> {
        fetch_count(
            &self.pool,
            "SELECT COUNT(*) AS count FROM users WHERE role = ?",
            &[SqlArg::Text(role.to_string())],
        )
        .await
        .context("Failed to count users by role")
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn fetch_users_sqlite(pool: &SqlitePool, sql: &str, args: &[SqlArg]) -> Result<Vec<User>> {
    let rows = bind_sqlite(sqlx::query(sql), args).fetch_all(pool).await?;
    rows.iter().map(row_to_user_sqlite).collect()
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.try_get("role")?;
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid user role in database: {}", role_str))?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn fetch_users_mysql(pool: &MySqlPool, sql: &str, args: &[SqlArg]) -> Result<Vec<User>> {
    let rows = bind_mysql(sqlx::query(sql), args).fetch_all(pool).await?;
    rows.iter().map(row_to_user_mysql).collect()
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let role_str: String = row.try_get("role")?;
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid user role in database: {}", role_str))?;

    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
