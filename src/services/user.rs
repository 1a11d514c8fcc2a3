//! User service
//!
//! Implements business logic for back-office accounts:
//! - Account creation with unique email and username
//! - Login with a generic failure message, issuing bearer tokens
//! - Admin user management (update, delete, listings, counts)
//! - Idempotent bootstrap of the default administrator

use crate::config::DefaultAdminConfig;
use crate::db::repositories::UserRepository;
use crate::models::{CreateUserInput, UpdateUserInput, User, UserRole};
use crate::services::password::{hash_password, random_secret, verify_password};
use crate::services::token::{TokenError, TokenService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Message returned for every failed login
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Unknown email or wrong password; deliberately does not say which
    #[error("{}", INVALID_CREDENTIALS)]
    InvalidCredentials,

    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<TokenError> for UserServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InternalError(e) => UserServiceError::InternalError(e),
            other => UserServiceError::InternalError(anyhow::anyhow!(other)),
        }
    }
}

/// Login request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginInput {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Successful login: the bearer token and the account it belongs to
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub token: String,
    pub user: User,
}

/// User service for managing accounts and authentication
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, tokens: Arc<TokenService>) -> Self {
        Self { repo, tokens }
    }

    /// Create an account.
    ///
    /// The email is checked before the username, and nothing is written
    /// when either is already registered.
    pub async fn create(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        input.validate().map_err(UserServiceError::ValidationError)?;
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();

        if self.repo.get_by_email(&email).await?.is_some() {
            return Err(UserServiceError::EmailTaken(email));
        }
        if self.repo.get_by_username(&username).await?.is_some() {
            return Err(UserServiceError::UsernameTaken(username));
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(username, email, password_hash, input.role.unwrap_or_default());
        let created = self.repo.create(&user).await?;
        tracing::info!(id = created.id, role = %created.role, "User created");
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User, UserServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| UserServiceError::NotFound(id.to_string()))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<User, UserServiceError> {
        self.find_by_email(email)
            .await?
            .ok_or_else(|| UserServiceError::NotFound(email.to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repo.get_by_email(email).await?)
    }

    /// Overwrite username, email and role.
    ///
    /// A non-empty password replaces the stored hash; otherwise the hash is
    /// kept. A missing role keeps the current role.
    pub async fn update(&self, id: i64, input: UpdateUserInput) -> Result<User, UserServiceError> {
        input.validate().map_err(UserServiceError::ValidationError)?;
        let mut user = self.get_by_id(id).await?;
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();

        if let Some(other) = self.repo.get_by_email(&email).await? {
            if other.id != id {
                return Err(UserServiceError::EmailTaken(email));
            }
        }
        if let Some(other) = self.repo.get_by_username(&username).await? {
            if other.id != id {
                return Err(UserServiceError::UsernameTaken(username));
            }
        }

        if let Some(password) = input.new_password() {
            user.password_hash = hash_password(password)?;
        }
        user.username = username;
        user.email = email;
        if let Some(role) = input.role {
            user.role = role;
        }

        self.repo
            .update(&user)
            .await?
            .ok_or_else(|| UserServiceError::NotFound(id.to_string()))
    }

    pub async fn delete(&self, id: i64) -> Result<(), UserServiceError> {
        if !self.repo.delete(id).await? {
            return Err(UserServiceError::NotFound(id.to_string()));
        }
        tracing::info!(id, "User deleted");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repo.list().await?)
    }

    pub async fn list_admins(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repo.list_by_role(UserRole::Admin).await?)
    }

    /// Case-insensitive match on username or email
    pub async fn search(&self, term: &str) -> Result<Vec<User>, UserServiceError> {
        if term.trim().is_empty() {
            return self.list().await;
        }
        Ok(self.repo.search(term).await?)
    }

    pub async fn count(&self) -> Result<i64, UserServiceError> {
        Ok(self.repo.count().await?)
    }

    pub async fn count_by_role(&self, role: UserRole) -> Result<i64, UserServiceError> {
        Ok(self.repo.count_by_role(role).await?)
    }

    /// Check credentials.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserServiceError> {
        let user = self
            .repo
            .get_by_email(email.trim())
            .await?
            .ok_or(UserServiceError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(UserServiceError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Authenticate and issue a bearer token
    pub async fn login(&self, input: LoginInput) -> Result<LoginResult, UserServiceError> {
        let user = self.authenticate(&input.email, &input.password).await?;
        let token = self.tokens.issue(&user.email, user.role)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(LoginResult { token, user })
    }

    /// Resolve the account a token was issued for.
    ///
    /// Returns `None` for bad, expired or orphaned tokens.
    pub async fn resolve_token(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let email = match self.tokens.subject(token) {
            Ok(email) => email,
            Err(TokenError::InternalError(e)) => return Err(e.into()),
            Err(e) => {
                tracing::debug!("Rejected bearer token: {}", e);
                return Ok(None);
            }
        };

        let Some(user) = self.repo.get_by_email(&email).await? else {
            tracing::debug!("Bearer token subject has no account");
            return Ok(None);
        };

        Ok(self.tokens.validate(token, &user.email).then_some(user))
    }

    /// Return the configured administrator, creating it on first call.
    ///
    /// When no password is configured a random one is generated and logged
    /// once at WARN level.
    pub async fn ensure_default_admin(
        &self,
        config: &DefaultAdminConfig,
    ) -> Result<User, UserServiceError> {
        if let Some(existing) = self.repo.get_by_email(&config.email).await? {
            return Ok(existing);
        }

        let password = match config.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => password.to_string(),
            None => {
                let generated = random_secret(18);
                tracing::warn!(
                    email = %config.email,
                    password = %generated,
                    "Generated password for default admin; change it after first login"
                );
                generated
            }
        };

        let created = self
            .create(CreateUserInput {
                username: config.username.clone(),
                email: config.email.clone(),
                password,
                role: Some(UserRole::Admin),
            })
            .await;

        match created {
            Ok(admin) => {
                tracing::info!(id = admin.id, email = %admin.email, "Default admin created");
                Ok(admin)
            }
            // A concurrent bootstrap may have inserted the account in between
            Err(err) => match self.repo.get_by_email(&config.email).await? {
                Some(existing) => Ok(existing),
                None => Err(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxUserRepository;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup_test_service() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let tokens = Arc::new(TokenService::new("user-service-test", Duration::hours(1)));
        UserService::new(SqlxUserRepository::boxed(pool), tokens)
    }

    fn create_input(username: &str, email: &str) -> CreateUserInput {
        CreateUserInput {
            username: username.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            role: None,
        }
    }

    fn admin_config(password: Option<&str>) -> DefaultAdminConfig {
        DefaultAdminConfig {
            email: "admin@artspark.com".to_string(),
            username: "admin".to_string(),
            password: password.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_hashes_password_and_defaults_role() {
        let service = setup_test_service().await;
        let user = service
            .create(create_input("painter", "painter@example.com"))
            .await
            .unwrap();

        assert_eq!(user.role, UserRole::User);
        assert!(user.password_hash.starts_with("$argon2id$"));
        assert_ne!(user.password_hash, "password123");
    }

    #[tokio::test]
    async fn test_duplicate_email_conflict_inserts_nothing() {
        let service = setup_test_service().await;
        service.create(create_input("first", "same@example.com")).await.unwrap();

        let result = service.create(create_input("second", "same@example.com")).await;
        assert!(matches!(result, Err(UserServiceError::EmailTaken(_))));
        assert_eq!(service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username_conflict_inserts_nothing() {
        let service = setup_test_service().await;
        service.create(create_input("same", "one@example.com")).await.unwrap();

        let result = service.create(create_input("same", "two@example.com")).await;
        assert!(matches!(result, Err(UserServiceError::UsernameTaken(_))));
        assert_eq!(service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_email_conflict_reported_first() {
        let service = setup_test_service().await;
        service.create(create_input("taken", "taken@example.com")).await.unwrap();

        let result = service.create(create_input("taken", "taken@example.com")).await;
        assert!(matches!(result, Err(UserServiceError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn test_blank_fields_rejected() {
        let service = setup_test_service().await;
        let mut input = create_input("x", "x@example.com");
        input.password = String::new();
        assert!(matches!(
            service.create(input).await,
            Err(UserServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_is_generic() {
        let service = setup_test_service().await;
        service.create(create_input("login", "login@example.com")).await.unwrap();

        assert!(service.authenticate("login@example.com", "password123").await.is_ok());

        let wrong_password = service
            .authenticate("login@example.com", "nope")
            .await
            .unwrap_err();
        let unknown_email = service
            .authenticate("ghost@example.com", "password123")
            .await
            .unwrap_err();
        assert!(matches!(wrong_password, UserServiceError::InvalidCredentials));
        assert!(matches!(unknown_email, UserServiceError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_login_issues_resolvable_token() {
        let service = setup_test_service().await;
        let user = service
            .create(CreateUserInput {
                role: Some(UserRole::Admin),
                ..create_input("boss", "boss@example.com")
            })
            .await
            .unwrap();

        let result = service
            .login(LoginInput::new("boss@example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(result.user.id, user.id);

        let resolved = service.resolve_token(&result.token).await.unwrap().unwrap();
        assert_eq!(resolved.id, user.id);
        assert!(resolved.is_admin());

        assert!(service.resolve_token("garbage").await.unwrap().is_none());

        // token outlives its account
        service.delete(user.id).await.unwrap();
        assert!(service.resolve_token(&result.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_hash_without_new_password() {
        let service = setup_test_service().await;
        let user = service.create(create_input("old", "old@example.com")).await.unwrap();

        let updated = service
            .update(
                user.id,
                UpdateUserInput {
                    username: "new".to_string(),
                    email: "new@example.com".to_string(),
                    password: Some(String::new()),
                    role: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "new");
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.role, UserRole::User);
        assert_eq!(updated.password_hash, user.password_hash);
        assert!(service.authenticate("new@example.com", "password123").await.is_ok());

        let updated = service
            .update(
                user.id,
                UpdateUserInput {
                    username: "new".to_string(),
                    email: "new@example.com".to_string(),
                    password: Some("changed".to_string()),
                    role: Some(UserRole::Admin),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, UserRole::Admin);
        assert!(service.authenticate("new@example.com", "changed").await.is_ok());
        assert!(service.authenticate("new@example.com", "password123").await.is_err());
    }

    #[tokio::test]
    async fn test_update_conflicts_and_missing() {
        let service = setup_test_service().await;
        service.create(create_input("a", "a@example.com")).await.unwrap();
        let b = service.create(create_input("b", "b@example.com")).await.unwrap();

        let steal_email = UpdateUserInput {
            username: "b".to_string(),
            email: "a@example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            service.update(b.id, steal_email).await,
            Err(UserServiceError::EmailTaken(_))
        ));

        let steal_name = UpdateUserInput {
            username: "a".to_string(),
            email: "b@example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            service.update(b.id, steal_name).await,
            Err(UserServiceError::UsernameTaken(_))
        ));

        let missing = UpdateUserInput {
            username: "z".to_string(),
            email: "z@example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            service.update(999, missing).await,
            Err(UserServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_listings_and_counts() {
        let service = setup_test_service().await;
        service
            .create(CreateUserInput {
                role: Some(UserRole::Admin),
                ..create_input("root", "root@example.com")
            })
            .await
            .unwrap();
        service.create(create_input("guest", "guest@example.com")).await.unwrap();

        assert_eq!(service.list().await.unwrap().len(), 2);
        assert_eq!(service.list_admins().await.unwrap().len(), 1);
        assert_eq!(service.search("GUE").await.unwrap().len(), 1);
        assert_eq!(service.count_by_role(UserRole::Admin).await.unwrap(), 1);
        assert_eq!(service.count_by_role(UserRole::User).await.unwrap(), 1);
        assert_eq!(service.get_by_email("root@example.com").await.unwrap().username, "root");
        assert!(matches!(
            service.get_by_email("none@example.com").await,
            Err(UserServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_default_admin_is_idempotent() {
        let service = setup_test_service().await;
        let config = admin_config(Some("configured-secret"));

        let first = service.ensure_default_admin(&config).await.unwrap();
        let second = service.ensure_default_admin(&config).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.role, UserRole::Admin);
        assert_eq!(service.count_by_role(UserRole::Admin).await.unwrap(), 1);
        assert!(service
            .authenticate("admin@artspark.com", "configured-secret")
            .await
            .is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_default_admin_bootstrap_returns_one_account() {
        let service = Arc::new(setup_test_service().await);
        let config = Arc::new(admin_config(Some("configured-secret")));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let service = service.clone();
                let config = config.clone();
                tokio::spawn(async move { service.ensure_default_admin(&config).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }

        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(service.count_by_role(UserRole::Admin).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_default_admin_without_password_gets_random_one() {
        let service = setup_test_service().await;
        let admin = service.ensure_default_admin(&admin_config(None)).await.unwrap();

        assert!(admin.is_admin());
        assert!(service.authenticate("admin@artspark.com", "").await.is_err());
        assert!(service.authenticate("admin@artspark.com", "admin").await.is_err());
    }
}
