//! Configuration management
//!
//! This module handles loading and parsing configuration for the ArtSpark backend.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (the gallery front-end)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/artspark.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Upload configuration for artwork images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory where artwork images are written
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Maximum request body size for multipart uploads, in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_body_size: default_max_body_size(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("uploads/artworks")
}

fn default_max_body_size() -> usize {
    20 * 1024 * 1024 // 20MB
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens. When unset, a random secret is
    /// generated at startup and tokens do not survive a restart.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// Token lifetime in hours
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Bootstrap administrator account
    #[serde(default)]
    pub default_admin: DefaultAdminConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: default_token_ttl_hours(),
            default_admin: DefaultAdminConfig::default(),
        }
    }
}

/// Longest accepted token lifetime (100 years)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 100;

fn default_token_ttl_hours() -> i64 {
    24
}

/// Bootstrap administrator account settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultAdminConfig {
    #[serde(default = "default_admin_email")]
    pub email: String,
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// Initial password. When unset, a random one is generated and logged once.
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for DefaultAdminConfig {
    fn default() -> Self {
        Self {
            email: default_admin_email(),
            username: default_admin_username(),
            password: None,
        }
    }
}

fn default_admin_email() -> String {
    "admin@artspark.com".to_string()
}

fn default_admin_username() -> String {
    "admin".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - ARTSPARK_SERVER_HOST / ARTSPARK_SERVER_PORT / ARTSPARK_SERVER_CORS_ORIGIN
    /// - ARTSPARK_DATABASE_DRIVER / ARTSPARK_DATABASE_URL
    /// - ARTSPARK_UPLOAD_PATH / ARTSPARK_UPLOAD_MAX_BODY_SIZE
    /// - ARTSPARK_AUTH_JWT_SECRET / ARTSPARK_AUTH_TOKEN_TTL_HOURS
    /// - ARTSPARK_AUTH_ADMIN_EMAIL / ARTSPARK_AUTH_ADMIN_USERNAME / ARTSPARK_AUTH_ADMIN_PASSWORD
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the server unusable
    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_ttl_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.token_ttl_hours must be positive".to_string(),
            ));
        }
        if self.auth.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(ConfigError::ValidationError(format!(
                "auth.token_ttl_hours must be at most {}",
                MAX_TOKEN_TTL_HOURS
            )));
        }
        if let Some(secret) = &self.auth.jwt_secret {
            if secret.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "auth.jwt_secret must not be empty when set".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("ARTSPARK_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("ARTSPARK_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("ARTSPARK_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        // Database configuration
        if let Ok(driver) = std::env::var("ARTSPARK_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("ARTSPARK_DATABASE_URL") {
            self.database.url = url;
        }

        // Upload configuration
        if let Ok(path) = std::env::var("ARTSPARK_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }
        if let Ok(size) = std::env::var("ARTSPARK_UPLOAD_MAX_BODY_SIZE") {
            if let Ok(size) = size.parse::<usize>() {
                self.upload.max_body_size = size;
            }
        }

        // Auth configuration
        if let Ok(secret) = std::env::var("ARTSPARK_AUTH_JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Ok(ttl) = std::env::var("ARTSPARK_AUTH_TOKEN_TTL_HOURS") {
            if let Ok(ttl) = ttl.parse::<i64>() {
                self.auth.token_ttl_hours = ttl;
            }
        }
        if let Ok(email) = std::env::var("ARTSPARK_AUTH_ADMIN_EMAIL") {
            self.auth.default_admin.email = email;
        }
        if let Ok(username) = std::env::var("ARTSPARK_AUTH_ADMIN_USERNAME") {
            self.auth.default_admin.username = username;
        }
        if let Ok(password) = std::env::var("ARTSPARK_AUTH_ADMIN_PASSWORD") {
            self.auth.default_admin.password = Some(password);
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Environment variables are process-global; tests that touch them serialize on this.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());


/// Property-based tests for configuration parsing
#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn port_round_trips_through_yaml(port in 1u16..=65535u16) {
            let yaml = format!("server:\n  port: {}\n", port);
            let config: Config = serde_yaml::from_str(&yaml).unwrap();
            prop_assert_eq!(config.server.port, port);
            prop_assert_eq!(config.server.host, "0.0.0.0");
        }

        #[test]
        fn ttl_round_trips_through_yaml(ttl in 1i64..=720i64) {
            let yaml = format!("auth:\n  token_ttl_hours: {}\n", ttl);
            let config: Config = serde_yaml::from_str(&yaml).unwrap();
            prop_assert_eq!(config.auth.token_ttl_hours, ttl);
            prop_assert!(config.validate().is_ok());
        }
    }
}
