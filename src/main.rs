//! ArtSpark - Backend for an art gallery website

use anyhow::{Context, Result};
use chrono::Duration;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use artspark::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxArtworkRepository, SqlxContactRepository, SqlxReviewRepository,
            SqlxUserRepository,
        },
    },
    services::{
        random_secret, ArtworkService, ContactService, ReviewService, StatsService,
        TokenService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artspark=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ArtSpark...");

    // Load configuration (first argument, default config.yml)
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.yml"));
    let config = Config::load_with_env(&config_path)?;
    tracing::info!("Configuration loaded from {}", config_path.display());

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    tokio::fs::create_dir_all(&config.upload.path)
        .await
        .with_context(|| format!("Failed to create upload dir {}", config.upload.path.display()))?;

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let artwork_repo = SqlxArtworkRepository::boxed(pool.clone());
    let review_repo = SqlxReviewRepository::boxed(pool.clone());
    let contact_repo = SqlxContactRepository::boxed(pool);

    // Token signing
    let secret = match config.auth.jwt_secret.clone().filter(|s| !s.is_empty()) {
        Some(secret) => secret,
        None => {
            tracing::warn!("No jwt_secret configured; tokens will not survive a restart");
            random_secret(32)
        }
    };
    let ttl = Duration::try_hours(config.auth.token_ttl_hours)
        .context("auth.token_ttl_hours is out of range")?;
    let tokens = Arc::new(TokenService::new(secret, ttl));

    // Initialize services
    let user_service = Arc::new(UserService::new(user_repo.clone(), tokens));
    let artwork_service = Arc::new(ArtworkService::new(
        artwork_repo.clone(),
        config.upload.path.clone(),
    ));
    let review_service = Arc::new(ReviewService::new(review_repo.clone(), artwork_repo.clone()));
    let contact_service = Arc::new(ContactService::new(contact_repo.clone()));
    let stats_service = Arc::new(StatsService::new(
        user_repo,
        artwork_repo,
        review_repo,
        contact_repo,
    ));

    let default_admin = Arc::new(config.auth.default_admin.clone());
    user_service.ensure_default_admin(&default_admin).await?;

    let state = AppState {
        user_service,
        artwork_service,
        review_service,
        contact_service,
        stats_service,
        default_admin,
    };

    // Build router
    let app = api::build_router(
        state,
        &config.server.cors_origin,
        config.upload.max_body_size,
    );

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
