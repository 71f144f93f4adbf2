use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod follow;
mod middleware;
mod models;
mod notify;
mod push;
mod repositories;
mod routes;
mod state;

use common::cache::{RedisConfig, RedisPool};
use common::database::{DatabaseConfig, init_pool};

use crate::follow::FollowService;
use crate::middleware::TokenVerifier;
use crate::notify::Notifier;
use crate::push::{PushClient, PushConfig};
use crate::repositories::{FollowRepository, NotificationRepository, UserRepository};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting API service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Initialize Redis connection pool
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;

    // Token verification shares the auth service's secret
    let token_verifier = TokenVerifier::from_env()?;

    // Initialize repositories and the follow workflow
    let user_repository = UserRepository::new(pool.clone());
    let follow_repository = FollowRepository::new(pool.clone());
    let notification_repository = NotificationRepository::new(pool.clone());

    let push_client = PushClient::new(PushConfig::from_env());
    let notifier = Notifier::new(
        notification_repository.clone(),
        push_client,
        redis_pool.clone(),
    );
    let follow_service = FollowService::new(
        follow_repository.clone(),
        user_repository.clone(),
        notifier,
    );

    let app_state = AppState {
        db_pool: pool,
        redis_pool,
        token_verifier,
        user_repository,
        follow_repository,
        notification_repository,
        follow_service,
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
    info!("API service listening on 0.0.0.0:3001");

    axum::serve(listener, app).await?;

    Ok(())
}
