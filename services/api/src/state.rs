//! Application state shared across handlers

use common::cache::RedisPool;
use sqlx::PgPool;

use crate::follow::FollowService;
use crate::middleware::TokenVerifier;
use crate::repositories::{FollowRepository, NotificationRepository, UserRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub redis_pool: RedisPool,
    pub token_verifier: TokenVerifier,
    pub user_repository: UserRepository,
    pub follow_repository: FollowRepository,
    pub notification_repository: NotificationRepository,
    pub follow_service: FollowService,
}
