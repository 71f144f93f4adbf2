//! Repositories for database operations

use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Profile;

pub mod follow;
pub mod notification;

pub use follow::FollowRepository;
pub use notification::NotificationRepository;

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user's public profile by ID
    pub async fn find_profile(&self, id: Uuid) -> DatabaseResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, username, profile_image_url, is_private
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(profile)
    }

    /// Set the account privacy flag
    pub async fn set_privacy(&self, user_id: Uuid, is_private: bool) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_private = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(is_private)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }
}
