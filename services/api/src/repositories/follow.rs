//! Follow graph repository
//!
//! Uniqueness of follow edges and the one-pending-request-per-pair rule
//! live in the schema; every write here is an upsert or a conditional
//! delete, so concurrent requests for the same pair collapse into one row
//! without application-level locking.

use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Profile;
use crate::models::follow::{FollowRequest, PendingRequest, RelationState, RequestStatus};

/// Follow graph repository
#[derive(Clone)]
pub struct FollowRepository {
    pool: PgPool,
}

impl FollowRepository {
    /// Create a new follow repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a follow edge; a duplicate is a silent no-op
    ///
    /// Returns whether a new edge was actually created.
    pub async fn insert_follow(&self, follower_id: Uuid, following_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, following_id)
            VALUES ($1, $2)
            ON CONFLICT (follower_id, following_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a follow edge if present
    pub async fn delete_follow(&self, follower_id: Uuid, following_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE follower_id = $1 AND following_id = $2
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    /// Create or refresh the pending request for a (requester, target) pair
    ///
    /// Re-requesting after a rejection flips the same row back to pending.
    pub async fn upsert_pending_request(
        &self,
        requester_id: Uuid,
        target_id: Uuid,
    ) -> DatabaseResult<FollowRequest> {
        let request = sqlx::query_as::<_, FollowRequest>(
            r#"
            INSERT INTO follow_requests (requester_id, target_id, status)
            VALUES ($1, $2, 'pending')
            ON CONFLICT (requester_id, target_id)
            DO UPDATE SET status = 'pending', updated_at = NOW()
            RETURNING id, requester_id, target_id, status, created_at, updated_at
            "#,
        )
        .bind(requester_id)
        .bind(target_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(request)
    }

    /// Find a pending request by id, addressed to the given responder
    pub async fn find_pending_for_responder(
        &self,
        request_id: Uuid,
        responder_id: Uuid,
    ) -> DatabaseResult<Option<FollowRequest>> {
        let request = sqlx::query_as::<_, FollowRequest>(
            r#"
            SELECT id, requester_id, target_id, status, created_at, updated_at
            FROM follow_requests
            WHERE id = $1 AND target_id = $2 AND status = 'pending'
            "#,
        )
        .bind(request_id)
        .bind(responder_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(request)
    }

    /// Set the status of a follow request
    pub async fn set_request_status(
        &self,
        request_id: Uuid,
        status: RequestStatus,
    ) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE follow_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(())
    }

    /// Delete any pending request between the pair (used by unfollow)
    pub async fn delete_pending_between(
        &self,
        requester_id: Uuid,
        target_id: Uuid,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM follow_requests
            WHERE requester_id = $1 AND target_id = $2 AND status = 'pending'
            "#,
        )
        .bind(requester_id)
        .bind(target_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    /// List pending requests addressed to a user, newest first
    pub async fn list_pending_for(&self, target_id: Uuid) -> DatabaseResult<Vec<PendingRequest>> {
        let requests = sqlx::query_as::<_, PendingRequest>(
            r#"
            SELECT fr.id AS request_id,
                   u.id AS from_user_id,
                   u.username AS from_username,
                   u.profile_image_url AS from_profile_image_url,
                   fr.updated_at AS timestamp
            FROM follow_requests fr
            JOIN users u ON u.id = fr.requester_id
            WHERE fr.target_id = $1 AND fr.status = 'pending'
            ORDER BY fr.updated_at DESC
            "#,
        )
        .bind(target_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(requests)
    }

    /// Resolve the relationship state for an ordered (follower, target) pair
    pub async fn relation_state(
        &self,
        follower_id: Uuid,
        target_id: Uuid,
    ) -> DatabaseResult<RelationState> {
        let following: Option<(i32,)> = sqlx::query_as(
            r#"
            SELECT 1 FROM follows
            WHERE follower_id = $1 AND following_id = $2
            "#,
        )
        .bind(follower_id)
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        if following.is_some() {
            return Ok(RelationState::Following);
        }

        let pending: Option<(i32,)> = sqlx::query_as(
            r#"
            SELECT 1 FROM follow_requests
            WHERE requester_id = $1 AND target_id = $2 AND status = 'pending'
            "#,
        )
        .bind(follower_id)
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        if pending.is_some() {
            return Ok(RelationState::Pending);
        }

        Ok(RelationState::NoRelation)
    }

    /// List the users following `user_id`, newest first
    pub async fn list_followers(&self, user_id: Uuid) -> DatabaseResult<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>(
            r#"
            SELECT u.id, u.username, u.profile_image_url, u.is_private
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.following_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(profiles)
    }

    /// List the users `user_id` follows, newest first
    pub async fn list_following(&self, user_id: Uuid) -> DatabaseResult<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>(
            r#"
            SELECT u.id, u.username, u.profile_image_url, u.is_private
            FROM follows f
            JOIN users u ON u.id = f.following_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(profiles)
    }
}
