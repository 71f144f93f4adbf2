//! Follow workflow
//!
//! Drives the per-pair state machine: NoRelation -> Pending for private
//! targets, NoRelation -> Following for public ones, with respond/unfollow
//! transitions on top. Persistence is a handful of upserts and conditional
//! deletes; notification and push delivery hang off the transitions as
//! best-effort side effects.

use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::follow::{RelationState, RespondAction, RequestStatus};
use crate::models::notification::{NewNotification, NotificationKind};
use crate::notify::Notifier;
use crate::repositories::{FollowRepository, UserRepository};

/// Follow workflow service
#[derive(Clone)]
pub struct FollowService {
    follows: FollowRepository,
    users: UserRepository,
    notifier: Notifier,
}

impl FollowService {
    /// Create a new follow service
    pub fn new(follows: FollowRepository, users: UserRepository, notifier: Notifier) -> Self {
        Self {
            follows,
            users,
            notifier,
        }
    }

    /// Ask to follow a user
    ///
    /// A private target gets a pending request (create or refresh), a
    /// public one an immediate follow edge. Returns the state the pair
    /// ends up in.
    pub async fn request(
        &self,
        requester: &AuthUser,
        target_id: Uuid,
    ) -> Result<RelationState, ApiError> {
        if requester.id == target_id {
            return Err(ApiError::BadRequest("You cannot follow yourself".to_string()));
        }

        let target = self
            .users
            .find_profile(target_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if target.is_private {
            let request = self
                .follows
                .upsert_pending_request(requester.id, target_id)
                .await?;

            info!(
                "Follow request from {} to {} is pending",
                requester.id, target_id
            );

            self.notifier
                .dispatch(NewNotification {
                    recipient_id: target_id,
                    kind: NotificationKind::FollowRequest,
                    title: "New follow request".to_string(),
                    body: format!("{} wants to follow you", requester.username),
                    reference_id: Some(request.id),
                })
                .await;

            return Ok(RelationState::Pending);
        }

        let created = self.follows.insert_follow(requester.id, target_id).await?;

        // Re-following an already-followed account is a silent no-op;
        // only a fresh edge notifies.
        if created {
            info!("{} now follows {}", requester.id, target_id);

            self.notifier
                .dispatch(NewNotification {
                    recipient_id: target_id,
                    kind: NotificationKind::NewFollower,
                    title: "New follower".to_string(),
                    body: format!("{} started following you", requester.username),
                    reference_id: Some(requester.id),
                })
                .await;
        }

        Ok(RelationState::Following)
    }

    /// Accept or reject a pending follow request addressed to `responder`
    pub async fn respond(
        &self,
        responder: &AuthUser,
        request_id: Uuid,
        action: RespondAction,
    ) -> Result<RespondAction, ApiError> {
        let request = self
            .follows
            .find_pending_for_responder(request_id, responder.id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Follow request not found".to_string()))?;

        match action {
            RespondAction::Accept => {
                self.follows
                    .insert_follow(request.requester_id, request.target_id)
                    .await?;
                self.follows
                    .set_request_status(request.id, RequestStatus::Accepted)
                    .await?;

                info!(
                    "Follow request {} accepted; {} now follows {}",
                    request.id, request.requester_id, request.target_id
                );

                self.notifier
                    .dispatch(NewNotification {
                        recipient_id: request.requester_id,
                        kind: NotificationKind::RequestAccepted,
                        title: "Follow request accepted".to_string(),
                        body: format!("{} accepted your follow request", responder.username),
                        reference_id: Some(responder.id),
                    })
                    .await;
            }
            RespondAction::Reject => {
                self.follows
                    .set_request_status(request.id, RequestStatus::Rejected)
                    .await?;

                info!("Follow request {} rejected", request.id);
            }
        }

        Ok(action)
    }

    /// Stop following a user
    ///
    /// Removes the follow edge and any lingering pending request between
    /// the pair. Idempotent; absence of either is not an error.
    pub async fn unfollow(&self, follower: &AuthUser, target_id: Uuid) -> Result<(), ApiError> {
        self.follows.delete_follow(follower.id, target_id).await?;
        self.follows
            .delete_pending_between(follower.id, target_id)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Workflow tests against a migrated database.
    //!
    //! Run with `cargo test -- --ignored` after pointing `DATABASE_URL` at
    //! a PostgreSQL instance with the migrations applied.

    use super::*;
    use common::cache::{RedisConfig, RedisPool};
    use common::database::{DatabaseConfig, init_pool};
    use sqlx::PgPool;

    use crate::push::{PushClient, PushConfig};
    use crate::repositories::NotificationRepository;

    struct Ctx {
        pool: PgPool,
        service: FollowService,
        follows: FollowRepository,
    }

    async fn ctx() -> Ctx {
        let pool = init_pool(&DatabaseConfig::from_env().unwrap())
            .await
            .expect("database unavailable");
        let redis = RedisPool::new(&RedisConfig::from_env().unwrap())
            .await
            .expect("redis client");

        let follows = FollowRepository::new(pool.clone());
        let users = UserRepository::new(pool.clone());
        let notifications = NotificationRepository::new(pool.clone());
        let push = PushClient::new(PushConfig {
            gateway_url: None,
            api_key: None,
        });
        let notifier = Notifier::new(notifications, push, redis);

        Ctx {
            service: FollowService::new(follows.clone(), users, notifier),
            follows,
            pool,
        }
    }

    async fn create_user(pool: &PgPool, is_private: bool) -> AuthUser {
        let suffix = Uuid::new_v4().simple().to_string();
        let username = format!("wf_{}", &suffix[..12]);

        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO users (username, email, password_hash, is_private)
            VALUES ($1, $2, 'x', $3)
            RETURNING id
            "#,
        )
        .bind(&username)
        .bind(format!("{}@test.local", username))
        .bind(is_private)
        .fetch_one(pool)
        .await
        .unwrap();

        AuthUser { id, username }
    }

    async fn pending_request_id(ctx: &Ctx, requester: &AuthUser, target: &AuthUser) -> Uuid {
        let requests = ctx.follows.list_pending_for(target.id).await.unwrap();
        requests
            .iter()
            .find(|r| r.from_user_id == requester.id)
            .expect("pending request present")
            .request_id
    }

    #[tokio::test]
    #[ignore] // Requires a migrated PostgreSQL
    async fn private_target_leaves_pair_pending() {
        let ctx = ctx().await;
        let a = create_user(&ctx.pool, false).await;
        let b = create_user(&ctx.pool, true).await;

        let state = ctx.service.request(&a, b.id).await.unwrap();

        assert_eq!(state, RelationState::Pending);
        assert_eq!(
            ctx.follows.relation_state(a.id, b.id).await.unwrap(),
            RelationState::Pending
        );
    }

    #[tokio::test]
    #[ignore] // Requires a migrated PostgreSQL
    async fn public_target_is_followed_directly() {
        let ctx = ctx().await;
        let a = create_user(&ctx.pool, false).await;
        let b = create_user(&ctx.pool, false).await;

        let state = ctx.service.request(&a, b.id).await.unwrap();

        assert_eq!(state, RelationState::Following);
        assert_eq!(
            ctx.follows.relation_state(a.id, b.id).await.unwrap(),
            RelationState::Following
        );

        // A second follow of the same account is a silent no-op.
        let state = ctx.service.request(&a, b.id).await.unwrap();
        assert_eq!(state, RelationState::Following);
    }

    #[tokio::test]
    #[ignore] // Requires a migrated PostgreSQL
    async fn accept_then_unfollow_returns_to_no_relation() {
        let ctx = ctx().await;
        let a = create_user(&ctx.pool, false).await;
        let b = create_user(&ctx.pool, true).await;

        ctx.service.request(&a, b.id).await.unwrap();
        let request_id = pending_request_id(&ctx, &a, &b).await;

        ctx.service
            .respond(&b, request_id, RespondAction::Accept)
            .await
            .unwrap();
        assert_eq!(
            ctx.follows.relation_state(a.id, b.id).await.unwrap(),
            RelationState::Following
        );

        ctx.service.unfollow(&a, b.id).await.unwrap();
        assert_eq!(
            ctx.follows.relation_state(a.id, b.id).await.unwrap(),
            RelationState::NoRelation
        );

        // Unfollowing again must not error.
        ctx.service.unfollow(&a, b.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires a migrated PostgreSQL
    async fn self_follow_is_a_bad_request() {
        let ctx = ctx().await;
        let a = create_user(&ctx.pool, true).await;

        let result = ctx.service.request(&a, a.id).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    #[ignore] // Requires a migrated PostgreSQL
    async fn unknown_target_is_not_found() {
        let ctx = ctx().await;
        let a = create_user(&ctx.pool, false).await;

        let result = ctx.service.request(&a, Uuid::new_v4()).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    #[ignore] // Requires a migrated PostgreSQL
    async fn reject_then_rerequest_yields_fresh_pending() {
        let ctx = ctx().await;
        let a = create_user(&ctx.pool, false).await;
        let b = create_user(&ctx.pool, true).await;

        ctx.service.request(&a, b.id).await.unwrap();
        let request_id = pending_request_id(&ctx, &a, &b).await;

        ctx.service
            .respond(&b, request_id, RespondAction::Reject)
            .await
            .unwrap();

        // Rejection leaves no follow edge and no pending request.
        assert_eq!(
            ctx.follows.relation_state(a.id, b.id).await.unwrap(),
            RelationState::NoRelation
        );

        // Responding to the same request again is NotFound.
        let result = ctx.service.respond(&b, request_id, RespondAction::Accept).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));

        // Re-requesting flips the same pair back to pending.
        let state = ctx.service.request(&a, b.id).await.unwrap();
        assert_eq!(state, RelationState::Pending);
        assert_eq!(pending_request_id(&ctx, &a, &b).await, request_id);
    }

    #[tokio::test]
    #[ignore] // Requires a migrated PostgreSQL
    async fn responder_must_own_the_request() {
        let ctx = ctx().await;
        let a = create_user(&ctx.pool, false).await;
        let b = create_user(&ctx.pool, true).await;
        let c = create_user(&ctx.pool, false).await;

        ctx.service.request(&a, b.id).await.unwrap();
        let request_id = pending_request_id(&ctx, &a, &b).await;

        let result = ctx.service.respond(&c, request_id, RespondAction::Accept).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
