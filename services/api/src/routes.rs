//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Serialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    models::{
        FollowActionRequest, MessageResponse, PrivacyUpdateRequest, RespondRequestBody,
        UnreadCountResponse,
        follow::{RelationState, RespondAction},
    },
    notify::unread_cache_key,
    state::AppState,
};

/// Profile response including the caller's relationship to the user
#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub profile_image_url: Option<String>,
    pub is_private: bool,
    /// "none", "pending", or "following"
    pub relation: String,
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/follow", post(follow_user))
        .route("/unfollow", post(unfollow_user))
        .route("/requests", get(list_follow_requests))
        .route("/requests/respond", post(respond_to_request))
        .route("/users/:id", get(get_user_profile))
        .route("/followers", get(list_followers))
        .route("/following", get(list_following))
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_notification_count))
        .route("/notifications/:id/read", post(mark_notification_read))
        .route("/profile/privacy", put(update_privacy))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// Follow a user, or ask to when their account is private
pub async fn follow_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<FollowActionRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state
        .follow_service
        .request(&user, payload.user_id)
        .await?;

    let message = match outcome {
        RelationState::Pending => "Follow request sent",
        _ => "Followed successfully",
    };

    Ok(Json(MessageResponse::new(message)))
}

/// Stop following a user
pub async fn unfollow_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<FollowActionRequest>,
) -> ApiResult<impl IntoResponse> {
    state.follow_service.unfollow(&user, payload.user_id).await?;

    Ok(Json(MessageResponse::new("Unfollowed successfully")))
}

/// Pending follow requests addressed to the caller
pub async fn list_follow_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let requests = state.follow_repository.list_pending_for(user.id).await?;

    Ok(Json(requests))
}

/// Accept or reject a pending follow request
pub async fn respond_to_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<RespondRequestBody>,
) -> ApiResult<impl IntoResponse> {
    let action = RespondAction::parse(&payload.action).ok_or_else(|| {
        ApiError::BadRequest("Invalid action, expected \"accept\" or \"reject\"".to_string())
    })?;

    let action = state
        .follow_service
        .respond(&user, payload.request_id, action)
        .await?;

    let message = match action {
        RespondAction::Accept => "Follow request accepted",
        RespondAction::Reject => "Follow request rejected",
    };

    Ok(Json(MessageResponse::new(message)))
}

/// A user's public profile plus the caller's relationship to them
pub async fn get_user_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .user_repository
        .find_profile(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let relation = state.follow_repository.relation_state(user.id, id).await?;

    Ok(Json(UserProfileResponse {
        id: profile.id,
        username: profile.username,
        profile_image_url: profile.profile_image_url,
        is_private: profile.is_private,
        relation: relation.as_str().to_string(),
    }))
}

/// Users following the caller
pub async fn list_followers(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let followers = state.follow_repository.list_followers(user.id).await?;

    Ok(Json(followers))
}

/// Users the caller follows
pub async fn list_following(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let following = state.follow_repository.list_following(user.id).await?;

    Ok(Json(following))
}

/// The caller's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let notifications = state.notification_repository.list_for(user.id).await?;

    Ok(Json(notifications))
}

/// The caller's unread notification count, served from cache when warm
pub async fn unread_notification_count(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let cache_key = unread_cache_key(user.id);

    match state.redis_pool.get(&cache_key).await {
        Ok(Some(cached)) => {
            if let Ok(count) = cached.parse::<i64>() {
                return Ok(Json(UnreadCountResponse { count }));
            }
        }
        Ok(None) => {}
        Err(e) => warn!("Unread counter cache read failed: {}", e),
    }

    let count = state.notification_repository.unread_count(user.id).await?;

    if let Err(e) = state
        .redis_pool
        .set(&cache_key, &count.to_string(), Some(60))
        .await
    {
        warn!("Unread counter cache write failed: {}", e);
    }

    Ok(Json(UnreadCountResponse { count }))
}

/// Mark one of the caller's notifications read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let updated = state
        .notification_repository
        .mark_read(id, user.id)
        .await?;

    if !updated {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    if let Err(e) = state.redis_pool.delete(&unread_cache_key(user.id)).await {
        warn!("Unread counter cache invalidation failed: {}", e);
    }

    Ok(Json(MessageResponse::new("Notification marked as read")))
}

/// Toggle the caller's account privacy
pub async fn update_privacy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<PrivacyUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let updated = state
        .user_repository
        .set_privacy(user.id, payload.is_private)
        .await?;

    if !updated {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let message = if payload.is_private {
        "Account is now private"
    } else {
        "Account is now public"
    };

    Ok(Json(MessageResponse::new(message)))
}
