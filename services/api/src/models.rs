//! API service models and request/response types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub mod follow;
pub mod notification;

/// Public view of a user profile
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub profile_image_url: Option<String>,
    pub is_private: bool,
}

/// Request body for follow/unfollow actions
#[derive(Debug, Deserialize)]
pub struct FollowActionRequest {
    pub user_id: Uuid,
}

/// Request body for responding to a follow request
///
/// `action` arrives as a raw string so an unknown value maps to a 400
/// rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct RespondRequestBody {
    pub request_id: Uuid,
    pub action: String,
}

/// Request body for the privacy toggle
#[derive(Debug, Deserialize)]
pub struct PrivacyUpdateRequest {
    pub is_private: bool,
}

/// Plain confirmation message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Unread notification counter
#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}
