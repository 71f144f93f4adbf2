//! Notification models

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Kind of event a notification records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Someone asked to follow a private account
    FollowRequest,
    /// Someone started following a public account
    NewFollower,
    /// A follow request was accepted
    RequestAccepted,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::FollowRequest => "follow_request",
            NotificationKind::NewFollower => "new_follower",
            NotificationKind::RequestAccepted => "request_accepted",
        }
    }
}

/// Notification entity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: String,
    /// The originating request or user, when there is one
    pub reference_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// New notification payload
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub reference_id: Option<Uuid>,
}
