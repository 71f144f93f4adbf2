//! Follow graph models
//!
//! A (follower, target) pair is always in exactly one of three states:
//! no relation, a pending request (private target), or an established
//! follow edge. Transitions are driven by the follow service; uniqueness
//! is enforced by storage constraints, not application locks.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Relationship state for an ordered (follower, target) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationState {
    NoRelation,
    Pending,
    Following,
}

impl RelationState {
    /// Wire value used in profile responses
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationState::NoRelation => "none",
            RelationState::Pending => "pending",
            RelationState::Following => "following",
        }
    }
}

/// Status of a follow request row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }
}

/// Action a target user takes on a pending follow request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespondAction {
    Accept,
    Reject,
}

impl RespondAction {
    /// Parse the wire value; anything but "accept"/"reject" is invalid
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "accept" => Some(RespondAction::Accept),
            "reject" => Some(RespondAction::Reject),
            _ => None,
        }
    }
}

/// Follow request entity
#[derive(Debug, Clone, FromRow)]
pub struct FollowRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub target_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pending request as listed to the target user
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PendingRequest {
    pub request_id: Uuid,
    pub from_user_id: Uuid,
    pub from_username: String,
    pub from_profile_image_url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respond_action_parses_known_values_only() {
        assert_eq!(RespondAction::parse("accept"), Some(RespondAction::Accept));
        assert_eq!(RespondAction::parse("reject"), Some(RespondAction::Reject));
        assert_eq!(RespondAction::parse("Accept"), None);
        assert_eq!(RespondAction::parse("block"), None);
        assert_eq!(RespondAction::parse(""), None);
    }
}
