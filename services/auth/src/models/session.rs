//! Session model and related functionality
//!
//! A session row is created per issued token and flipped inactive on
//! logout; rows are never deleted on logout so device history survives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Session entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    /// SHA-256 hex fingerprint of the issued token
    pub token_hash: String,
    pub device_name: Option<String>,
    pub ip_address: Option<String>,
    /// Mobile push handle registered by the client, if any
    pub push_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New session creation payload
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: Uuid,
    pub token_hash: String,
    pub device_name: Option<String>,
    pub ip_address: Option<String>,
    pub push_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}
