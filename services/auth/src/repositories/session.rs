//! Session repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewSession, Session};

/// SHA-256 hex fingerprint of an issued token, stored instead of the token
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

/// Session repository
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a session record for a freshly issued token
    pub async fn create(&self, new_session: &NewSession) -> DatabaseResult<Session> {
        info!("Creating session for user: {}", new_session.user_id);

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, token_hash, device_name, ip_address,
                                  push_token, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, token_hash, device_name, ip_address, push_token,
                      expires_at, is_active, created_at, updated_at
            "#,
        )
        .bind(new_session.user_id)
        .bind(&new_session.token_hash)
        .bind(&new_session.device_name)
        .bind(&new_session.ip_address)
        .bind(&new_session.push_token)
        .bind(new_session.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(session)
    }

    /// Mark every active session for a user inactive
    ///
    /// Rows are kept, not deleted. Already-issued tokens remain
    /// cryptographically valid until expiry; this only records that the
    /// sessions were closed.
    pub async fn invalidate_all_for_user(&self, user_id: Uuid) -> DatabaseResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET is_active = FALSE, updated_at = NOW()
            WHERE user_id = $1 AND is_active
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        info!(
            "Invalidated {} session(s) for user {}",
            result.rows_affected(),
            user_id
        );

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_hex() {
        let a = token_fingerprint("abc.def.ghi");
        let b = token_fingerprint("abc.def.ghi");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_differs_per_token() {
        assert_ne!(token_fingerprint("token-one"), token_fingerprint("token-two"));
    }
}
