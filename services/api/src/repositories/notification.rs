//! Notification repository

use common::error::{DatabaseError, DatabaseResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::notification::{NewNotification, Notification};

/// Notification repository
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a notification record
    pub async fn create(&self, new: &NewNotification) -> DatabaseResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (recipient_id, kind, title, body, reference_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, recipient_id, kind, title, body, reference_id, is_read, created_at
            "#,
        )
        .bind(new.recipient_id)
        .bind(new.kind.as_str())
        .bind(&new.title)
        .bind(&new.body)
        .bind(new.reference_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(notification)
    }

    /// List a user's notifications, newest first
    pub async fn list_for(&self, recipient_id: Uuid) -> DatabaseResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, recipient_id, kind, title, body, reference_id, is_read, created_at
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            LIMIT 50
            "#,
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(notifications)
    }

    /// Mark a notification read; only the recipient can flip the flag
    pub async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = $1 AND recipient_id = $2
            "#,
        )
        .bind(id)
        .bind(recipient_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    /// Count a user's unread notifications
    pub async fn unread_count(&self, recipient_id: Uuid) -> DatabaseResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE recipient_id = $1 AND NOT is_read
            "#,
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(count)
    }

    /// Push handles from the user's live sessions
    ///
    /// A handle is live while its session is active and unexpired; logout
    /// therefore also stops push delivery to that device.
    pub async fn active_push_tokens(&self, user_id: Uuid) -> DatabaseResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT push_token FROM sessions
            WHERE user_id = $1
              AND is_active
              AND expires_at > NOW()
              AND push_token IS NOT NULL
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(rows.into_iter().map(|(token,)| token).collect())
    }
}
