//! Best-effort notification dispatch
//!
//! Contract: at-least-once, fire-and-forget, never retried. A dispatch
//! records the notification, invalidates the recipient's unread counter,
//! and pushes to each live device handle; any failure along the way is
//! logged and swallowed so the follow/accept operation that triggered it
//! can never fail on delivery.

use serde_json::json;
use tracing::{error, warn};

use common::cache::RedisPool;

use crate::models::notification::NewNotification;
use crate::push::PushClient;
use crate::repositories::NotificationRepository;

/// Cache key for a user's unread notification counter
pub fn unread_cache_key(user_id: uuid::Uuid) -> String {
    format!("unread_notifications:{}", user_id)
}

/// Notification dispatcher
#[derive(Clone)]
pub struct Notifier {
    notifications: NotificationRepository,
    push: PushClient,
    cache: RedisPool,
}

impl Notifier {
    /// Create a new notifier
    pub fn new(notifications: NotificationRepository, push: PushClient, cache: RedisPool) -> Self {
        Self {
            notifications,
            push,
            cache,
        }
    }

    /// Record a notification and push it to the recipient's devices
    ///
    /// Infallible by contract; see the module docs.
    pub async fn dispatch(&self, notification: NewNotification) {
        let recipient_id = notification.recipient_id;

        let reference_id = match self.notifications.create(&notification).await {
            Ok(stored) => stored.reference_id,
            Err(e) => {
                error!("Failed to record notification: {}", e);
                notification.reference_id
            }
        };

        if let Err(e) = self.cache.delete(&unread_cache_key(recipient_id)).await {
            warn!("Failed to invalidate unread counter: {}", e);
        }

        let tokens = match self.notifications.active_push_tokens(recipient_id).await {
            Ok(tokens) => tokens,
            Err(e) => {
                error!("Failed to resolve push handles: {}", e);
                return;
            }
        };

        let data = json!({
            "kind": notification.kind.as_str(),
            "reference_id": reference_id,
        });

        for token in tokens {
            if let Err(e) = self
                .push
                .send(&token, &notification.title, &notification.body, data.clone())
                .await
            {
                error!("Push delivery failed: {}", e);
            }
        }
    }
}
