//! Login rate limiter for slowing credential-stuffing attempts
//!
//! Counts failed attempts per key (the submitted username) inside a rolling
//! window and bans the key once the limit is hit. Successful logins clear
//! the counter. State is in-process only; each service instance limits
//! independently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Failed attempts allowed inside the window
    pub max_failures: u32,
    /// Rolling window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds once the limit is hit
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_seconds: 300,       // 5 minutes
            ban_duration_seconds: 900, // 15 minutes
        }
    }
}

#[derive(Debug)]
struct Entry {
    failures: u32,
    window_start: Instant,
    ban_expires: Option<Instant>,
}

/// Login rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether the key may attempt a login right now
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let Some(entry) = entries.get_mut(key) else {
            return true;
        };

        if let Some(ban_expires) = entry.ban_expires {
            if now < ban_expires {
                return false;
            }
            entry.failures = 0;
            entry.ban_expires = None;
        }

        if now.duration_since(entry.window_start) >= Duration::from_secs(self.config.window_seconds)
        {
            entry.failures = 0;
            entry.window_start = now;
        }

        entry.failures < self.config.max_failures
    }

    /// Record a failed attempt, banning the key once the limit is hit
    pub async fn record_failure(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(Entry {
            failures: 0,
            window_start: now,
            ban_expires: None,
        });

        if now.duration_since(entry.window_start) >= Duration::from_secs(self.config.window_seconds)
        {
            entry.failures = 0;
            entry.window_start = now;
        }

        entry.failures += 1;

        if entry.failures >= self.config.max_failures && entry.ban_expires.is_none() {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            warn!(
                "Banned login key {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
        }
    }

    /// Clear the failure counter after a successful login
    pub async fn clear(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_failures: 3,
            window_seconds: 300,
            ban_duration_seconds: 900,
        })
    }

    #[tokio::test]
    async fn fresh_key_is_allowed() {
        let limiter = limiter();
        assert!(limiter.is_allowed("ana").await);
    }

    #[tokio::test]
    async fn key_is_banned_after_max_failures() {
        let limiter = limiter();

        for _ in 0..3 {
            assert!(limiter.is_allowed("ana").await);
            limiter.record_failure("ana").await;
        }

        assert!(!limiter.is_allowed("ana").await);
    }

    #[tokio::test]
    async fn clear_resets_the_counter() {
        let limiter = limiter();

        limiter.record_failure("ana").await;
        limiter.record_failure("ana").await;
        limiter.clear("ana").await;

        limiter.record_failure("ana").await;
        assert!(limiter.is_allowed("ana").await);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = limiter();

        for _ in 0..3 {
            limiter.record_failure("ana").await;
        }

        assert!(!limiter.is_allowed("ana").await);
        assert!(limiter.is_allowed("bob").await);
    }
}
