//! Fixed-window attempt counters with lockout.
//!
//! Each key owns one window. Check-and-increment runs under the map's
//! entry lock, so concurrent attempts for one key are counted exactly.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, warn};

use fieldauth_core::config::RateLimitConfig;
use fieldauth_core::error::AppError;
use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::UserId;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started_at: Instant,
    locked_until: Option<Instant>,
    last_seen: Instant,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            started_at: now,
            locked_until: None,
            last_seen: now,
        }
    }

    fn restart(&mut self, now: Instant) {
        self.count = 0;
        self.started_at = now;
        self.locked_until = None;
    }
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_attempts: u32,
    window: Duration,
    lockout: Option<Duration>,
}

/// Counts attempts per key and rejects once a key is over its limit.
///
/// Login keys combine the identifier and source address; operation keys
/// combine the user and the operation name. Only login keys lock out.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    logins: Arc<DashMap<String, Window>>,
    operations: Arc<DashMap<String, Window>>,
    login_limits: Limits,
    operation_limits: Limits,
}

impl RateLimiter {
    /// Creates a limiter from configuration.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            logins: Arc::new(DashMap::new()),
            operations: Arc::new(DashMap::new()),
            login_limits: Limits {
                max_attempts: config.login_max_attempts,
                window: Duration::from_secs(config.login_window_seconds),
                lockout: (config.lockout_seconds > 0)
                    .then(|| Duration::from_secs(config.lockout_seconds)),
            },
            operation_limits: Limits {
                max_attempts: config.operation_max_attempts,
                window: Duration::from_secs(config.operation_window_seconds),
                lockout: None,
            },
        }
    }

    fn login_key(identifier: &str, source_addr: Option<&str>) -> String {
        format!(
            "login:{}:{}",
            source_addr.unwrap_or("unknown"),
            identifier.trim().to_lowercase()
        )
    }

    fn operation_key(user_id: UserId, operation: &str) -> String {
        format!("op:{user_id}:{operation}")
    }

    fn hit(map: &DashMap<String, Window>, key: String, limits: Limits) -> AppResult<()> {
        let now = Instant::now();
        let mut window = map.entry(key.clone()).or_insert_with(|| Window::new(now));
        window.last_seen = now;

        if let Some(until) = window.locked_until {
            if now < until {
                let retry = until.duration_since(now).as_secs().max(1);
                return Err(AppError::rate_limited(format!(
                    "Too many attempts; retry in {retry}s"
                )));
            }
            window.restart(now);
        }
        if now.duration_since(window.started_at) >= limits.window {
            window.restart(now);
        }

        if window.count >= limits.max_attempts {
            let until = match limits.lockout {
                Some(lockout) => {
                    let until = now + lockout;
                    window.locked_until = Some(until);
                    until
                }
                None => window.started_at + limits.window,
            };
            let retry = until.duration_since(now).as_secs().max(1);
            warn!(key = %key, attempts = window.count, "Rate limit exceeded");
            return Err(AppError::rate_limited(format!(
                "Too many attempts; retry in {retry}s"
            )));
        }

        window.count += 1;
        Ok(())
    }

    /// Counts a login attempt and fails with `RateLimited` if the
    /// `(identifier, source_addr)` key is over its limit or locked out.
    pub fn check_login(&self, identifier: &str, source_addr: Option<&str>) -> AppResult<()> {
        Self::hit(
            &self.logins,
            Self::login_key(identifier, source_addr),
            self.login_limits,
        )
    }

    /// Clears the login counter after a successful login.
    pub fn reset_login(&self, identifier: &str, source_addr: Option<&str>) {
        self.logins
            .remove(&Self::login_key(identifier, source_addr));
    }

    /// Counts a sensitive operation for a user.
    pub fn check_operation(&self, user_id: UserId, operation: &str) -> AppResult<()> {
        Self::hit(
            &self.operations,
            Self::operation_key(user_id, operation),
            self.operation_limits,
        )
    }

    /// Login attempts left in the current window for the key.
    pub fn remaining_login_attempts(&self, identifier: &str, source_addr: Option<&str>) -> u32 {
        let now = Instant::now();
        match self.logins.get(&Self::login_key(identifier, source_addr)) {
            Some(window) if window.locked_until.is_some_and(|until| now < until) => 0,
            Some(window) if now.duration_since(window.started_at) < self.login_limits.window => {
                self.login_limits.max_attempts.saturating_sub(window.count)
            }
            _ => self.login_limits.max_attempts,
        }
    }

    /// Drops windows idle for longer than their window length, keeping
    /// keys that are still locked out. Returns the number removed.
    pub fn purge_stale(&self) -> u64 {
        let now = Instant::now();
        let mut removed = 0u64;
        for (map, limits) in [
            (&self.logins, self.login_limits),
            (&self.operations, self.operation_limits),
        ] {
            let before = map.len();
            map.retain(|_, w| {
                let locked = w.locked_until.is_some_and(|until| now < until);
                locked || now.duration_since(w.last_seen) < limits.window
            });
            removed += before.saturating_sub(map.len()) as u64;
        }
        if removed > 0 {
            debug!(removed, "Purged stale rate-limit windows");
        }
        removed
    }
}
