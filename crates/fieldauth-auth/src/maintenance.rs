//! Periodic housekeeping: spent lineages, lapsed overrides, idle limiter
//! windows.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{error, info};

use fieldauth_core::result::AppResult;

use crate::ratelimit::RateLimiter;
use crate::rbac::PermissionResolver;
use crate::token::TokenService;

/// Counts from one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    /// Lineage records past their natural expiry that were deleted.
    pub lineages_purged: u64,
    /// Expired permission overrides that were deleted.
    pub overrides_removed: u64,
    /// Idle rate-limit windows that were dropped.
    pub limiter_windows_purged: u64,
}

/// Runs cleanup across the token, permission and limiter components.
#[derive(Clone)]
pub struct MaintenanceTask {
    tokens: TokenService,
    permissions: PermissionResolver,
    limiter: RateLimiter,
}

impl std::fmt::Debug for MaintenanceTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceTask").finish()
    }
}

impl MaintenanceTask {
    /// Creates a maintenance task.
    pub fn new(tokens: TokenService, permissions: PermissionResolver, limiter: RateLimiter) -> Self {
        Self {
            tokens,
            permissions,
            limiter,
        }
    }

    /// Runs one cleanup pass.
    pub async fn run_once(&self) -> AppResult<MaintenanceReport> {
        let report = MaintenanceReport {
            lineages_purged: self.tokens.purge_expired().await?,
            overrides_removed: self.permissions.cleanup_expired_overrides().await?,
            limiter_windows_purged: self.limiter.purge_stale(),
        };

        if report != MaintenanceReport::default() {
            info!(
                lineages = report.lineages_purged,
                overrides = report.overrides_removed,
                limiter_windows = report.limiter_windows_purged,
                "Maintenance pass completed"
            );
        }
        Ok(report)
    }

    /// Runs [`run_once`](Self::run_once) every `interval` on a background
    /// task. A failed pass is logged and the loop continues.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    error!(error = %e, "Maintenance pass failed");
                }
            }
        })
    }
}
