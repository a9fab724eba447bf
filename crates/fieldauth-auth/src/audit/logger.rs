//! Best-effort security logger.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use fieldauth_core::config::SecurityLogConfig;
use fieldauth_core::error::AppError;
use fieldauth_core::events::{SecurityEvent, Severity};
use fieldauth_core::result::AppResult;

use super::sink::SecuritySink;

/// Records security events.
///
/// Each event is emitted as a structured `tracing` event immediately and
/// then queued for the sinks. Recording never blocks and never fails: a
/// full queue or a closed worker only produces a warning.
#[derive(Debug, Clone)]
pub struct SecurityLogger {
    enabled: bool,
    queue: Option<mpsc::Sender<SecurityEvent>>,
}

impl SecurityLogger {
    /// Creates a logger and spawns its sink worker on the current Tokio
    /// runtime.
    pub fn spawn(
        config: &SecurityLogConfig,
        sinks: Vec<Arc<dyn SecuritySink>>,
    ) -> AppResult<Self> {
        if !config.enabled {
            return Ok(Self::disabled());
        }
        if sinks.is_empty() {
            return Ok(Self {
                enabled: true,
                queue: None,
            });
        }

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| AppError::internal(format!("Security logger needs a Tokio runtime: {e}")))?;
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        handle.spawn(drain(rx, sinks));

        Ok(Self {
            enabled: true,
            queue: Some(tx),
        })
    }

    /// A logger that records nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            queue: None,
        }
    }

    /// Records an event.
    pub fn record(&self, event: SecurityEvent) {
        if !self.enabled {
            return;
        }
        emit(&event);

        if let Some(queue) = &self.queue {
            if let Err(e) = queue.try_send(event) {
                warn!(error = %e, "Security event not delivered to sinks");
            }
        }
    }
}

fn emit(event: &SecurityEvent) {
    let user_id = event.user_id.map(|id| id.to_string());
    macro_rules! log_at {
        ($level:ident) => {
            $level!(
                target: "fieldauth::security",
                event_id = %event.id,
                event_type = %event.event_type,
                severity = %event.severity,
                outcome = ?event.outcome,
                user_id = user_id.as_deref(),
                identifier = event.identifier.as_deref(),
                source_addr = event.source_addr.as_deref(),
                device_id = event.device_id.as_deref(),
                details = event.details.as_deref(),
                "Security event"
            )
        };
    }
    match event.severity {
        Severity::Info => log_at!(info),
        Severity::Warning => log_at!(warn),
        Severity::Error | Severity::Critical => log_at!(error),
    }
}

async fn drain(mut rx: mpsc::Receiver<SecurityEvent>, sinks: Vec<Arc<dyn SecuritySink>>) {
    while let Some(event) = rx.recv().await {
        for sink in &sinks {
            if let Err(e) = sink.record(&event).await {
                warn!(sink = sink.name(), error = %e, "Security sink failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::sink::MemorySink;
    use async_trait::async_trait;
    use fieldauth_core::events::{Outcome, SecurityEventType};
    use std::time::Duration;

    struct FailingSink;

    #[async_trait]
    impl SecuritySink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        async fn record(&self, _event: &SecurityEvent) -> AppResult<()> {
            Err(AppError::internal("sink offline"))
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn test_events_reach_sinks_despite_failing_peer() {
        let memory = Arc::new(MemorySink::new());
        let logger = SecurityLogger::spawn(
            &SecurityLogConfig::default(),
            vec![Arc::new(FailingSink), memory.clone()],
        )
        .unwrap();

        logger.record(SecurityEvent::new(
            SecurityEventType::LoginSuccess,
            Outcome::Success,
        ));
        settle().await;

        let events = memory.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, SecurityEventType::LoginSuccess);
    }

    #[tokio::test]
    async fn test_full_queue_does_not_block() {
        let memory = Arc::new(MemorySink::new());
        let config = SecurityLogConfig {
            enabled: true,
            queue_capacity: 1,
        };
        let logger = SecurityLogger::spawn(&config, vec![memory.clone()]).unwrap();

        for _ in 0..50 {
            logger.record(SecurityEvent::new(
                SecurityEventType::LoginFailure,
                Outcome::Failure,
            ));
        }
        settle().await;

        let delivered = memory.events().await.len();
        assert!((1..50).contains(&delivered));
    }

    #[tokio::test]
    async fn test_disabled_logger_records_nothing() {
        let memory = Arc::new(MemorySink::new());
        let config = SecurityLogConfig {
            enabled: false,
            ..SecurityLogConfig::default()
        };
        let logger = SecurityLogger::spawn(&config, vec![memory.clone()]).unwrap();
        logger.record(SecurityEvent::new(SecurityEventType::Logout, Outcome::Success));
        settle().await;
        assert!(memory.events().await.is_empty());
    }
}
