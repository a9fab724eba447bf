//! Destinations for recorded security events.

use async_trait::async_trait;
use tokio::sync::Mutex;

use fieldauth_core::events::SecurityEvent;
use fieldauth_core::result::AppResult;

/// A destination for security events, e.g. an audit table or a SIEM feed.
///
/// Sinks run on the logger's background task; a slow or failing sink
/// never delays an authentication decision.
#[async_trait]
pub trait SecuritySink: Send + Sync + 'static {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Persist or forward one event.
    async fn record(&self, event: &SecurityEvent) -> AppResult<()>;
}

/// Keeps events in memory. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SecurityEvent>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, oldest first.
    pub async fn events(&self) -> Vec<SecurityEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl SecuritySink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn record(&self, event: &SecurityEvent) -> AppResult<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}
