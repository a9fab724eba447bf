//! Session state machine and the flows that drive it.

pub mod orchestrator;
pub mod state;

pub use orchestrator::{AuthorizationDecision, LoginRequest, SessionOrchestrator, SessionResult};
pub use state::{SessionEvent, SessionState};
