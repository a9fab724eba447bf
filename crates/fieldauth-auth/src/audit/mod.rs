//! Security event logging.

pub mod logger;
pub mod sink;

pub use logger::SecurityLogger;
pub use sink::{MemorySink, SecuritySink};
