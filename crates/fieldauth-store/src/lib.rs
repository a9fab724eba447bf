//! # fieldauth-store
//!
//! Store ports consumed by the engine, one async trait per record family,
//! and [`MemoryStore`], an in-process implementation of all of them.
//!
//! Every port method returns `ErrorKind::StoreUnavailable` when the
//! backing store cannot be reached, so that callers never confuse an
//! outage with an authentication failure.

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::{DeviceStore, IdentityStore, InsertOutcome, LineageStore, RbacStore};
