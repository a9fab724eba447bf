//! Store port traits.

pub mod device;
pub mod identity;
pub mod lineage;
pub mod rbac;

pub use device::{DeviceStore, InsertOutcome};
pub use identity::IdentityStore;
pub use lineage::LineageStore;
pub use rbac::RbacStore;
