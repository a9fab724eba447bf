//! Role-based access control entities.

pub mod assignment;
pub mod permission;
pub mod role;
pub mod stats;

pub use assignment::{RolePermission, UserPermissionOverride};
pub use permission::{Permission, PermissionKey};
pub use role::Role;
pub use stats::RbacStatistics;
