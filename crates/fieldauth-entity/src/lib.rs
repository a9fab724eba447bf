//! # fieldauth-entity
//!
//! Domain entity models for FieldAuth. Every struct in this crate
//! represents a stored record or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, and `Deserialize`.

pub mod device;
pub mod identity;
pub mod lineage;
pub mod rbac;
