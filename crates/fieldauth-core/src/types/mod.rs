//! Core type definitions used across the FieldAuth workspace.

pub mod id;

pub use id::*;
