//! Refresh-token lineage records.

pub mod model;

pub use model::LineageRecord;
