//! Core traits defined in `fieldauth-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
