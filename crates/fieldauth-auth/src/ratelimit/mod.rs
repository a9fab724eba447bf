//! Attempt limiting for logins and sensitive operations.

pub mod limiter;

pub use limiter::RateLimiter;
