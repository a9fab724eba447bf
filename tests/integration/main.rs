//! End-to-end tests for the engine against the in-memory store.

mod helpers;

mod device_test;
mod permission_test;
mod rate_limit_test;
mod refresh_test;
mod session_test;
