//! Cache key builders for all FieldAuth cache entries.

use uuid::Uuid;

/// Prefix applied to all FieldAuth cache keys.
const PREFIX: &str = "fieldauth";

/// Cache key for the resolved effective permission set of a user.
pub fn effective_permissions(user_id: Uuid) -> String {
    format!("{PREFIX}:perm:user:{user_id}")
}

/// Pattern matching every cached effective permission set.
pub fn effective_permissions_pattern() -> String {
    format!("{PREFIX}:perm:user:*")
}
