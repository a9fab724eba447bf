//! Device binding store port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fieldauth_core::result::AppResult;
use fieldauth_core::types::id::UserId;
use fieldauth_entity::device::DeviceBinding;

/// Result of an insert-if-absent.
#[derive(Debug, Clone)]
pub enum InsertOutcome<T> {
    /// The record was inserted.
    Inserted,
    /// A record already existed and was left untouched.
    Existing(T),
    /// The owner already holds the maximum number of live records.
    LimitReached {
        /// Live records held by the owner.
        active: usize,
    },
}

/// Read and write access to device bindings.
///
/// Reads must never be served from a cache; an administrative revocation
/// has to be visible to the very next lookup.
#[async_trait]
pub trait DeviceStore: Send + Sync + 'static {
    /// Find the binding for `(user, device_id)`, revoked or not.
    async fn find_binding(&self, user_id: UserId, device_id: &str)
    -> AppResult<Option<DeviceBinding>>;

    /// Atomically insert `binding` unless one already exists for its
    /// `(user, device_id)` or the user already holds `max_active`
    /// non-revoked bindings. The count and the insert form one step.
    async fn insert_binding_if_absent(
        &self,
        binding: DeviceBinding,
        max_active: usize,
    ) -> AppResult<InsertOutcome<DeviceBinding>>;

    /// Mark a binding revoked. Returns `false` if no binding exists.
    async fn revoke_binding(
        &self,
        user_id: UserId,
        device_id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Record a successful validation.
    async fn touch_binding(&self, user_id: UserId, device_id: &str, at: DateTime<Utc>)
    -> AppResult<()>;

    /// All bindings of a user, including revoked ones.
    async fn list_bindings(&self, user_id: UserId) -> AppResult<Vec<DeviceBinding>>;
}
