//! Credential record storage trait.
//!
//! # Implementation Notes
//!
//! Implementations must make `revoke`, `touch`, `delete` and
//! `sweep_expired` linearizable per record id: once `revoke` has returned,
//! no later `touch` of the same id may report the record live.
//!
//! # Security Considerations
//!
//! - Never log credential ids in full
//! - `touch` must check state and mark usage atomically
//! - Expired records should be swept periodically by the owner of the store

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::types::CredentialRecord;

/// Storage trait for credential records.
///
/// # Example Implementation
///
/// ```ignore
/// use crm_auth::storage::CredentialStore;
///
/// struct KvCredentialStore {
///     client: kv::Client,
/// }
///
/// #[async_trait::async_trait]
/// impl CredentialStore for KvCredentialStore {
///     async fn put(&self, record: CredentialRecord) -> AuthResult<()> {
///         // SET NX, mapping an existing key to AuthError::DuplicateId
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::DuplicateId` if a record with the same id exists.
    async fn put(&self, record: CredentialRecord) -> AuthResult<()>;

    /// Returns a snapshot of the record regardless of its state.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if no record has this id.
    async fn get(&self, id: &str) -> AuthResult<CredentialRecord>;

    /// Flags the record revoked.
    ///
    /// Idempotent: revoking twice succeeds. Returns `true` if the record was
    /// live at `now` immediately before this call.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if no record has this id.
    async fn revoke(&self, id: &str, now: OffsetDateTime) -> AuthResult<bool>;

    /// Removes the record and returns it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotFound` if no record has this id.
    async fn delete(&self, id: &str) -> AuthResult<CredentialRecord>;

    /// Removes every record with `expires_at < now`.
    ///
    /// # Returns
    ///
    /// The number of records removed.
    async fn sweep_expired(&self, now: OffsetDateTime) -> AuthResult<u64>;

    /// Atomically checks that the record is live at `now` and marks it used.
    ///
    /// Returns `None` if the record is missing, revoked or expired.
    async fn touch(&self, id: &str, now: OffsetDateTime) -> AuthResult<Option<CredentialRecord>>;

    /// Number of stored records, live or not.
    async fn len(&self) -> AuthResult<usize>;

    /// Returns `true` if the store holds no records.
    async fn is_empty(&self) -> AuthResult<bool> {
        Ok(self.len().await? == 0)
    }
}

/// Type alias for a shareable store instance.
pub type DynCredentialStore = Arc<dyn CredentialStore>;
