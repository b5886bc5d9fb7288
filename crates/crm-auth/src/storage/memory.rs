//! In-memory credential store backed by `DashMap`.
//!
//! Each mutation runs under the write guard of the shard holding the id, so
//! `revoke` and `touch` on the same id never interleave. `sweep_expired`
//! uses `retain`, which takes the same guards shard by shard.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::audit::fingerprint;
use crate::error::AuthError;
use crate::storage::CredentialStore;
use crate::types::CredentialRecord;

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    records: DashMap<String, CredentialRecord>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` records.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn put(&self, record: CredentialRecord) -> AuthResult<()> {
        match self.records.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(AuthError::duplicate_id(fingerprint(&record.id))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn get(&self, id: &str) -> AuthResult<CredentialRecord> {
        self.records
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or(AuthError::NotFound)
    }

    async fn revoke(&self, id: &str, now: OffsetDateTime) -> AuthResult<bool> {
        let mut entry = self.records.get_mut(id).ok_or(AuthError::NotFound)?;
        let was_live = entry.is_live_at(now);
        entry.mark_revoked(now);
        Ok(was_live)
    }

    async fn delete(&self, id: &str) -> AuthResult<CredentialRecord> {
        self.records
            .remove(id)
            .map(|(_, record)| record)
            .ok_or(AuthError::NotFound)
    }

    async fn sweep_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let mut removed = 0u64;
        self.records.retain(|_, record| {
            let keep = record.expires_at >= now;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }

    async fn touch(&self, id: &str, now: OffsetDateTime) -> AuthResult<Option<CredentialRecord>> {
        let Some(mut entry) = self.records.get_mut(id) else {
            return Ok(None);
        };
        if !entry.is_live_at(now) {
            return Ok(None);
        }
        entry.mark_used(now);
        Ok(Some(entry.value().clone()))
    }

    async fn len(&self) -> AuthResult<usize> {
        Ok(self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use time::Duration;
    use time::macros::datetime;

    use crate::types::{ClientContext, CredentialKind};

    const T0: OffsetDateTime = datetime!(2026-03-01 10:00 UTC);

    fn token(id: &str, ttl: Duration) -> CredentialRecord {
        CredentialRecord::new(
            id.to_string(),
            "u1".to_string(),
            CredentialKind::Token {
                scope: BTreeSet::from(["read".to_string()]),
            },
            T0,
            T0 + ttl,
        )
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = InMemoryCredentialStore::new();
        store.put(token("a", Duration::minutes(15))).await.unwrap();

        let record = store.get("a").await.unwrap();
        assert_eq!(record.owner, "u1");
        assert_eq!(store.len().await.unwrap(), 1);
        assert!(!store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_put_duplicate_fails() {
        let store = InMemoryCredentialStore::new();
        store.put(token("a", Duration::minutes(15))).await.unwrap();

        let err = store
            .put(token("a", Duration::minutes(30)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateId { .. }));
        // Original record untouched.
        assert_eq!(
            store.get("a").await.unwrap().expires_at,
            T0 + Duration::minutes(15)
        );
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemoryCredentialStore::new();
        assert!(matches!(
            store.get("nope").await.unwrap_err(),
            AuthError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = InMemoryCredentialStore::new();
        store.put(token("a", Duration::minutes(15))).await.unwrap();

        assert!(store.revoke("a", T0).await.unwrap());
        assert!(!store.revoke("a", T0 + Duration::minutes(1)).await.unwrap());

        let record = store.get("a").await.unwrap();
        assert!(record.revoked);
        assert_eq!(record.revoked_at, Some(T0));
    }

    #[tokio::test]
    async fn test_revoke_missing() {
        let store = InMemoryCredentialStore::new();
        assert!(matches!(
            store.revoke("nope", T0).await.unwrap_err(),
            AuthError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_touch_marks_used_and_respects_state() {
        let store = InMemoryCredentialStore::new();
        store.put(token("a", Duration::minutes(15))).await.unwrap();

        let at = T0 + Duration::minutes(5);
        let record = store.touch("a", at).await.unwrap().unwrap();
        assert_eq!(record.last_used_at, Some(at));

        // Expired
        assert!(
            store
                .touch("a", T0 + Duration::minutes(16))
                .await
                .unwrap()
                .is_none()
        );

        // Revoked
        store.revoke("a", at).await.unwrap();
        assert!(store.touch("a", at).await.unwrap().is_none());

        // Missing
        assert!(store.touch("zzz", at).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryCredentialStore::new();
        store.put(token("a", Duration::minutes(15))).await.unwrap();

        let removed = store.delete("a").await.unwrap();
        assert_eq!(removed.id, "a");
        assert!(matches!(
            store.delete("a").await.unwrap_err(),
            AuthError::NotFound
        ));
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_expired_boundary() {
        let store = InMemoryCredentialStore::new();
        store.put(token("short", Duration::minutes(5))).await.unwrap();
        store.put(token("long", Duration::minutes(60))).await.unwrap();
        store
            .put(CredentialRecord::new(
                "session".to_string(),
                "u2".to_string(),
                CredentialKind::Session {
                    context: ClientContext::new(None, "curl/8.0"),
                },
                T0,
                T0 + Duration::hours(8),
            ))
            .await
            .unwrap();

        // expires_at == now is kept.
        assert_eq!(
            store.sweep_expired(T0 + Duration::minutes(5)).await.unwrap(),
            0
        );
        assert_eq!(
            store
                .sweep_expired(T0 + Duration::minutes(5) + Duration::seconds(1))
                .await
                .unwrap(),
            1
        );
        assert_eq!(store.len().await.unwrap(), 2);
        assert_eq!(
            store.sweep_expired(T0 + Duration::hours(9)).await.unwrap(),
            2
        );
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_revoke_races_touch() {
        let store = Arc::new(InMemoryCredentialStore::new());
        store.put(token("a", Duration::minutes(15))).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for _ in 0..200 {
                    let _ = store.touch("a", T0).await.unwrap();
                }
            }));
        }

        store.revoke("a", T0).await.unwrap();
        // Every touch that starts after revoke returned must see it.
        for _ in 0..100 {
            assert!(store.touch("a", T0).await.unwrap().is_none());
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert!(store.get("a").await.unwrap().revoked);
    }
}
