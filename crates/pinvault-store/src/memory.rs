// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory stores for tests and ephemeral use.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use pinvault_core::{
    ContentStore, CredentialRecord, CredentialStore, EncryptedRecord, PinvaultError, RecordId,
    UserId, Version, Versioned,
};

/// Credential store backed by a `HashMap` behind an async lock.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: RwLock<HashMap<UserId, Versioned<CredentialRecord>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get_envelope(
        &self,
        user: &UserId,
    ) -> Result<Option<Versioned<CredentialRecord>>, PinvaultError> {
        Ok(self.records.read().await.get(user).cloned())
    }

    async fn put_envelope(
        &self,
        user: &UserId,
        record: &CredentialRecord,
        expected: Option<Version>,
    ) -> Result<Version, PinvaultError> {
        // The write lock spans compare and swap.
        let mut records = self.records.write().await;
        let current = records.get(user).map(|stored| stored.version);
        if current != expected {
            return Err(PinvaultError::VersionConflict {
                user: user.to_string(),
            });
        }

        let version = current.map_or(Version::INITIAL, Version::next);
        records.insert(
            user.clone(),
            Versioned {
                version,
                value: record.clone(),
            },
        );
        Ok(version)
    }
}

/// Content store backed by a `HashMap` keyed by owner and record id.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    records: RwLock<HashMap<(UserId, RecordId), EncryptedRecord>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn key(owner: &UserId, id: &RecordId) -> (UserId, RecordId) {
    (owner.clone(), id.clone())
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn get_record(
        &self,
        owner: &UserId,
        id: &RecordId,
    ) -> Result<Option<EncryptedRecord>, PinvaultError> {
        Ok(self.records.read().await.get(&key(owner, id)).cloned())
    }

    async fn put_record(
        &self,
        owner: &UserId,
        id: &RecordId,
        record: &EncryptedRecord,
    ) -> Result<(), PinvaultError> {
        self.records
            .write()
            .await
            .insert(key(owner, id), record.clone());
        Ok(())
    }

    async fn delete_record(&self, owner: &UserId, id: &RecordId) -> Result<bool, PinvaultError> {
        Ok(self.records.write().await.remove(&key(owner, id)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pinvault_core::MasterKeyEnvelope;

    use super::*;

    fn record(tag: u8) -> CredentialRecord {
        CredentialRecord {
            pin_hash: format!("hash-{tag}"),
            envelope: MasterKeyEnvelope {
                wrapped_key: vec![tag; 32],
                wrap_iv: [tag; 16],
                wrap_auth_tag: [tag; 16],
                pin_salt: [tag; 32],
                kdf: None,
            },
        }
    }

    fn alice() -> UserId {
        UserId("alice".into())
    }

    #[tokio::test]
    async fn first_write_requires_absent_record() {
        let store = MemoryCredentialStore::new();

        let v1 = store.put_envelope(&alice(), &record(1), None).await.unwrap();
        assert_eq!(v1, Version::INITIAL);

        let again = store.put_envelope(&alice(), &record(2), None).await;
        assert!(matches!(again, Err(PinvaultError::VersionConflict { .. })));

        let stored = store.get_envelope(&alice()).await.unwrap().unwrap();
        assert_eq!(stored.value, record(1));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = MemoryCredentialStore::new();
        let v1 = store.put_envelope(&alice(), &record(1), None).await.unwrap();
        let v2 = store
            .put_envelope(&alice(), &record(2), Some(v1))
            .await
            .unwrap();
        assert_eq!(v2, v1.next());

        let stale = store.put_envelope(&alice(), &record(3), Some(v1)).await;
        assert!(matches!(stale, Err(PinvaultError::VersionConflict { .. })));

        let stored = store.get_envelope(&alice()).await.unwrap().unwrap();
        assert_eq!(stored.version, v2);
        assert_eq!(stored.value, record(2));
    }

    #[tokio::test]
    async fn update_of_missing_record_is_a_conflict() {
        let store = MemoryCredentialStore::new();
        let result = store
            .put_envelope(&alice(), &record(1), Some(Version::INITIAL))
            .await;
        assert!(matches!(result, Err(PinvaultError::VersionConflict { .. })));
    }

    #[tokio::test]
    async fn concurrent_writers_at_same_version_have_one_winner() {
        let store = Arc::new(MemoryCredentialStore::new());
        let v1 = store.put_envelope(&alice(), &record(0), None).await.unwrap();

        let mut handles = Vec::new();
        for tag in 1..=8u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.put_envelope(&alice(), &record(tag), Some(v1)).await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn content_put_get_delete() {
        let store = MemoryContentStore::new();
        let id = RecordId("db".into());
        let rec = EncryptedRecord {
            ciphertext: vec![1, 2, 3],
            iv: [4; 16],
            auth_tag: [5; 16],
        };

        assert!(store.get_record(&alice(), &id).await.unwrap().is_none());
        store.put_record(&alice(), &id, &rec).await.unwrap();
        assert_eq!(store.get_record(&alice(), &id).await.unwrap(), Some(rec));
        assert_eq!(store.len().await, 1);

        assert!(store.delete_record(&alice(), &id).await.unwrap());
        assert!(!store.delete_record(&alice(), &id).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn same_record_id_under_two_owners_is_two_records() {
        let store = MemoryContentStore::new();
        let bob = UserId("bob".into());
        let id = RecordId("db".into());
        let mine = EncryptedRecord {
            ciphertext: vec![1],
            iv: [1; 16],
            auth_tag: [1; 16],
        };
        let theirs = EncryptedRecord {
            ciphertext: vec![2],
            iv: [2; 16],
            auth_tag: [2; 16],
        };

        store.put_record(&alice(), &id, &mine).await.unwrap();
        store.put_record(&bob, &id, &theirs).await.unwrap();
        assert_eq!(store.len().await, 2);

        assert!(store.delete_record(&bob, &id).await.unwrap());
        assert_eq!(store.get_record(&alice(), &id).await.unwrap(), Some(mine));
        assert!(store.get_record(&bob, &id).await.unwrap().is_none());
    }
}
