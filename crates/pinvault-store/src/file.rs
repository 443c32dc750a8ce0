// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-file persistence for credential records and encrypted records.
//!
//! Layout under the data directory:
//!
//! ```text
//! credentials/<user>.json        {"version": n, "record": {...}}
//! records/<user>/<record>.json   {"ciphertext": "...", "iv": "...", "auth_tag": "..."}
//! ```
//!
//! Every write goes to a temporary file in the target directory and is then
//! renamed over the destination, so readers only ever see a complete file.
//! Temporary files are created with owner-only permissions on Unix and the
//! rename keeps them.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tracing::debug;

use pinvault_core::{
    ContentStore, CredentialRecord, CredentialStore, EncryptedRecord, PinvaultError, RecordId,
    UserId, Version, Versioned,
};

const CREDENTIALS_DIR: &str = "credentials";
const RECORDS_DIR: &str = "records";

#[derive(Serialize, Deserialize)]
struct CredentialFile {
    version: Version,
    record: CredentialRecord,
}

/// File-backed implementation of both store contracts.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    /// Serializes the read-compare-write of `put_envelope`.
    credential_lock: Mutex<()>,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `data_dir`.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, PinvaultError> {
        let root = data_dir.into();
        for sub in [CREDENTIALS_DIR, RECORDS_DIR] {
            tokio::fs::create_dir_all(root.join(sub))
                .await
                .map_err(PinvaultError::storage)?;
        }
        debug!(path = %root.display(), "file store opened");
        Ok(Self {
            root,
            credential_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn credential_path(&self, user: &UserId) -> Result<PathBuf, PinvaultError> {
        validate_id("account", &user.0)?;
        Ok(self.root.join(CREDENTIALS_DIR).join(format!("{}.json", user.0)))
    }

    fn owner_dir(&self, owner: &UserId) -> Result<PathBuf, PinvaultError> {
        validate_id("account", &owner.0)?;
        Ok(self.root.join(RECORDS_DIR).join(&owner.0))
    }

    fn record_path(&self, owner: &UserId, id: &RecordId) -> Result<PathBuf, PinvaultError> {
        validate_id("record", &id.0)?;
        Ok(self.owner_dir(owner)?.join(format!("{}.json", id.0)))
    }
}

/// Identifiers become file names: `[A-Za-z0-9._-]`, not starting with a dot.
fn validate_id(kind: &str, id: &str) -> Result<(), PinvaultError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if id.is_empty() || id.starts_with('.') || !id.chars().all(allowed) {
        return Err(PinvaultError::InvalidIdentifier(format!(
            "invalid {kind} identifier `{id}`: use letters, digits, '.', '_' or '-'"
        )));
    }
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PinvaultError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PinvaultError::storage(e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| PinvaultError::Corrupted(format!("{}: {e}", path.display())))
}

async fn write_json_atomic<T: Serialize>(path: PathBuf, value: &T) -> Result<(), PinvaultError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| PinvaultError::Internal(format!("serialization failed: {e}")))?;

    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::Builder::new().prefix(".tmp").tempfile_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| PinvaultError::Internal(format!("file write task failed: {e}")))?
    .map_err(PinvaultError::storage)
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn get_envelope(
        &self,
        user: &UserId,
    ) -> Result<Option<Versioned<CredentialRecord>>, PinvaultError> {
        let path = self.credential_path(user)?;
        let file: Option<CredentialFile> = read_json(&path).await?;
        Ok(file.map(|f| Versioned {
            version: f.version,
            value: f.record,
        }))
    }

    async fn put_envelope(
        &self,
        user: &UserId,
        record: &CredentialRecord,
        expected: Option<Version>,
    ) -> Result<Version, PinvaultError> {
        let path = self.credential_path(user)?;
        let _guard = self.credential_lock.lock().await;

        let current: Option<CredentialFile> = read_json(&path).await?;
        let current = current.map(|f| f.version);
        if current != expected {
            return Err(PinvaultError::VersionConflict {
                user: user.to_string(),
            });
        }

        let version = current.map_or(Version::INITIAL, Version::next);
        let file = CredentialFile {
            version,
            record: record.clone(),
        };
        write_json_atomic(path, &file).await?;
        debug!(user = %user, version = %version, "credential record written");
        Ok(version)
    }
}

#[async_trait]
impl ContentStore for FileStore {
    async fn get_record(
        &self,
        owner: &UserId,
        id: &RecordId,
    ) -> Result<Option<EncryptedRecord>, PinvaultError> {
        read_json(&self.record_path(owner, id)?).await
    }

    async fn put_record(
        &self,
        owner: &UserId,
        id: &RecordId,
        record: &EncryptedRecord,
    ) -> Result<(), PinvaultError> {
        let path = self.record_path(owner, id)?;
        tokio::fs::create_dir_all(self.owner_dir(owner)?)
            .await
            .map_err(PinvaultError::storage)?;
        write_json_atomic(path, record).await
    }

    async fn delete_record(&self, owner: &UserId, id: &RecordId) -> Result<bool, PinvaultError> {
        match tokio::fs::remove_file(self.record_path(owner, id)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PinvaultError::storage(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pinvault_core::MasterKeyEnvelope;
    use tempfile::tempdir;

    use super::*;

    fn record(tag: u8) -> CredentialRecord {
        CredentialRecord {
            pin_hash: format!("$argon2id$hash-{tag}"),
            envelope: MasterKeyEnvelope {
                wrapped_key: vec![tag; 32],
                wrap_iv: [tag; 16],
                wrap_auth_tag: [tag; 16],
                pin_salt: [tag; 32],
                kdf: None,
            },
        }
    }

    fn blob(tag: u8) -> EncryptedRecord {
        EncryptedRecord {
            ciphertext: vec![tag; 3],
            iv: [tag; 16],
            auth_tag: [tag; 16],
        }
    }

    fn alice() -> UserId {
        UserId("alice".into())
    }

    #[tokio::test]
    async fn open_creates_layout() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("vault")).await.unwrap();
        assert!(store.root().join("credentials").is_dir());
        assert!(store.root().join("records").is_dir());
    }

    #[tokio::test]
    async fn credential_roundtrip_and_cas() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        assert!(store.get_envelope(&alice()).await.unwrap().is_none());
        let v1 = store.put_envelope(&alice(), &record(1), None).await.unwrap();
        assert_eq!(v1, Version::INITIAL);

        let conflict = store.put_envelope(&alice(), &record(9), None).await;
        assert!(matches!(conflict, Err(PinvaultError::VersionConflict { .. })));

        let v2 = store
            .put_envelope(&alice(), &record(2), Some(v1))
            .await
            .unwrap();
        let stale = store.put_envelope(&alice(), &record(3), Some(v1)).await;
        assert!(matches!(stale, Err(PinvaultError::VersionConflict { .. })));

        let stored = store.get_envelope(&alice()).await.unwrap().unwrap();
        assert_eq!(stored.version, v2);
        assert_eq!(stored.value, record(2));
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).await.unwrap();
            store.put_envelope(&alice(), &record(7), None).await.unwrap();
        }

        let store = FileStore::open(dir.path()).await.unwrap();
        let stored = store.get_envelope(&alice()).await.unwrap().unwrap();
        assert_eq!(stored.value, record(7));
    }

    #[tokio::test]
    async fn files_hold_lowercase_hex() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.put_envelope(&alice(), &record(0xab), None).await.unwrap();

        let text = std::fs::read_to_string(dir.path().join("credentials/alice.json")).unwrap();
        assert!(text.contains(&hex::encode([0xabu8; 16])));
        assert!(!text.contains("AB"));
    }

    #[tokio::test]
    async fn no_temporary_files_left_behind() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        store.put_envelope(&alice(), &record(1), None).await.unwrap();
        store
            .put_record(&alice(), &RecordId("db".into()), &blob(1))
            .await
            .unwrap();

        for sub in ["credentials", "records/alice"] {
            let names: Vec<_> = std::fs::read_dir(dir.path().join(sub))
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect();
            assert_eq!(names.len(), 1, "{sub}: {names:?}");
            assert!(names[0].ends_with(".json"));
        }
    }

    #[tokio::test]
    async fn corrupted_file_is_reported() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        std::fs::write(dir.path().join("credentials/alice.json"), b"{not json").unwrap();

        let result = store.get_envelope(&alice()).await;
        assert!(matches!(result, Err(PinvaultError::Corrupted(_))));
    }

    #[tokio::test]
    async fn path_like_identifiers_are_rejected() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        for bad in ["", "../escape", "a/b", ".hidden", "white space"] {
            let result = store.get_envelope(&UserId(bad.into())).await;
            assert!(
                matches!(result, Err(PinvaultError::InvalidIdentifier(_))),
                "{bad:?} should be rejected"
            );
            let result = store.delete_record(&alice(), &RecordId(bad.into())).await;
            assert!(matches!(result, Err(PinvaultError::InvalidIdentifier(_))));
            let result = store
                .put_record(&UserId(bad.into()), &RecordId("db".into()), &blob(0))
                .await;
            assert!(matches!(result, Err(PinvaultError::InvalidIdentifier(_))));
        }
    }

    #[tokio::test]
    async fn record_put_replace_delete() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let id = RecordId("api.key-1".into());

        store.put_record(&alice(), &id, &blob(1)).await.unwrap();
        store.put_record(&alice(), &id, &blob(2)).await.unwrap();
        assert_eq!(store.get_record(&alice(), &id).await.unwrap(), Some(blob(2)));

        assert!(store.delete_record(&alice(), &id).await.unwrap());
        assert!(!store.delete_record(&alice(), &id).await.unwrap());
        assert!(store.get_record(&alice(), &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn records_are_kept_per_owner() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        let bob = UserId("bob".into());
        let id = RecordId("db".into());

        store.put_record(&alice(), &id, &blob(1)).await.unwrap();
        store.put_record(&bob, &id, &blob(2)).await.unwrap();
        assert!(dir.path().join("records/alice/db.json").is_file());
        assert!(dir.path().join("records/bob/db.json").is_file());

        assert!(store.delete_record(&bob, &id).await.unwrap());
        assert_eq!(store.get_record(&alice(), &id).await.unwrap(), Some(blob(1)));
        assert!(!store.delete_record(&bob, &id).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_writers_at_same_version_have_one_winner() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileStore::open(dir.path()).await.unwrap());
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
}
