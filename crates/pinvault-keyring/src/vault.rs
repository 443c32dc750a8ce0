// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account lifecycle: create, verify PIN, store, read, delete, change PIN.
//!
//! [`SecretVault`] composes the master key manager, the PIN hasher and the
//! two store contracts. It keeps no session: every call that touches content
//! re-proves the PIN and unwraps the master key afresh, and the key is
//! dropped (and zeroed) before the call returns. Records live under the
//! account that stored them; no call reaches another account's records.

use std::sync::Arc;

use pinvault_config::PinvaultConfig;
use pinvault_core::{
    ContentStore, CredentialRecord, CredentialStore, PinvaultError, RecordId, UserId,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::keys::MasterKey;
use crate::manager::MasterKeyManager;
use crate::pin::{PinHasher, PinVerifier};

/// PIN-gated access to one credential store and one content store.
pub struct SecretVault {
    manager: MasterKeyManager,
    hasher: PinHasher,
    credentials: Arc<dyn CredentialStore>,
    content: Arc<dyn ContentStore>,
}

impl std::fmt::Debug for SecretVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretVault")
            .field("manager", &self.manager)
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl SecretVault {
    pub fn new(
        config: &PinvaultConfig,
        credentials: Arc<dyn CredentialStore>,
        content: Arc<dyn ContentStore>,
    ) -> Result<Self, PinvaultError> {
        Ok(Self {
            manager: MasterKeyManager::new(&config.keyring),
            hasher: PinHasher::new(&config.pin)?,
            credentials,
            content,
        })
    }

    pub fn manager(&self) -> &MasterKeyManager {
        &self.manager
    }

    pub async fn account_exists(&self, user: &UserId) -> Result<bool, PinvaultError> {
        Ok(self.credentials.get_envelope(user).await?.is_some())
    }

    /// Create the account's PIN hash and master key envelope.
    pub async fn create_account(
        &self,
        user: &UserId,
        pin: &SecretString,
    ) -> Result<(), PinvaultError> {
        self.hasher.validate(pin.expose_secret())?;

        let verifier = self.hasher.hash(pin)?;
        let (envelope, _master_key) = self.manager.initialize(&verifier)?;
        let record = CredentialRecord {
            pin_hash: verifier.expose_secret().to_string(),
            envelope,
        };

        match self.credentials.put_envelope(user, &record, None).await {
            Ok(_) => {
                info!(user = %user, "account created");
                Ok(())
            }
            Err(PinvaultError::VersionConflict { .. }) => {
                Err(PinvaultError::AccountExists(user.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Succeeds only if `pin` is the account's current PIN.
    pub async fn verify_pin(&self, user: &UserId, pin: &SecretString) -> Result<(), PinvaultError> {
        self.unlock(user, pin).await.map(drop)
    }

    /// Encrypt `plaintext` under the account's master key and store it,
    /// replacing any previous value of `record_id`.
    pub async fn store_secret(
        &self,
        user: &UserId,
        pin: &SecretString,
        record_id: &RecordId,
        plaintext: &[u8],
    ) -> Result<(), PinvaultError> {
        let master_key = self.unlock(user, pin).await?;
        let record = self.manager.encrypt_content(&master_key, plaintext)?;
        drop(master_key);

        self.content.put_record(user, record_id, &record).await?;
        debug!(user = %user, record = %record_id, "record stored");
        Ok(())
    }

    pub async fn read_secret(
        &self,
        user: &UserId,
        pin: &SecretString,
        record_id: &RecordId,
    ) -> Result<Zeroizing<Vec<u8>>, PinvaultError> {
        let master_key = self.unlock(user, pin).await?;
        let record = self
            .content
            .get_record(user, record_id)
            .await?
            .ok_or_else(|| PinvaultError::RecordNotFound(record_id.to_string()))?;

        let plaintext = self.manager.decrypt_content(&master_key, &record)?;
        debug!(user = %user, record = %record_id, "record read");
        Ok(plaintext)
    }

    /// Destroy one of the account's records. Returns whether it existed.
    pub async fn delete_secret(
        &self,
        user: &UserId,
        pin: &SecretString,
        record_id: &RecordId,
    ) -> Result<bool, PinvaultError> {
        drop(self.unlock(user, pin).await?);

        let deleted = self.content.delete_record(user, record_id).await?;
        debug!(user = %user, record = %record_id, deleted, "record delete");
        Ok(deleted)
    }

    /// Replace the PIN by re-wrapping the master key.
    ///
    /// Records are not touched. A concurrent change for the same account
    /// surfaces as [`PinvaultError::VersionConflict`]; nothing is retried.
    pub async fn change_pin(
        &self,
        user: &UserId,
        old_pin: &SecretString,
        new_pin: &SecretString,
    ) -> Result<(), PinvaultError> {
        self.hasher.validate(new_pin.expose_secret())?;

        let stored = self
            .credentials
            .get_envelope(user)
            .await?
            .ok_or_else(|| PinvaultError::AccountNotFound(user.to_string()))?;
        let version = stored.version;
        let record = stored.value;

        let old_verifier = PinVerifier::new(record.pin_hash.as_str());
        let new_verifier = self.hasher.hash(new_pin)?;

        let pin_ok = self.hasher.matches(old_pin, &old_verifier);
        let rotated = self
            .manager
            .rotate(&record.envelope, &old_verifier, &new_verifier);
        let envelope = gate(user, pin_ok, rotated)?;

        let updated = CredentialRecord {
            pin_hash: new_verifier.expose_secret().to_string(),
            envelope,
        };
        let new_version = self
            .credentials
            .put_envelope(user, &updated, Some(version))
            .await?;

        info!(user = %user, version = %new_version, "PIN changed");
        Ok(())
    }

    /// Prove `pin` and unwrap the master key.
    ///
    /// Both the hash comparison and the unwrap always run, so a mismatching
    /// PIN and a failing tag take comparable time and produce the same
    /// error.
    async fn unlock(
        &self,
        user: &UserId,
        pin: &SecretString,
    ) -> Result<MasterKey, PinvaultError> {
        self.hasher.validate(pin.expose_secret())?;

        let stored = self
            .credentials
            .get_envelope(user)
            .await?
            .ok_or_else(|| PinvaultError::AccountNotFound(user.to_string()))?;

        let verifier = PinVerifier::new(stored.value.pin_hash.as_str());
        let pin_ok = self.hasher.matches(pin, &verifier);
        let unwrapped = self.manager.unwrap_key(&stored.value.envelope, &verifier);

        gate(user, pin_ok, unwrapped)
    }
}

fn gate<T>(
    user: &UserId,
    pin_ok: Result<bool, PinvaultError>,
    outcome: Result<T, PinvaultError>,
) -> Result<T, PinvaultError> {
    let pin_ok = pin_ok?;
    match outcome {
        Ok(value) if pin_ok => Ok(value),
        Ok(_) | Err(PinvaultError::WrongPin) => {
            warn!(user = %user, "PIN rejected");
            Err(PinvaultError::WrongPin)
        }
        Err(e) => Err(e),
    }
}
