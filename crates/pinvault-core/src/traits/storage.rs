// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential and content store contracts.

use async_trait::async_trait;

use crate::error::PinvaultError;
use crate::types::{CredentialRecord, EncryptedRecord, RecordId, UserId, Version, Versioned};

/// Holds each account's PIN hash and master key envelope.
///
/// Implementations must write a [`CredentialRecord`] as a single unit so a
/// half-updated envelope (new salt, old ciphertext) is never observable.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Returns the stored record and the version it was read at.
    async fn get_envelope(
        &self,
        user: &UserId,
    ) -> Result<Option<Versioned<CredentialRecord>>, PinvaultError>;

    /// Writes `record` if the stored version still equals `expected`.
    ///
    /// `expected = None` means the account must not exist yet. On mismatch
    /// nothing is written and [`PinvaultError::VersionConflict`] is returned.
    /// Returns the version assigned to the new write.
    async fn put_envelope(
        &self,
        user: &UserId,
        record: &CredentialRecord,
        expected: Option<Version>,
    ) -> Result<Version, PinvaultError>;
}

/// Holds ciphertext blobs with their per-record nonce and tag.
///
/// Records are addressed by owner and identifier. The same [`RecordId`]
/// under two owners names two independent records.
#[async_trait]
pub trait ContentStore: Send + Sync + 'static {
    async fn get_record(
        &self,
        owner: &UserId,
        id: &RecordId,
    ) -> Result<Option<EncryptedRecord>, PinvaultError>;

    /// Creates or replaces the record; ciphertext, iv and tag change together.
    async fn put_record(
        &self,
        owner: &UserId,
        id: &RecordId,
        record: &EncryptedRecord,
    ) -> Result<(), PinvaultError>;

    /// Removes the record. Returns whether anything was deleted.
    async fn delete_record(&self, owner: &UserId, id: &RecordId) -> Result<bool, PinvaultError>;
}
