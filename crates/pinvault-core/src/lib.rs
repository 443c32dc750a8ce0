// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Pinvault secrets vault.
//!
//! This crate provides the persisted data model, the shared error type, and
//! the store contracts that the keyring crate calls into. It contains no
//! cryptography of its own.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PinvaultError;
pub use traits::{ContentStore, CredentialStore};
pub use types::{
    AeadAlgorithm, CredentialRecord, EncryptedRecord, KdfDigest, KdfParams, MAX_KDF_ITERATIONS,
    MIN_KDF_ITERATIONS, MasterKeyEnvelope, RecordId, UserId, Version, Versioned,
};
