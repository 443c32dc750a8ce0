// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Pinvault secrets vault.
//!
//! No variant ever carries plaintext, key bytes, PINs, or PIN verifiers.
//! Messages for PIN and authentication failures are constant so that callers
//! cannot learn which internal check rejected the request.

use thiserror::Error;

/// The primary error type used across all Pinvault crates.
#[derive(Debug, Error)]
pub enum PinvaultError {
    /// Configuration errors (invalid TOML, unknown algorithm, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed key derivation inputs (empty salt, zero iterations, zero output length).
    #[error("invalid key derivation parameters: {0}")]
    InvalidParameters(String),

    /// A symmetric key of the wrong size was handed to the envelope codec.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// The AEAD tag did not verify. Covers both tampering and a wrong key.
    #[error("authentication failed: wrong key or corrupted data")]
    AuthenticationFailed,

    /// The supplied PIN did not unlock the master key.
    #[error("invalid PIN")]
    WrongPin,

    /// The PIN does not satisfy the configured format rule.
    #[error("invalid PIN format: {0}")]
    InvalidPinFormat(String),

    /// The operating system random source failed.
    #[error("system randomness source unavailable")]
    EntropyUnavailable,

    /// The stored envelope changed since it was read.
    #[error("envelope version conflict for user {user}")]
    VersionConflict { user: String },

    /// An account with this identifier already has an envelope.
    #[error("account already exists: {0}")]
    AccountExists(String),

    /// No envelope is stored for this account.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// An account or record identifier the store cannot address.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// No encrypted record is stored under this identifier.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Stored data failed structural decoding (bad hex, wrong field lengths).
    #[error("corrupted data: {0}")]
    Corrupted(String),

    /// Storage backend errors (I/O, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PinvaultError {
    /// Whether the caller's request must be aborted rather than retried or
    /// answered with an authorization failure.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PinvaultError::Config(_)
                | PinvaultError::InvalidParameters(_)
                | PinvaultError::InvalidKeyLength { .. }
                | PinvaultError::EntropyUnavailable
                | PinvaultError::Corrupted(_)
                | PinvaultError::Internal(_)
        )
    }

    /// Wrap any error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PinvaultError::Storage {
            source: Box::new(source),
        }
    }
}
