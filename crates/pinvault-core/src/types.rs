// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted data model shared by the keyring and the store backends.
//!
//! Every byte field serializes as lowercase hex. Transcoding is lossless:
//! a record read back from any store is byte-for-byte what was written.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Symmetric key length for both the master key and wrapping keys (256 bits).
pub const KEY_LEN: usize = 32;

/// AEAD nonce length (128 bits).
pub const IV_LEN: usize = 16;

/// AEAD authentication tag length (128 bits).
pub const TAG_LEN: usize = 16;

/// Salt length for deriving the wrapping key from a PIN verifier (256 bits).
pub const PIN_SALT_LEN: usize = 32;

/// Identifier of a vault account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an encrypted record in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic version of a stored credential record, used for compare-and-swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(pub u64);

impl Version {
    /// Version assigned to the first write of a record.
    pub const INITIAL: Version = Version(1);

    /// The version that follows this one.
    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A stored value together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: Version,
    pub value: T,
}

/// AEAD algorithms the envelope codec can be bound to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AeadAlgorithm {
    /// AES-256 in Galois/Counter mode with a 128-bit nonce and 128-bit tag.
    #[default]
    #[serde(rename = "aes-256-gcm")]
    #[strum(serialize = "aes-256-gcm")]
    Aes256Gcm,
}

/// HMAC digest underlying PBKDF2.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KdfDigest {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

/// Key derivation parameters recorded alongside an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub digest: KdfDigest,
    pub iterations: u32,
}

/// Lowest PBKDF2 iteration count accepted for envelopes.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

/// Highest PBKDF2 iteration count an envelope may ask for.
pub const MAX_KDF_ITERATIONS: u32 = 10_000_000;

impl KdfParams {
    /// Parameters every envelope without a recorded `kdf` was written with.
    pub const LEGACY: KdfParams = KdfParams {
        digest: KdfDigest::Sha256,
        iterations: 100_000,
    };
}

/// The PIN-protected wrapper around a user's master key.
///
/// The four cryptographic fields are produced together by one seal operation
/// and must be persisted together. `kdf` is absent on envelopes written
/// before derivation parameters were recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterKeyEnvelope {
    #[serde(with = "hex::serde")]
    pub wrapped_key: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub wrap_iv: [u8; IV_LEN],
    #[serde(with = "hex::serde")]
    pub wrap_auth_tag: [u8; TAG_LEN],
    #[serde(with = "hex::serde")]
    pub pin_salt: [u8; PIN_SALT_LEN],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf: Option<KdfParams>,
}

/// One AEAD-sealed payload: a stored secret or, inside an envelope, a master key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecord {
    #[serde(with = "hex::serde")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub iv: [u8; IV_LEN],
    #[serde(with = "hex::serde")]
    pub auth_tag: [u8; TAG_LEN],
}

/// Everything the credential store keeps for one account.
///
/// The PIN hash is the PIN verifier the wrapping key is derived from, so it
/// is replaced in the same write as the envelope on PIN rotation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub pin_hash: String,
    pub envelope: MasterKeyEnvelope,
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("pin_hash", &"[REDACTED]")
            .field("envelope", &self.envelope)
            .finish()
    }
}
