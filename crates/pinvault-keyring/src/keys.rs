// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory master key handle.

use pinvault_core::PinvaultError;
use pinvault_core::types::KEY_LEN;
use zeroize::Zeroizing;

use crate::codec;

/// The unwrapped 256-bit master key.
///
/// Exists only for the duration of one operation and is zeroed on drop.
/// Debug output omits the key bytes and the type has no equality so keys
/// are never compared outside of tests.
pub struct MasterKey(Zeroizing<[u8; KEY_LEN]>);

impl MasterKey {
    /// Draw a fresh key from the operating system CSPRNG.
    pub fn generate() -> Result<Self, PinvaultError> {
        Ok(Self(codec::generate_random_key()?))
    }

    /// Take ownership of raw key bytes, checking the length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PinvaultError> {
        if bytes.len() != KEY_LEN {
            return Err(PinvaultError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: bytes.len(),
            });
        }
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}
