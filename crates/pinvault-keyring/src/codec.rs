// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Envelope codec: AEAD seal/open shared by master key wrapping and content
//! encryption.
//!
//! Every call to [`EnvelopeCodec::seal`] draws a fresh random 128-bit nonce
//! from the system CSPRNG; callers can neither supply nor reuse one. Nonce
//! reuse under one key would be catastrophic for GCM security.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce, Tag};
use pinvault_core::types::{IV_LEN, KEY_LEN, TAG_LEN};
use pinvault_core::{AeadAlgorithm, EncryptedRecord, PinvaultError};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

/// AES-256-GCM with a 128-bit nonce (J0 derived through GHASH) and 128-bit tag.
type Aes256Gcm128 = AesGcm<Aes256, U16>;

/// Fill `buf` from the operating system CSPRNG.
///
/// There is no fallback source: a failure here aborts the operation.
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<(), PinvaultError> {
    SystemRandom::new()
        .fill(buf)
        .map_err(|_| PinvaultError::EntropyUnavailable)
}

/// Generic AEAD primitive bound to one algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvelopeCodec {
    algorithm: AeadAlgorithm,
}

impl EnvelopeCodec {
    pub fn new(algorithm: AeadAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> AeadAlgorithm {
        self.algorithm
    }

    /// Encrypt `plaintext` under a 32-byte key with a fresh random nonce.
    ///
    /// Total for any plaintext, including the empty one. Fails only on a key
    /// of the wrong length or an unavailable random source.
    pub fn seal(&self, plaintext: &[u8], key: &[u8]) -> Result<EncryptedRecord, PinvaultError> {
        match self.algorithm {
            AeadAlgorithm::Aes256Gcm => {
                let cipher = aes_256_gcm(key)?;

                let mut iv = [0u8; IV_LEN];
                fill_random(&mut iv)?;

                let mut buffer = plaintext.to_vec();
                let tag = cipher
                    .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), b"", &mut buffer)
                    .map_err(|_| PinvaultError::Internal("AES-256-GCM encryption failed".into()))?;

                let mut auth_tag = [0u8; TAG_LEN];
                auth_tag.copy_from_slice(tag.as_slice());

                Ok(EncryptedRecord {
                    ciphertext: buffer,
                    iv,
                    auth_tag,
                })
            }
        }
    }

    /// Decrypt and authenticate.
    ///
    /// Any tag mismatch, whether from tampering or from the wrong key, yields
    /// [`PinvaultError::AuthenticationFailed`] and no plaintext.
    pub fn open(
        &self,
        ciphertext: &[u8],
        iv: &[u8; IV_LEN],
        auth_tag: &[u8; TAG_LEN],
        key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, PinvaultError> {
        match self.algorithm {
            AeadAlgorithm::Aes256Gcm => {
                let cipher = aes_256_gcm(key)?;

                let mut buffer = Zeroizing::new(ciphertext.to_vec());
                cipher
                    .decrypt_in_place_detached(
                        Nonce::<U16>::from_slice(iv),
                        b"",
                        buffer.as_mut_slice(),
                        Tag::<U16>::from_slice(auth_tag),
                    )
                    .map_err(|_| PinvaultError::AuthenticationFailed)?;

                Ok(buffer)
            }
        }
    }

    /// [`open`](Self::open) over the fields of a stored record.
    pub fn open_record(
        &self,
        record: &EncryptedRecord,
        key: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, PinvaultError> {
        self.open(&record.ciphertext, &record.iv, &record.auth_tag, key)
    }
}

fn aes_256_gcm(key: &[u8]) -> Result<Aes256Gcm128, PinvaultError> {
    if key.len() != KEY_LEN {
        return Err(PinvaultError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        });
    }
    Aes256Gcm128::new_from_slice(key).map_err(|_| PinvaultError::InvalidKeyLength {
        expected: KEY_LEN,
        actual: key.len(),
    })
}

/// Generate a random 32-byte key suitable for AES-256-GCM.
pub fn generate_random_key() -> Result<Zeroizing<[u8; KEY_LEN]>, PinvaultError> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    fill_random(&mut key[..])?;
    Ok(key)
}
