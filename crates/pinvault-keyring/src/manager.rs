// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master key manager: envelope creation, unwrap, PIN rotation and content
//! encryption.
//!
//! The key-wrapping pattern:
//! - A random master key encrypts every stored record.
//! - The master key itself is sealed under a wrapping key derived with
//!   PBKDF2 from the PIN verifier and a per-envelope salt.
//! - Changing the PIN only re-wraps the master key; records are never
//!   re-encrypted.
//!
//! Nothing here is cached between calls. Every unwrap re-derives the
//! wrapping key from the supplied verifier.

use pinvault_config::model::KeyringConfig;
use pinvault_core::types::KEY_LEN;
use pinvault_core::{
    EncryptedRecord, KdfParams, MAX_KDF_ITERATIONS, MasterKeyEnvelope, PinvaultError,
};
use tracing::debug;
use zeroize::Zeroizing;

use crate::codec::EnvelopeCodec;
use crate::kdf;
use crate::keys::MasterKey;
use crate::pin::PinVerifier;

/// Stateless envelope operations bound to one algorithm configuration.
#[derive(Debug, Clone)]
pub struct MasterKeyManager {
    codec: EnvelopeCodec,
    kdf: KdfParams,
    min_iterations: u32,
}

impl MasterKeyManager {
    pub fn new(config: &KeyringConfig) -> Self {
        Self {
            codec: EnvelopeCodec::new(config.algorithm),
            kdf: KdfParams {
                digest: config.kdf_digest,
                iterations: config.kdf_iterations,
            },
            min_iterations: config.min_kdf_iterations,
        }
    }

    /// Parameters recorded in newly written envelopes.
    pub fn kdf_params(&self) -> KdfParams {
        self.kdf
    }

    pub fn codec(&self) -> EnvelopeCodec {
        self.codec
    }

    /// Generate a master key and seal it under `verifier`.
    ///
    /// Returns the envelope together with the key it protects so account
    /// creation can encrypt a first record without a second unwrap.
    pub fn initialize(
        &self,
        verifier: &PinVerifier,
    ) -> Result<(MasterKeyEnvelope, MasterKey), PinvaultError> {
        let master_key = MasterKey::generate()?;
        let envelope = self.wrap(&master_key, verifier)?;
        debug!(iterations = self.kdf.iterations, "master key envelope created");
        Ok((envelope, master_key))
    }

    /// Recover the master key from `envelope`.
    ///
    /// Any tag failure is reported as [`PinvaultError::WrongPin`]. Recorded
    /// derivation parameters outside the accepted range are
    /// [`PinvaultError::Corrupted`] and nothing is derived.
    pub fn unwrap_key(
        &self,
        envelope: &MasterKeyEnvelope,
        verifier: &PinVerifier,
    ) -> Result<MasterKey, PinvaultError> {
        let params = self.recorded_params(envelope)?;
        let wrapping_key = derive_wrapping_key(verifier, &envelope.pin_salt, &params)?;

        let key_bytes = self
            .codec
            .open(
                &envelope.wrapped_key,
                &envelope.wrap_iv,
                &envelope.wrap_auth_tag,
                &wrapping_key[..],
            )
            .map_err(|e| match e {
                PinvaultError::AuthenticationFailed => PinvaultError::WrongPin,
                other => other,
            })?;

        if key_bytes.len() != KEY_LEN {
            return Err(PinvaultError::Corrupted(format!(
                "unwrapped master key has {} bytes, expected {KEY_LEN}",
                key_bytes.len()
            )));
        }
        MasterKey::from_bytes(&key_bytes)
    }

    /// Re-wrap the master key under `new` with a fresh salt and iv.
    ///
    /// The input envelope is never modified; on failure the caller still
    /// holds the old one unchanged.
    pub fn rotate(
        &self,
        envelope: &MasterKeyEnvelope,
        old: &PinVerifier,
        new: &PinVerifier,
    ) -> Result<MasterKeyEnvelope, PinvaultError> {
        let master_key = self.unwrap_key(envelope, old)?;
        let rotated = self.wrap(&master_key, new)?;
        debug!(
            from_iterations = ?envelope.kdf.map(|p| p.iterations),
            to_iterations = self.kdf.iterations,
            "master key re-wrapped"
        );
        Ok(rotated)
    }

    pub fn encrypt_content(
        &self,
        master_key: &MasterKey,
        plaintext: &[u8],
    ) -> Result<EncryptedRecord, PinvaultError> {
        self.codec.seal(plaintext, master_key.as_bytes())
    }

    pub fn decrypt_content(
        &self,
        master_key: &MasterKey,
        record: &EncryptedRecord,
    ) -> Result<Zeroizing<Vec<u8>>, PinvaultError> {
        self.codec.open_record(record, master_key.as_bytes())
    }

    /// Derivation parameters `envelope` was sealed with.
    ///
    /// Envelopes without a `kdf` field predate recorded parameters and were
    /// all written with [`KdfParams::LEGACY`].
    fn recorded_params(&self, envelope: &MasterKeyEnvelope) -> Result<KdfParams, PinvaultError> {
        let params = envelope.kdf.unwrap_or(KdfParams::LEGACY);
        let floor = self.min_iterations;
        if !(floor..=MAX_KDF_ITERATIONS).contains(&params.iterations) {
            return Err(PinvaultError::Corrupted(format!(
                "envelope records {} PBKDF2 iterations, accepted range is {floor}..={MAX_KDF_ITERATIONS}",
                params.iterations
            )));
        }
        Ok(params)
    }

    fn wrap(
        &self,
        master_key: &MasterKey,
        verifier: &PinVerifier,
    ) -> Result<MasterKeyEnvelope, PinvaultError> {
        let pin_salt = kdf::generate_salt()?;
        let wrapping_key = derive_wrapping_key(verifier, &pin_salt, &self.kdf)?;
        let sealed = self.codec.seal(master_key.as_bytes(), &wrapping_key[..])?;

        Ok(MasterKeyEnvelope {
            wrapped_key: sealed.ciphertext,
            wrap_iv: sealed.iv,
            wrap_auth_tag: sealed.auth_tag,
            pin_salt,
            kdf: Some(self.kdf),
        })
    }
}

/// The PBKDF2 salt input is the lowercase hex text of `pin_salt`, which is
/// how existing envelopes were derived.
fn derive_wrapping_key(
    verifier: &PinVerifier,
    pin_salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, PinvaultError> {
    let salt_text = Zeroizing::new(hex::encode(pin_salt));
    kdf::derive_key(
        verifier.expose_secret().as_bytes(),
        salt_text.as_bytes(),
        params,
    )
}
