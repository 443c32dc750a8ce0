// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PBKDF2 key derivation from a PIN verifier.
//!
//! The input is the stored PIN hash, never the raw digits, so the wrapping
//! key is bound to the same secret that gates PIN authentication. Hashing
//! adds no entropy to a 4-digit PIN; the PIN is a convenience control and
//! brute-force resistance comes from rate limiting in the calling layer.

use std::num::NonZeroU32;

use pinvault_core::types::{KEY_LEN, PIN_SALT_LEN};
use pinvault_core::{KdfDigest, KdfParams, PinvaultError};
use ring::pbkdf2;
use zeroize::Zeroizing;

use crate::codec::fill_random;

fn algorithm(digest: KdfDigest) -> pbkdf2::Algorithm {
    match digest {
        KdfDigest::Sha256 => pbkdf2::PBKDF2_HMAC_SHA256,
        KdfDigest::Sha384 => pbkdf2::PBKDF2_HMAC_SHA384,
        KdfDigest::Sha512 => pbkdf2::PBKDF2_HMAC_SHA512,
    }
}

/// Derive `output_len` bytes from `verifier` and `salt`.
///
/// Deterministic in all inputs. Fails with
/// [`PinvaultError::InvalidParameters`] on an empty salt, zero iterations, or
/// a zero output length.
pub fn derive(
    verifier: &[u8],
    salt: &[u8],
    iterations: u32,
    output_len: usize,
    digest: KdfDigest,
) -> Result<Zeroizing<Vec<u8>>, PinvaultError> {
    if salt.is_empty() {
        return Err(PinvaultError::InvalidParameters(
            "salt must not be empty".to_string(),
        ));
    }
    let iterations = NonZeroU32::new(iterations).ok_or_else(|| {
        PinvaultError::InvalidParameters("iteration count must be non-zero".to_string())
    })?;
    if output_len == 0 {
        return Err(PinvaultError::InvalidParameters(
            "output length must be non-zero".to_string(),
        ));
    }

    let mut output = Zeroizing::new(vec![0u8; output_len]);
    pbkdf2::derive(algorithm(digest), iterations, salt, verifier, &mut output);
    Ok(output)
}

/// Derive a 32-byte wrapping key.
///
/// The returned key is wrapped in [`Zeroizing`] for automatic memory zeroing
/// on drop.
pub fn derive_key(
    verifier: &[u8],
    salt: &[u8],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, PinvaultError> {
    let derived = derive(verifier, salt, params.iterations, KEY_LEN, params.digest)?;
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&derived);
    Ok(key)
}

/// Generate a random 32-byte salt for wrapping-key derivation.
pub fn generate_salt() -> Result<[u8; PIN_SALT_LEN], PinvaultError> {
    let mut salt = [0u8; PIN_SALT_LEN];
    fill_random(&mut salt)?;
    Ok(salt)
}
