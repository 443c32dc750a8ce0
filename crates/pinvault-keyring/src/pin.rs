// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PIN format checks and the Argon2id PIN hash.
//!
//! The PHC string produced by [`PinHasher::hash`] is stored for PIN
//! authentication and is also the input to wrapping-key derivation. Changing
//! the hash cost therefore only affects PINs hashed afterwards; existing
//! envelopes stay bound to the PHC string that was stored with them.

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use pinvault_config::model::PinConfig;
use pinvault_core::PinvaultError;
use secrecy::{ExposeSecret, SecretString};

use crate::codec::fill_random;

const HASH_SALT_LEN: usize = 16;

/// The stable hashed PIN representation fed into key derivation.
#[derive(Clone)]
pub struct PinVerifier(SecretString);

impl PinVerifier {
    pub fn new(verifier: impl Into<String>) -> Self {
        Self(SecretString::from(verifier.into()))
    }

    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for PinVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PinVerifier([REDACTED])")
    }
}

/// Check that `pin` is exactly `length` ASCII digits.
pub fn validate_pin_format(pin: &str, length: usize) -> Result<(), PinvaultError> {
    if pin.len() != length || !pin.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PinvaultError::InvalidPinFormat(format!(
            "PIN must be exactly {length} digits"
        )));
    }
    Ok(())
}

/// Argon2id hasher bound to the configured PIN rule and cost.
#[derive(Clone)]
pub struct PinHasher {
    argon2: Argon2<'static>,
    length: usize,
}

impl std::fmt::Debug for PinHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinHasher")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

impl PinHasher {
    pub fn new(config: &PinConfig) -> Result<Self, PinvaultError> {
        let params = Params::new(
            config.hash_memory_cost,
            config.hash_iterations,
            config.hash_parallelism,
            None,
        )
        .map_err(|e| PinvaultError::Config(format!("invalid Argon2id parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            length: config.length,
        })
    }

    pub fn pin_length(&self) -> usize {
        self.length
    }

    /// Format-check `pin` against the configured length.
    pub fn validate(&self, pin: &str) -> Result<(), PinvaultError> {
        validate_pin_format(pin, self.length)
    }

    /// Hash `pin` with a fresh random salt.
    pub fn hash(&self, pin: &SecretString) -> Result<PinVerifier, PinvaultError> {
        let mut salt_bytes = [0u8; HASH_SALT_LEN];
        fill_random(&mut salt_bytes)?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| PinvaultError::Internal(format!("PIN hash salt encoding failed: {e}")))?;

        let hash = self
            .argon2
            .hash_password(pin.expose_secret().as_bytes(), &salt)
            .map_err(|e| PinvaultError::Internal(format!("PIN hashing failed: {e}")))?;

        Ok(PinVerifier::new(hash.to_string()))
    }

    /// Constant-time check of `pin` against a stored PHC string.
    ///
    /// A stored hash that does not parse is [`PinvaultError::Corrupted`].
    pub fn matches(&self, pin: &SecretString, verifier: &PinVerifier) -> Result<bool, PinvaultError> {
        let parsed = PasswordHash::new(verifier.expose_secret())
            .map_err(|e| PinvaultError::Corrupted(format!("stored PIN hash is malformed: {e}")))?;

        match self
            .argon2
            .verify_password(pin.expose_secret().as_bytes(), &parsed)
        {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PinvaultError::Corrupted(format!(
                "stored PIN hash cannot be verified: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PinHasher {
        PinHasher::new(&PinConfig {
            length: 4,
            hash_memory_cost: 1024,
            hash_iterations: 1,
            hash_parallelism: 1,
        })
        .unwrap()
    }

    fn pin(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn four_digit_pin_is_accepted() {
        assert!(validate_pin_format("0000", 4).is_ok());
        assert!(validate_pin_format("9381", 4).is_ok());
    }

    #[test]
    fn malformed_pins_are_rejected() {
        for bad in ["", "123", "12345", "12a4", " 123", "１２３４", "12.4"] {
            assert!(
                matches!(
                    validate_pin_format(bad, 4),
                    Err(PinvaultError::InvalidPinFormat(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn hash_is_argon2id_phc_string() {
        let verifier = hasher().hash(&pin("1234")).unwrap();
        assert!(verifier.expose_secret().starts_with("$argon2id$v=19$"));
        assert!(!verifier.expose_secret().contains("1234$"));
    }

    #[test]
    fn hashing_twice_gives_different_verifiers() {
        let a = hasher().hash(&pin("1234")).unwrap();
        let b = hasher().hash(&pin("1234")).unwrap();
        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn matches_accepts_right_pin_and_rejects_wrong_one() {
        let hasher = hasher();
        let verifier = hasher.hash(&pin("1234")).unwrap();

        assert!(hasher.matches(&pin("1234"), &verifier).unwrap());
        assert!(!hasher.matches(&pin("1235"), &verifier).unwrap());
    }

    #[test]
    fn matches_uses_cost_stored_in_hash() {
        let cheap = hasher();
        let verifier = cheap.hash(&pin("4321")).unwrap();

        let costlier = PinHasher::new(&PinConfig {
            length: 4,
            hash_memory_cost: 2048,
            hash_iterations: 2,
            hash_parallelism: 1,
        })
        .unwrap();
        assert!(costlier.matches(&pin("4321"), &verifier).unwrap());
    }

    #[test]
    fn malformed_stored_hash_is_corrupted() {
        let result = hasher().matches(&pin("1234"), &PinVerifier::new("not-a-phc-string"));
        assert!(matches!(result, Err(PinvaultError::Corrupted(_))));
    }

    #[test]
    fn invalid_argon2_params_are_config_errors() {
        let result = PinHasher::new(&PinConfig {
            length: 4,
            hash_memory_cost: 1,
            hash_iterations: 1,
            hash_parallelism: 1,
        });
        assert!(matches!(result, Err(PinvaultError::Config(_))));
    }

    #[test]
    fn debug_output_is_redacted() {
        let verifier = PinVerifier::new("h(1234)");
        assert!(!format!("{verifier:?}").contains("1234"));
    }
}
