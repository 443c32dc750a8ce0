// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as minimum key derivation cost and PIN length bounds.

use pinvault_core::{MAX_KDF_ITERATIONS, MIN_KDF_ITERATIONS};

use crate::diagnostic::{ConfigError, PIN_LENGTHS, suggest};
use crate::model::PinvaultConfig;

/// Smallest Argon2id memory cost accepted for the PIN hash, in KiB.
pub const MIN_PIN_HASH_MEMORY_COST: u32 = 8_192;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PinvaultConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.log.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::UnknownChoice {
            key: "log.level".to_string(),
            value: config.log.level.clone(),
            suggestion: suggest(&level, LOG_LEVELS),
            choices: LOG_LEVELS.join(", "),
            span: None,
            src: None,
        });
    }

    let keyring = &config.keyring;
    for (key, value) in [
        ("keyring.kdf_iterations", keyring.kdf_iterations),
        ("keyring.min_kdf_iterations", keyring.min_kdf_iterations),
    ] {
        if !(MIN_KDF_ITERATIONS..=MAX_KDF_ITERATIONS).contains(&value) {
            errors.push(ConfigError::KdfCost {
                key: key.to_string(),
                value,
                minimum: MIN_KDF_ITERATIONS,
                maximum: MAX_KDF_ITERATIONS,
            });
        }
    }
    if keyring.min_kdf_iterations > keyring.kdf_iterations {
        errors.push(ConfigError::KdfFloorAboveCost {
            floor: keyring.min_kdf_iterations,
            cost: keyring.kdf_iterations,
        });
    }

    if !(PIN_LENGTHS.0..=PIN_LENGTHS.1).contains(&config.pin.length) {
        errors.push(ConfigError::PinLength {
            value: config.pin.length,
        });
    }

    for (key, value, minimum) in [
        (
            "pin.hash_memory_cost",
            config.pin.hash_memory_cost,
            MIN_PIN_HASH_MEMORY_COST,
        ),
        ("pin.hash_iterations", config.pin.hash_iterations, 1),
        ("pin.hash_parallelism", config.pin.hash_parallelism, 1),
    ] {
        if value < minimum {
            errors.push(ConfigError::PinHashCost {
                key: key.to_string(),
                value,
                minimum,
            });
        }
    }

    if config.storage.data_dir.trim().is_empty() {
        errors.push(ConfigError::EmptyDataDir);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
