// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Pinvault secrets vault.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use pinvault_core::{AeadAlgorithm, KdfDigest};
use serde::{Deserialize, Serialize};

/// Top-level Pinvault configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PinvaultConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Master key envelope settings.
    #[serde(default)]
    pub keyring: KeyringConfig,

    /// PIN format and hashing settings.
    #[serde(default)]
    pub pin: PinConfig,

    /// File store settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Algorithms and derivation cost for the master key envelope.
///
/// These values are bound into the master key manager at construction; the
/// keyring never reads them from the environment on its own.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeyringConfig {
    /// AEAD used for both envelope wrapping and content encryption.
    #[serde(default)]
    pub algorithm: AeadAlgorithm,

    /// HMAC digest underlying PBKDF2.
    #[serde(default)]
    pub kdf_digest: KdfDigest,

    /// PBKDF2 iteration count for newly written envelopes (default: 100000).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Lowest iteration count a stored envelope may record and still be
    /// opened (default: 100000). Lower counts are treated as corruption.
    #[serde(default = "default_kdf_iterations")]
    pub min_kdf_iterations: u32,
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            algorithm: AeadAlgorithm::default(),
            kdf_digest: KdfDigest::default(),
            kdf_iterations: default_kdf_iterations(),
            min_kdf_iterations: default_kdf_iterations(),
        }
    }
}

fn default_kdf_iterations() -> u32 {
    100_000
}

/// PIN format rule and Argon2id cost for the PIN hash.
///
/// The PIN hash doubles as the PIN verifier fed into the wrapping-key
/// derivation, so changing these costs only affects newly hashed PINs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PinConfig {
    /// Exact number of decimal digits a PIN must have (default: 4).
    #[serde(default = "default_pin_length")]
    pub length: usize,

    /// Argon2id memory cost in KiB (default: 19456 = 19 MiB).
    #[serde(default = "default_hash_memory_cost")]
    pub hash_memory_cost: u32,

    /// Argon2id iteration count (default: 2).
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,

    /// Argon2id parallelism lanes (default: 1).
    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            length: default_pin_length(),
            hash_memory_cost: default_hash_memory_cost(),
            hash_iterations: default_hash_iterations(),
            hash_parallelism: default_hash_parallelism(),
        }
    }
}

fn default_pin_length() -> usize {
    4
}

fn default_hash_memory_cost() -> u32 {
    19_456 // OWASP minimum for Argon2id
}

fn default_hash_iterations() -> u32 {
    2
}

fn default_hash_parallelism() -> u32 {
    1
}

/// File store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding the credential and record files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|d| d.join("pinvault").display().to_string())
        .unwrap_or_else(|| "pinvault-data".to_string())
}
