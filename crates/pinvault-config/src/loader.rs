// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./pinvault.toml` > `~/.config/pinvault/pinvault.toml` > `/etc/pinvault/pinvault.toml`
//! with environment variable overrides via `PINVAULT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PinvaultConfig;

/// Environment variables that are read by the binary directly and must not
/// be merged into the config tree.
const NON_CONFIG_ENV_VARS: &[&str] = &["pin", "new_pin"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/pinvault/pinvault.toml` (system-wide)
/// 3. `~/.config/pinvault/pinvault.toml` (user XDG config)
/// 4. `./pinvault.toml` (local directory)
/// 5. `PINVAULT_*` environment variables
pub fn load_config() -> Result<PinvaultConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PinvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PinvaultConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PinvaultConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PinvaultConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    search_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(PinvaultConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Config files in merge order, lowest precedence first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/pinvault/pinvault.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("pinvault/pinvault.toml"));
    }
    paths.push(PathBuf::from("pinvault.toml"));
    paths
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `PINVAULT_KEYRING_KDF_ITERATIONS` must map to
/// `keyring.kdf_iterations`, not `keyring.kdf.iterations`.
fn env_provider() -> Env {
    Env::prefixed("PINVAULT_")
        .filter(|key| {
            !NON_CONFIG_ENV_VARS
                .iter()
                .any(|reserved| key.as_str().eq_ignore_ascii_case(reserved))
        })
        .map(|key| {
            // Example: PINVAULT_PIN_HASH_MEMORY_COST -> "pin_hash_memory_cost"
            let key_str = key.as_str().to_ascii_lowercase();
            let mapped = key_str
                .replacen("log_", "log.", 1)
                .replacen("keyring_", "keyring.", 1)
                .replacen("pin_", "pin.", 1)
                .replacen("storage_", "storage.", 1);
            mapped.into()
        })
}
