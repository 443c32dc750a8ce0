// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Pinvault secrets vault.
//!
//! Settings come from compiled defaults, then `/etc`, XDG and local
//! `pinvault.toml` files, then `PINVAULT_*` environment variables. The
//! `load_and_validate*` entry points return either a checked
//! [`PinvaultConfig`] or every problem found, as miette diagnostics.
//!
//! ```no_run
//! let config = match pinvault_config::load_and_validate() {
//!     Ok(config) => config,
//!     Err(errors) => {
//!         pinvault_config::render_errors(&errors);
//!         std::process::exit(1);
//!     }
//! };
//! println!("new envelopes use {} PBKDF2 iterations", config.keyring.kdf_iterations);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::PinvaultConfig;

/// Load from the standard search paths plus environment, then validate.
pub fn load_and_validate() -> Result<PinvaultConfig, Vec<ConfigError>> {
    checked(loader::load_config(), || {
        loader::search_paths().iter().filter_map(|p| read_source(p)).collect()
    })
}

/// Load from one explicit file plus environment, then validate.
pub fn load_and_validate_path(path: &Path) -> Result<PinvaultConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Load from an in-memory TOML document, then validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<PinvaultConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validate a parsed config, or turn the parse failure into diagnostics.
///
/// Source files are only read back when there is an error to point into.
fn checked(
    loaded: Result<PinvaultConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<PinvaultConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => validation::validate_config(&config).map(|()| config),
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// `(absolute path, content)` for an existing config file.
///
/// Figment records file sources by absolute path, so relative paths are
/// resolved against the working directory to match.
fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    let absolute: PathBuf = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    Some((absolute.display().to_string(), content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_unknown_key_names_its_section() {
        let errors = load_and_validate_str("[pin]\nlenght = 6\n").unwrap_err();
        match &errors[..] {
            [ConfigError::UnknownKey { key, section, span, .. }] => {
                assert_eq!(key, "lenght");
                assert_eq!(section, "[pin]");
                // Inline strings carry no file source, so there is no span.
                assert!(span.is_none());
            }
            other => panic!("unexpected errors: {other:?}"),
        }
    }

    #[test]
    fn unknown_digest_lists_supported_digests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pinvault.toml");
        std::fs::write(&path, "[keyring]\nkdf_digest = \"sha-256\"\n").unwrap();

        let errors = load_and_validate_path(&path).unwrap_err();
        match &errors[..] {
            [ConfigError::UnknownChoice { key, suggestion, choices, .. }] => {
                assert!(key.ends_with("kdf_digest"), "{key}");
                assert_eq!(suggestion.as_deref(), Some("sha256"));
                assert_eq!(choices, "sha256, sha384, sha512");
            }
            other => panic!("unexpected errors: {other:?}"),
        }
    }
}
