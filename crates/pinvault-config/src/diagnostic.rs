// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config diagnostics rendered through miette.
//!
//! Parse failures from figment and semantic failures from
//! [`validation`](crate::validation) both end up as [`ConfigError`]. Each
//! variant knows how to explain itself for the vault: which digests exist,
//! what PBKDF2 cost is acceptable, how long a PIN may be.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score above which a near miss is offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown key `{key}` in {section}")]
    #[diagnostic(
        code(pinvault::config::unknown_key),
        help("{}", did_you_mean(suggestion.as_deref(), "keys", valid_keys))
    )]
    UnknownKey {
        key: String,
        /// `[keyring]`, `[pin]`, ... or `the top level`.
        section: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("not a {section} setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A string setting naming an algorithm, digest or level that does not exist.
    #[error("`{value}` is not a valid value for `{key}`")]
    #[diagnostic(
        code(pinvault::config::unknown_choice),
        help("{}", did_you_mean(suggestion.as_deref(), "values", choices))
    )]
    UnknownChoice {
        key: String,
        value: String,
        suggestion: Option<String>,
        choices: String,
        #[label("unsupported")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(pinvault::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` = {value} is outside {minimum}..={maximum}")]
    #[diagnostic(
        code(pinvault::config::kdf_cost),
        help(
            "PBKDF2 iterations below {minimum} make PIN guessing cheap; above {maximum} every unlock stalls. \
             A new cost applies to an envelope on its next PIN change."
        )
    )]
    KdfCost {
        key: String,
        value: u32,
        minimum: u32,
        maximum: u32,
    },

    #[error("keyring.min_kdf_iterations ({floor}) is above keyring.kdf_iterations ({cost})")]
    #[diagnostic(
        code(pinvault::config::kdf_floor),
        help("envelopes written at {cost} iterations could not be reopened; lower the floor or raise the cost")
    )]
    KdfFloorAboveCost { floor: u32, cost: u32 },

    #[error("pin.length = {value} is not supported")]
    #[diagnostic(
        code(pinvault::config::pin_length),
        help("PINs are {} to {} decimal digits", PIN_LENGTHS.0, PIN_LENGTHS.1)
    )]
    PinLength { value: usize },

    #[error("`{key}` = {value} is too weak for the PIN hash")]
    #[diagnostic(
        code(pinvault::config::pin_hash_cost),
        help("Argon2id needs `{key}` of at least {minimum}; a short PIN relies entirely on this cost")
    )]
    PinHashCost { key: String, value: u32, minimum: u32 },

    #[error("storage.data_dir is empty")]
    #[diagnostic(
        code(pinvault::config::data_dir),
        help("point it at a directory the vault may create credentials/ and records/ in")
    )]
    EmptyDataDir,

    #[error("configuration error: {0}")]
    #[diagnostic(code(pinvault::config::other))]
    Other(String),
}

/// Inclusive bounds on `pin.length`.
pub const PIN_LENGTHS: (usize, usize) = (4, 12);

fn did_you_mean(suggestion: Option<&str>, noun: &str, valid: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid {noun}: {valid}"),
        None => format!("valid {noun}: {valid}"),
    }
}

/// Best match for `input` among `candidates`, if any is close enough.
pub fn suggest(input: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|c| (strsim::jaro_winkler(input, c), *c))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.to_string())
}

/// Convert every error inside a `figment::Error` into a diagnostic.
///
/// `toml_sources` holds `(path, content)` pairs used to point at the
/// offending line.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    err.into_iter()
        .map(|error| {
            let path: Vec<String> = error.path.iter().map(ToString::to_string).collect();
            match &error.kind {
                // Path is the enclosing section; the field is the unknown key.
                Kind::UnknownField(field, expected) => {
                    let (span, src) = locate(&error, toml_sources, &path, field);
                    ConfigError::UnknownKey {
                        key: field.clone(),
                        section: section_name(&path),
                        suggestion: suggest(field, expected),
                        valid_keys: expected.join(", "),
                        span,
                        src,
                    }
                }
                // Path ends with the key holding the bad value.
                Kind::UnknownVariant(value, expected) => {
                    let (span, src) = locate_leaf(&error, toml_sources, &path);
                    ConfigError::UnknownChoice {
                        key: path.join("."),
                        value: value.clone(),
                        suggestion: suggest(value, expected),
                        choices: expected.join(", "),
                        span,
                        src,
                    }
                }
                Kind::InvalidType(actual, expected) => {
                    let (span, src) = locate_leaf(&error, toml_sources, &path);
                    ConfigError::InvalidType {
                        key: path.join("."),
                        detail: format!("found {actual}"),
                        expected: expected.to_string(),
                        span,
                        src,
                    }
                }
                _ => ConfigError::Other(error.to_string()),
            }
        })
        .collect()
}

fn section_name(path: &[String]) -> String {
    if path.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{}]", path.join("."))
    }
}

fn locate_leaf(
    error: &figment::Error,
    toml_sources: &[(String, String)],
    path: &[String],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    match path.split_last() {
        Some((key, section)) => locate(error, toml_sources, section, key),
        None => (None, None),
    }
}

/// Span of `key` inside `section` of the file the error came from.
fn locate(
    error: &figment::Error,
    toml_sources: &[(String, String)],
    section: &[String],
    key: &str,
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let Some(figment::Source::File(file)) = error.metadata.as_ref().and_then(|m| m.source.as_ref())
    else {
        return (None, None);
    };
    let file = file.display().to_string();

    toml_sources
        .iter()
        .find(|(path, _)| *path == file)
        .and_then(|(path, content)| {
            let header = (!section.is_empty()).then(|| section.join("."));
            let offset = find_key_offset(content, header.as_deref(), key)?;
            Some((
                Some(SourceSpan::new(offset.into(), key.len())),
                Some(NamedSource::new(path, content.clone())),
            ))
        })
        .unwrap_or((None, None))
}

/// Byte offset of `key = ...` inside table `section` (`None` for top level).
///
/// Tracks `[table]` headers line by line, so a key is only matched in the
/// table it belongs to even when another table uses the same name.
pub fn find_key_offset(content: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let mut table: Option<&str> = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let body = line.trim_start();
        let indent = line.len() - body.len();

        if let Some(header) = body.strip_prefix('[') {
            table = header.split(']').next().map(str::trim);
        } else if table == section {
            let is_key = body
                .strip_prefix(key)
                .is_some_and(|rest| rest.trim_start().starts_with('='));
            if is_key {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }
    None
}

/// Print every diagnostic to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
