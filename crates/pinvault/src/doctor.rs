// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pinvault doctor` command implementation.
//!
//! Runs self-tests against the configured cryptography and storage so a
//! broken random source, a mis-set iteration count or an unwritable data
//! directory shows up before any account is touched.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use pinvault_config::PinvaultConfig;
use pinvault_core::PinvaultError;
use pinvault_keyring::{EnvelopeCodec, MasterKeyManager, PinVerifier, generate_random_key, kdf};

/// Derivations slower than this make every PIN entry sluggish.
const SLOW_KDF: Duration = Duration::from_secs(2);

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `pinvault doctor` command.
///
/// With `--plain`, disables colored output.
pub async fn run_doctor(
    config: &PinvaultConfig,
    config_path: Option<&Path>,
    plain: bool,
) -> Result<(), PinvaultError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_config(config_path).await,
        check_entropy().await,
        check_kdf_timing(config).await,
        check_codec().await,
        check_envelope(config).await,
        check_data_dir(&config.storage.data_dir).await,
    ];

    println!();
    println!("  pinvault doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;

    for result in &results {
        match result.status {
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Fail => fail_count += 1,
            CheckStatus::Pass => {}
        }
        println!("{}", render_line(result, use_color));
    }

    println!();

    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }

    println!();

    if fail_count > 0 {
        return Err(PinvaultError::Internal(format!(
            "{fail_count} doctor check(s) failed"
        )));
    }
    Ok(())
}

fn render_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();

    if !use_color {
        let label = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        return format!(
            "    {label} {:<20} {} ({duration_ms}ms)",
            result.name, result.message
        );
    }

    use colored::Colorize;
    let (symbol, message) = match result.status {
        CheckStatus::Pass => ("✓".green(), result.message.normal()),
        CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
        CheckStatus::Fail => ("✗".red(), result.message.red()),
    };
    format!(
        "    {symbol} {:<20} {message} ({duration_ms}ms)",
        result.name
    )
}

/// Check configuration loads without errors.
async fn check_config(path: Option<&Path>) -> CheckResult {
    let start = Instant::now();
    let loaded = match path {
        Some(path) => pinvault_config::load_and_validate_path(path),
        None => pinvault_config::load_and_validate(),
    };
    match loaded {
        Ok(_) => CheckResult::new("Configuration", CheckStatus::Pass, "valid", start),
        Err(errors) => CheckResult::new(
            "Configuration",
            CheckStatus::Fail,
            format!("{} error(s)", errors.len()),
            start,
        ),
    }
}

/// The OS random source answers and does not repeat itself.
async fn check_entropy() -> CheckResult {
    let start = Instant::now();
    match (generate_random_key(), generate_random_key()) {
        (Ok(a), Ok(b)) if *a != *b => {
            CheckResult::new("Entropy source", CheckStatus::Pass, "available", start)
        }
        (Ok(_), Ok(_)) => CheckResult::new(
            "Entropy source",
            CheckStatus::Fail,
            "returned identical keys",
            start,
        ),
        (Err(e), _) | (_, Err(e)) => {
            CheckResult::new("Entropy source", CheckStatus::Fail, e.to_string(), start)
        }
    }
}

/// One wrapping-key derivation at the configured cost.
async fn check_kdf_timing(config: &PinvaultConfig) -> CheckResult {
    let start = Instant::now();
    let params = MasterKeyManager::new(&config.keyring).kdf_params();

    match kdf::derive_key(b"pinvault-doctor", b"pinvault-doctor-salt", &params) {
        Ok(_) => {
            let elapsed = start.elapsed();
            let message = format!(
                "{} x PBKDF2-HMAC-{} in {}ms",
                params.iterations,
                params.digest.to_string().to_uppercase(),
                elapsed.as_millis()
            );
            let status = if elapsed > SLOW_KDF {
                CheckStatus::Warn
            } else {
                CheckStatus::Pass
            };
            CheckResult::new("KDF timing", status, message, start)
        }
        Err(e) => CheckResult::new("KDF timing", CheckStatus::Fail, e.to_string(), start),
    }
}

/// Seal/open round trip plus rejection of a flipped tag bit.
async fn check_codec() -> CheckResult {
    let start = Instant::now();
    match codec_self_test() {
        Ok(()) => CheckResult::new(
            "Codec self-test",
            CheckStatus::Pass,
            "round trip and tamper rejection ok",
            start,
        ),
        Err(e) => CheckResult::new("Codec self-test", CheckStatus::Fail, e.to_string(), start),
    }
}

fn codec_self_test() -> Result<(), PinvaultError> {
    let codec = EnvelopeCodec::default();
    let key = generate_random_key()?;

    let mut sealed = codec.seal(b"pinvault doctor", &key[..])?;
    if codec.open_record(&sealed, &key[..])?.as_slice() != b"pinvault doctor" {
        return Err(PinvaultError::Internal("round trip mismatch".to_string()));
    }

    sealed.auth_tag[0] ^= 0x01;
    match codec.open_record(&sealed, &key[..]) {
        Err(PinvaultError::AuthenticationFailed) => Ok(()),
        Ok(_) => Err(PinvaultError::Internal(
            "tampered ciphertext was accepted".to_string(),
        )),
        Err(e) => Err(e),
    }
}

/// Initialize, unwrap and rotate a throwaway envelope at the configured cost.
async fn check_envelope(config: &PinvaultConfig) -> CheckResult {
    let start = Instant::now();
    match envelope_self_test(config) {
        Ok(()) => CheckResult::new(
            "Envelope self-test",
            CheckStatus::Pass,
            "initialize, unwrap and rotate ok",
            start,
        ),
        Err(e) => CheckResult::new(
            "Envelope self-test",
            CheckStatus::Fail,
            e.to_string(),
            start,
        ),
    }
}

fn envelope_self_test(config: &PinvaultConfig) -> Result<(), PinvaultError> {
    let manager = MasterKeyManager::new(&config.keyring);
    let first = PinVerifier::new("doctor-first");
    let second = PinVerifier::new("doctor-second");

    let (envelope, key) = manager.initialize(&first)?;
    let record = manager.encrypt_content(&key, b"pinvault doctor")?;
    drop(key);

    let rotated = manager.rotate(&envelope, &first, &second)?;
    let key = manager.unwrap_key(&rotated, &second)?;
    if manager.decrypt_content(&key, &record)?.as_slice() != b"pinvault doctor" {
        return Err(PinvaultError::Internal(
            "record unreadable after rotation".to_string(),
        ));
    }

    match manager.unwrap_key(&rotated, &first) {
        Err(PinvaultError::WrongPin) => Ok(()),
        Ok(_) => Err(PinvaultError::Internal(
            "stale PIN still unwraps".to_string(),
        )),
        Err(e) => Err(e),
    }
}

/// Data directory exists (or can be created later) and is writable.
async fn check_data_dir(data_dir: &str) -> CheckResult {
    let start = Instant::now();
    let path = Path::new(data_dir);

    if !path.exists() {
        return CheckResult::new(
            "Data directory",
            CheckStatus::Warn,
            format!("not found: {data_dir} (will be created on first use)"),
            start,
        );
    }

    match tempfile::tempfile_in(path) {
        Ok(_) => CheckResult::new(
            "Data directory",
            CheckStatus::Pass,
            format!("writable: {data_dir}"),
            start,
        ),
        Err(e) => CheckResult::new(
            "Data directory",
            CheckStatus::Fail,
            format!("not writable: {e}"),
            start,
        ),
    }
}
