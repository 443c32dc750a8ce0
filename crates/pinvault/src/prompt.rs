// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PIN acquisition via TTY prompt or environment variable.

use std::io::IsTerminal;

use pinvault_core::PinvaultError;
use secrecy::{ExposeSecret, SecretString};

/// Current PIN for non-interactive use.
pub const PIN_ENV_VAR: &str = "PINVAULT_PIN";

/// Replacement PIN for `change-pin` in non-interactive use.
pub const NEW_PIN_ENV_VAR: &str = "PINVAULT_NEW_PIN";

/// Both PIN sources hand over an owned `String`; it moves into the
/// `SecretString` without a copy and is zeroed when that drops.
fn non_empty(raw: String) -> Option<SecretString> {
    (!raw.is_empty()).then(|| SecretString::from(raw))
}

fn from_env(var: &str) -> Option<SecretString> {
    std::env::var(var).ok().and_then(non_empty)
}

fn read_hidden(label: &str) -> Result<SecretString, PinvaultError> {
    eprint!("{label}: ");
    let raw = rpassword::read_password()
        .map_err(|e| PinvaultError::Internal(format!("failed to read PIN: {e}")))?;
    non_empty(raw).ok_or_else(|| PinvaultError::InvalidPinFormat("empty PIN".to_string()))
}

fn no_source(var: &str) -> PinvaultError {
    PinvaultError::Config(format!(
        "no PIN provided: set {var} or run interactively"
    ))
}

/// Get a PIN from `var` or an interactive prompt.
///
/// Priority:
/// 1. The environment variable (for scripts and pipelines)
/// 2. Interactive TTY prompt via `rpassword`
pub fn read_pin(var: &str, label: &str) -> Result<SecretString, PinvaultError> {
    if let Some(pin) = from_env(var) {
        return Ok(pin);
    }

    if std::io::stdin().is_terminal() {
        return read_hidden(label);
    }

    Err(no_source(var))
}

/// Get a new PIN, prompting twice when interactive.
///
/// Environment variables are taken as-is without confirmation.
pub fn read_new_pin(var: &str, label: &str) -> Result<SecretString, PinvaultError> {
    if let Some(pin) = from_env(var) {
        return Ok(pin);
    }

    if std::io::stdin().is_terminal() {
        let first = read_hidden(label)?;
        let second = read_hidden(&format!("Confirm {}", label.to_lowercase()))?;
        if first.expose_secret() != second.expose_secret() {
            return Err(PinvaultError::InvalidPinFormat(
                "PINs do not match".to_string(),
            ));
        }
        return Ok(first);
    }

    Err(no_source(var))
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn pin_from_env_var() {
        // SAFETY: test-only env mutation, serialized with #[serial].
        unsafe { std::env::set_var(PIN_ENV_VAR, "1234") };
        let result = read_pin(PIN_ENV_VAR, "PIN");
        unsafe { std::env::remove_var(PIN_ENV_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "1234");
    }

    #[test]
    #[serial]
    fn new_pin_from_env_var_skips_confirmation() {
        unsafe { std::env::set_var(NEW_PIN_ENV_VAR, "5678") };
        let result = read_new_pin(NEW_PIN_ENV_VAR, "New PIN");
        unsafe { std::env::remove_var(NEW_PIN_ENV_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "5678");
    }

    #[test]
    #[serial]
    fn empty_env_var_is_not_a_pin() {
        unsafe { std::env::set_var(PIN_ENV_VAR, "") };
        // Under the test harness stdin is not a terminal, so there is no fallback.
        let result = read_pin(PIN_ENV_VAR, "PIN");
        unsafe { std::env::remove_var(PIN_ENV_VAR) };

        if !std::io::stdin().is_terminal() {
            assert!(matches!(result, Err(PinvaultError::Config(_))));
        }
    }

    #[test]
    fn empty_input_is_not_a_pin() {
        assert!(non_empty(String::new()).is_none());
        assert_eq!(
            non_empty("0042".to_string()).unwrap().expose_secret(),
            "0042"
        );
    }
}
