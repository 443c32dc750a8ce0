// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account and record subcommands.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use pinvault_config::PinvaultConfig;
use pinvault_core::{PinvaultError, RecordId, UserId};
use pinvault_keyring::SecretVault;
use pinvault_store::FileStore;
use tokio::io::AsyncReadExt;
use zeroize::Zeroizing;

use crate::prompt::{self, NEW_PIN_ENV_VAR, PIN_ENV_VAR};

/// Open the file store at the configured data directory.
pub async fn open_vault(config: &PinvaultConfig) -> Result<SecretVault, PinvaultError> {
    let store = Arc::new(FileStore::open(&config.storage.data_dir).await?);
    SecretVault::new(config, store.clone(), store)
}

pub async fn run_init(vault: &SecretVault, user: &UserId) -> Result<(), PinvaultError> {
    let pin = prompt::read_new_pin(PIN_ENV_VAR, "New PIN")?;
    vault.create_account(user, &pin).await?;
    println!("account {user} created");
    Ok(())
}

pub async fn run_verify_pin(vault: &SecretVault, user: &UserId) -> Result<(), PinvaultError> {
    let pin = prompt::read_pin(PIN_ENV_VAR, "PIN")?;
    vault.verify_pin(user, &pin).await?;
    println!("PIN ok");
    Ok(())
}

/// Store a record read from `file`, or from stdin when no file is given.
pub async fn run_put(
    vault: &SecretVault,
    user: &UserId,
    record: &RecordId,
    file: Option<&Path>,
) -> Result<(), PinvaultError> {
    let pin = prompt::read_pin(PIN_ENV_VAR, "PIN")?;

    let plaintext = match file {
        Some(path) => Zeroizing::new(tokio::fs::read(path).await.map_err(PinvaultError::storage)?),
        None => {
            let mut buf = Zeroizing::new(Vec::new());
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .map_err(PinvaultError::storage)?;
            buf
        }
    };

    vault.store_secret(user, &pin, record, &plaintext).await?;
    eprintln!("stored {record} ({} bytes)", plaintext.len());
    Ok(())
}

/// Write the decrypted record to stdout, byte for byte.
pub async fn run_get(
    vault: &SecretVault,
    user: &UserId,
    record: &RecordId,
) -> Result<(), PinvaultError> {
    let pin = prompt::read_pin(PIN_ENV_VAR, "PIN")?;
    let plaintext = vault.read_secret(user, &pin, record).await?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&plaintext)
        .and_then(|()| stdout.flush())
        .map_err(PinvaultError::storage)?;
    Ok(())
}

pub async fn run_rm(
    vault: &SecretVault,
    user: &UserId,
    record: &RecordId,
) -> Result<(), PinvaultError> {
    let pin = prompt::read_pin(PIN_ENV_VAR, "PIN")?;

    if vault.delete_secret(user, &pin, record).await? {
        println!("deleted {record}");
        Ok(())
    } else {
        Err(PinvaultError::RecordNotFound(record.to_string()))
    }
}

pub async fn run_change_pin(vault: &SecretVault, user: &UserId) -> Result<(), PinvaultError> {
    let old_pin = prompt::read_pin(PIN_ENV_VAR, "Current PIN")?;
    let new_pin = prompt::read_new_pin(NEW_PIN_ENV_VAR, "New PIN")?;
    vault.change_pin(user, &old_pin, &new_pin).await?;
    println!("PIN changed");
    Ok(())
}

/// Print the effective configuration as TOML.
pub fn run_config(config: &PinvaultConfig) -> Result<(), PinvaultError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| PinvaultError::Internal(format!("config serialization failed: {e}")))?;
    print!("{rendered}");
    Ok(())
}
