// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pinvault - a PIN-protected personal secrets vault.
//!
//! This is the binary entry point.

mod commands;
mod doctor;
mod prompt;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pinvault_config::PinvaultConfig;
use pinvault_core::{PinvaultError, RecordId, UserId};
use tracing::error;

/// Pinvault - a PIN-protected personal secrets vault.
#[derive(Parser, Debug)]
#[command(name = "pinvault", version, about, long_about = None)]
struct Cli {
    /// Configuration file to load instead of the standard search paths.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account and its master key.
    Init {
        #[arg(long)]
        user: String,
    },
    /// Check a PIN without touching any record.
    VerifyPin {
        #[arg(long)]
        user: String,
    },
    /// Encrypt and store a record (reads stdin unless --file is given).
    Put {
        #[arg(long)]
        user: String,
        record: String,
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Decrypt a record to stdout.
    Get {
        #[arg(long)]
        user: String,
        record: String,
    },
    /// Delete a record.
    Rm {
        #[arg(long)]
        user: String,
        record: String,
    },
    /// Replace the PIN without re-encrypting any record.
    ChangePin {
        #[arg(long)]
        user: String,
    },
    /// Run self-tests against the configured cryptography and storage.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let loaded = match &cli.config {
        Some(path) => pinvault_config::load_and_validate_path(path),
        None => pinvault_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            pinvault_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    if let Err(e) = run(cli, &config).await {
        if e.is_fatal() {
            error!(error = %e, "command failed");
        }
        eprintln!("error: {e}");
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: Cli, config: &PinvaultConfig) -> Result<(), PinvaultError> {
    match cli.command {
        Commands::Doctor { plain } => {
            doctor::run_doctor(config, cli.config.as_deref(), plain).await
        }
        Commands::Config => commands::run_config(config),
        Commands::Init { user } => {
            let vault = commands::open_vault(config).await?;
            commands::run_init(&vault, &UserId(user)).await
        }
        Commands::VerifyPin { user } => {
            let vault = commands::open_vault(config).await?;
            commands::run_verify_pin(&vault, &UserId(user)).await
        }
        Commands::Put { user, record, file } => {
            let vault = commands::open_vault(config).await?;
            commands::run_put(&vault, &UserId(user), &RecordId(record), file.as_deref()).await
        }
        Commands::Get { user, record } => {
            let vault = commands::open_vault(config).await?;
            commands::run_get(&vault, &UserId(user), &RecordId(record)).await
        }
        Commands::Rm { user, record } => {
            let vault = commands::open_vault(config).await?;
            commands::run_rm(&vault, &UserId(user), &RecordId(record)).await
        }
        Commands::ChangePin { user } => {
            let vault = commands::open_vault(config).await?;
            commands::run_change_pin(&vault, &UserId(user)).await
        }
    }
}

/// 2 for a rejected PIN, 3 for a lost update, 1 otherwise.
fn exit_code(error: &PinvaultError) -> i32 {
    match error {
        PinvaultError::WrongPin => 2,
        PinvaultError::VersionConflict { .. } => 3,
        _ => 1,
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so `get` output on stdout stays byte-exact.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "pinvault={log_level},pinvault_keyring={log_level},pinvault_store={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn put_accepts_file_flag() {
        let cli = Cli::try_parse_from([
            "pinvault", "put", "--user", "alice", "db", "--file", "secret.txt",
        ])
        .unwrap();
        match cli.command {
            Commands::Put { user, record, file } => {
                assert_eq!(user, "alice");
                assert_eq!(record, "db");
                assert_eq!(file, Some(PathBuf::from("secret.txt")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["pinvault", "doctor", "--plain", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::Doctor { plain: true }));
    }

    #[test]
    fn user_is_required() {
        assert!(Cli::try_parse_from(["pinvault", "get", "db"]).is_err());
    }

    #[test]
    fn exit_codes_distinguish_pin_and_conflict() {
        assert_eq!(exit_code(&PinvaultError::WrongPin), 2);
        assert_eq!(
            exit_code(&PinvaultError::VersionConflict {
                user: "alice".into()
            }),
            3
        );
        assert_eq!(exit_code(&PinvaultError::EntropyUnavailable), 1);
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config =
            pinvault_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.keyring.kdf_iterations, 100_000);
    }
}
