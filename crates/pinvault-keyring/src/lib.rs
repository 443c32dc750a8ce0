// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PIN-protected envelope encryption for the Pinvault secrets vault.
//!
//! A random master key encrypts every stored record with AES-256-GCM. The
//! master key itself is sealed under a key derived with PBKDF2 from the
//! account's PIN hash, so changing the PIN re-wraps one 32-byte key and
//! leaves all records untouched.

pub mod codec;
pub mod kdf;
pub mod keys;
pub mod manager;
pub mod pin;
pub mod vault;

pub use codec::{EnvelopeCodec, generate_random_key};
pub use keys::MasterKey;
pub use manager::MasterKeyManager;
pub use pin::{PinHasher, PinVerifier, validate_pin_format};
pub use vault::SecretVault;
