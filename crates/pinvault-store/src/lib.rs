// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential and content store implementations for Pinvault.
//!
//! [`MemoryCredentialStore`] and [`MemoryContentStore`] keep everything in
//! process memory. [`FileStore`] persists both kinds of record as JSON files
//! with atomic replace. All implementations enforce compare-and-swap on the
//! credential record version.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::{MemoryContentStore, MemoryCredentialStore};
