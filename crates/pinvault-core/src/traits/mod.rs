// SPDX-FileCopyrightText: 2026 Pinvault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store contracts the keyring calls into.
//!
//! Both traits use `#[async_trait]` so they can be held as trait objects.

pub mod storage;

pub use storage::{ContentStore, CredentialStore};
