// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seam traits between the DataLens crates.
//!
//! Network-facing traits use `#[async_trait]` for dynamic dispatch
//! compatibility; storage is synchronous like the browser storage it replaces.

pub mod auth;
pub mod jobs;
pub mod storage;

pub use auth::{AuthBackend, SessionExpiryHandler};
pub use jobs::JobStatusSource;
pub use storage::KeyValueStorage;
