// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication for the DataLens client.
//!
//! - [`TokenStore`] persists the token pair and decodes claims on demand.
//! - [`RefreshCoordinator`] keeps at most one refresh in flight.
//! - [`AuthMachine`] models the session lifecycle and publishes snapshots.
//! - [`AuthService`] is the context object built once at startup and shared
//!   by everything that needs an `Authorization` header.

pub mod coordinator;
pub mod machine;
pub mod service;
pub mod storage;
pub mod token_store;

pub use coordinator::{RefreshCoordinator, RefreshFailure};
pub use machine::{
    AuthContext, AuthEvent, AuthMachine, AuthSnapshot, AuthState, MAX_REFRESH_RETRIES,
    SESSION_EXPIRED,
};
pub use service::{AuthService, RefreshSettings};
pub use storage::{FileStorage, MemoryStorage};
pub use token_store::{
    decode_claims, is_token_expired, is_token_expired_at, token_expiry, TokenStore,
    TOKEN_STORAGE_KEY,
};
