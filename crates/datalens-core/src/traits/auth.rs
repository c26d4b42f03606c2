// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication seams: the token endpoints and the session-expiry hook.

use async_trait::async_trait;

use crate::error::DatalensError;
use crate::types::{AuthTokens, LoginCredentials};

/// The backend's token endpoints.
///
/// Calls made through this trait never carry an `Authorization` header.
#[async_trait]
pub trait AuthBackend: Send + Sync + 'static {
    /// Exchanges a username and password for a token pair.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthTokens, DatalensError>;

    /// Exchanges a refresh token for a new token pair.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, DatalensError>;
}

/// Invoked when the backend rejects the session with HTTP 401.
///
/// In a UI this navigates to the login route; the CLI prints a hint.
pub trait SessionExpiryHandler: Send + Sync {
    fn session_expired(&self);
}
