// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The backend's token endpoints.

use async_trait::async_trait;
use datalens_config::AuthConfig;
use datalens_core::{AuthBackend, AuthTokens, DatalensError, LoginCredentials};
use secrecy::{ExposeSecret, SecretString};

use crate::request::ApiRequest;
use crate::transport::Transport;

pub const TOKEN_ENDPOINT: &str = "/users/token";
pub const REFRESH_ENDPOINT: &str = "/users/token/refresh";

/// Password grant and refresh calls. Never sends an `Authorization` header.
pub struct TokenClient {
    transport: Transport,
    client_id: String,
    client_secret: Option<SecretString>,
    scope: String,
}

impl TokenClient {
    pub fn new(transport: Transport, config: &AuthConfig) -> Self {
        Self {
            transport,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone().map(SecretString::from),
            scope: config.scope.clone(),
        }
    }

    fn grant_form(&self, credentials: &LoginCredentials) -> Vec<(&'static str, String)> {
        vec![
            ("grant_type", "password".to_string()),
            ("username", credentials.username.clone()),
            ("password", credentials.password.expose_secret().to_string()),
            ("scope", self.scope.clone()),
            ("client_id", self.client_id.clone()),
            (
                "client_secret",
                self.client_secret
                    .as_ref()
                    .map(|s| s.expose_secret().to_string())
                    .unwrap_or_default(),
            ),
        ]
    }
}

impl std::fmt::Debug for TokenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("scope", &self.scope)
            .finish()
    }
}

#[async_trait]
impl AuthBackend for TokenClient {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthTokens, DatalensError> {
        let request = ApiRequest::post(TOKEN_ENDPOINT).form(self.grant_form(credentials));
        self.transport.send(request, None).await?.into_json()
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, DatalensError> {
        let request = ApiRequest::post(REFRESH_ENDPOINT).query("refresh_token", refresh_token);
        self.transport.send(request, None).await?.into_json()
    }
}
