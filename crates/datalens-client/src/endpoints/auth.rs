// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use datalens_auth::AuthSnapshot;
use datalens_core::{CurrentUser, DatalensError, LoginCredentials, Registration};
use secrecy::ExposeSecret;

use crate::client::ApiClient;
use crate::request::ApiRequest;

/// `/users/*` endpoints.
#[derive(Debug, Clone, Copy)]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Sign in with the password grant. The session is held by the client's
    /// [`AuthService`](datalens_auth::AuthService).
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSnapshot, DatalensError> {
        self.client.auth_service().login(credentials).await
    }

    pub async fn refresh(&self) -> Result<(), DatalensError> {
        self.client.auth_service().refresh().await
    }

    pub async fn logout(&self) {
        self.client.auth_service().logout().await;
    }

    pub async fn me(&self) -> Result<CurrentUser, DatalensError> {
        self.client.request_json(ApiRequest::get("/users/me")).await
    }

    pub async fn register(&self, registration: &Registration) -> Result<CurrentUser, DatalensError> {
        if registration.username.trim().is_empty() {
            return Err(DatalensError::invalid("username must not be empty"));
        }
        if registration.password.expose_secret().is_empty() {
            return Err(DatalensError::invalid("password must not be empty"));
        }
        let request = ApiRequest::post("/users/register").json(registration)?;
        self.client.request_json(request).await
    }
}
