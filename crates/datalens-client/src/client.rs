// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The authenticated request pipeline.
//!
//! [`ApiClient::request`] attaches a bearer token to every call except the
//! credential-issuing endpoints, waiting for a shared refresh when the stored
//! access token has expired. A `401` on an authenticated call ends the session
//! and notifies the [`SessionExpiryHandler`].

use std::sync::Arc;

use async_trait::async_trait;
use datalens_auth::{AuthService, TokenStore};
use datalens_config::DatalensConfig;
use datalens_core::{
    DatalensError, JobStatusSource, KeyValueStorage, SamplingJob, SessionExpiryHandler,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::endpoints::{AuthApi, DatasetsApi, ExploreApi, SamplingApi};
use crate::request::ApiRequest;
use crate::response::ApiResponse;
use crate::token::TokenClient;
use crate::transport::Transport;

/// Logs the expiry; used when the caller installs no handler.
#[derive(Debug, Default)]
pub struct LogExpiry;

impl SessionExpiryHandler for LogExpiry {
    fn session_expired(&self) {
        warn!("session expired, sign in again");
    }
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Transport,
    auth: AuthService,
    on_expired: Arc<dyn SessionExpiryHandler>,
}

impl ApiClient {
    pub fn new(transport: Transport, auth: AuthService) -> Self {
        Self {
            transport,
            auth,
            on_expired: Arc::new(LogExpiry),
        }
    }

    /// Wire up transport, token endpoints, token store, and auth service from
    /// configuration.
    pub fn from_config(
        config: &DatalensConfig,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Result<Self, DatalensError> {
        let transport = Transport::new(&config.api)?;
        let backend = TokenClient::new(transport.clone(), &config.auth);
        let auth = AuthService::new(TokenStore::new(storage), Arc::new(backend), &config.auth);
        Ok(Self::new(transport, auth))
    }

    pub fn with_expiry_handler(mut self, handler: Arc<dyn SessionExpiryHandler>) -> Self {
        self.on_expired = handler;
        self
    }

    pub fn auth_service(&self) -> &AuthService {
        &self.auth
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn datasets(&self) -> DatasetsApi<'_> {
        DatasetsApi::new(self)
    }

    pub fn explore(&self) -> ExploreApi<'_> {
        ExploreApi::new(self)
    }

    pub fn sampling(&self) -> SamplingApi<'_> {
        SamplingApi::new(self)
    }

    /// Send `request`, authenticating it unless it targets an exempt endpoint.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse, DatalensError> {
        let authenticated = request.requires_auth();
        let authorization = if authenticated {
            Some(self.auth.authorization().await?)
        } else {
            None
        };

        match self.transport.send(request, authorization.as_deref()).await {
            Err(e) if authenticated && e.status() == Some(401) => {
                self.auth.expire_session().await;
                self.on_expired.session_expired();
                Err(e)
            }
            other => other,
        }
    }

    /// Send `request` and deserialize the JSON response.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, DatalensError> {
        self.request(request).await?.into_json()
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.transport.base_url().as_str())
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl JobStatusSource for ApiClient {
    async fn job_status(&self, job_id: &str) -> Result<SamplingJob, DatalensError> {
        debug!(job_id, "fetching job status");
        self.sampling().job_status(job_id).await
    }
}
