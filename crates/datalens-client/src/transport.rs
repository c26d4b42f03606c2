// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport: URL resolution, request encoding, and error mapping.

use std::time::Duration;

use datalens_config::ApiConfig;
use datalens_core::DatalensError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;
use url::Url;

use crate::request::{ApiRequest, RequestBody};
use crate::response::{error_from_response, ApiResponse};

/// Thin wrapper over `reqwest::Client` bound to one backend.
///
/// Knows nothing about sessions: the caller passes the `Authorization`
/// value, if any.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl Transport {
    /// Build a transport from the `[api]` configuration section.
    pub fn new(config: &ApiConfig) -> Result<Self, DatalensError> {
        let base_url = config.resolve_base_url().map_err(DatalensError::Config)?;
        Self::with_base_url(base_url, config.timeout())
    }

    pub fn with_base_url(base_url: Url, timeout: Duration) -> Result<Self, DatalensError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("datalens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DatalensError::Network {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for `endpoint`, appended to the base path.
    pub fn url(&self, endpoint: &str) -> Result<Url, DatalensError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = endpoint.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| DatalensError::invalid(format!("invalid endpoint `{endpoint}`: {e}")))
    }

    /// Send `request` and classify the response.
    pub async fn send(
        &self,
        request: ApiRequest,
        authorization: Option<&str>,
    ) -> Result<ApiResponse, DatalensError> {
        let url = self.url(&request.endpoint)?;
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .query(&request.query_pairs());

        let multipart = matches!(request.body, RequestBody::Multipart(_));
        for (name, value) in &request.headers {
            if multipart && name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            authenticated = authorization.is_some(),
            "sending API request"
        );

        let response = builder.send().await.map_err(|e| self.send_error(e))?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|e| self.send_error(e))?;

        debug!(
            status = %status,
            endpoint = %request.endpoint,
            bytes = bytes.len(),
            "API response received"
        );

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &bytes));
        }
        ApiResponse::from_parts(status.as_u16(), content_type.as_deref(), bytes)
    }

    fn send_error(&self, e: reqwest::Error) -> DatalensError {
        if e.is_timeout() {
            DatalensError::Timeout {
                duration: self.timeout,
            }
        } else if e.is_builder() {
            DatalensError::invalid(format!("could not build request: {e}"))
        } else {
            DatalensError::Network {
                message: e.to_string(),
                source: Some(Box::new(e)),
            }
        }
    }
}
