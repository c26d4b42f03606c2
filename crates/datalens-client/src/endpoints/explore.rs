// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use datalens_core::explore::{ExploreRequest, ExploreResponse};
use datalens_core::DatalensError;

use crate::client::ApiClient;
use crate::request::ApiRequest;

#[derive(Debug, Clone, Copy)]
pub struct ExploreApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ExploreApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Apply an operation pipeline to a dataset version. Operations are
    /// checked locally before anything is sent.
    pub async fn run(
        &self,
        dataset_id: i64,
        version_id: i64,
        request: &ExploreRequest,
    ) -> Result<ExploreResponse, DatalensError> {
        request.validate()?;
        let request = ApiRequest::post(format!("/explore/{dataset_id}/{version_id}")).json(request)?;
        self.client.request_json(request).await
    }
}
