// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sampling endpoints, including the asynchronous multi-round jobs.

use datalens_core::sampling::{
    ColumnsResponse, MergedSample, MultiRoundResult, MultiRoundSamplingRequest, SamplingRequest,
    SamplingResult,
};
use datalens_core::{DatalensError, JobSubmission, SamplingJob};

use crate::client::ApiClient;
use crate::request::ApiRequest;

#[derive(Debug, Clone, Copy)]
pub struct SamplingApi<'a> {
    client: &'a ApiClient,
}

impl<'a> SamplingApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn execute(
        &self,
        dataset_id: i64,
        version_id: i64,
        request: &SamplingRequest,
    ) -> Result<SamplingResult, DatalensError> {
        request.method.validate()?;
        let request = ApiRequest::post(format!("/sampling/{dataset_id}/{version_id}/execute"))
            .json(request)?;
        self.client.request_json(request).await
    }

    pub async fn columns(
        &self,
        dataset_id: i64,
        version_id: i64,
        sheet: Option<&str>,
    ) -> Result<ColumnsResponse, DatalensError> {
        let request = ApiRequest::get(format!("/sampling/{dataset_id}/{version_id}/columns"))
            .query_opt("sheet", sheet);
        self.client.request_json(request).await
    }

    /// Run every round synchronously and wait for the result.
    pub async fn execute_multi_round(
        &self,
        dataset_id: i64,
        version_id: i64,
        request: &MultiRoundSamplingRequest,
    ) -> Result<MultiRoundResult, DatalensError> {
        request.validate()?;
        let request = ApiRequest::post(format!(
            "/sampling/{dataset_id}/{version_id}/multi-round/execute"
        ))
        .json(request)?;
        self.client.request_json(request).await
    }

    /// Submit a multi-round run as a background job.
    pub async fn run_multi_round(
        &self,
        dataset_id: i64,
        version_id: i64,
        request: &MultiRoundSamplingRequest,
    ) -> Result<JobSubmission, DatalensError> {
        request.validate()?;
        let request = ApiRequest::post(format!(
            "/sampling/{dataset_id}/{version_id}/multi-round/run"
        ))
        .json(request)?;
        self.client.request_json(request).await
    }

    pub async fn job_status(&self, job_id: &str) -> Result<SamplingJob, DatalensError> {
        self.client
            .request_json(ApiRequest::get(format!("/sampling/multi-round/jobs/{job_id}")))
            .await
    }

    pub async fn merged_sample(&self, job_id: &str) -> Result<MergedSample, DatalensError> {
        self.client
            .request_json(ApiRequest::get(format!(
                "/sampling/multi-round/jobs/{job_id}/merged-sample"
            )))
            .await
    }
}
