// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Job status lookup used by the polling loop.

use async_trait::async_trait;

use crate::error::DatalensError;
use crate::types::SamplingJob;

/// Fetches the latest snapshot of a server-side job.
#[async_trait]
pub trait JobStatusSource: Send + Sync + 'static {
    async fn job_status(&self, job_id: &str) -> Result<SamplingJob, DatalensError>;
}
