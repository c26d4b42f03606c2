// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use datalens_core::SamplingJob;

/// Callbacks from a running poll. Called on the polling task; keep them short.
pub trait JobObserver: Send + Sync {
    /// A non-terminal snapshot arrived.
    fn on_progress(&self, _job: &SamplingJob) {}

    /// The job completed. Called at most once.
    fn on_complete(&self, job: &SamplingJob);

    /// The job failed or polling gave up. Called at most once.
    fn on_failure(&self, message: &str);
}

/// Ignores every callback; for callers that only use the handle.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl JobObserver for NoopObserver {
    fn on_complete(&self, _job: &SamplingJob) {}

    fn on_failure(&self, _message: &str) {}
}
