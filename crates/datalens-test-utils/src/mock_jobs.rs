// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted job status source for poller tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use datalens_core::{DatalensError, JobStatus, JobStatusSource, RoundResult, SamplingJob};

/// Build a job snapshot with `completed` of `total` rounds done.
pub fn job_snapshot(id: &str, status: JobStatus, completed: u32, total: u32) -> SamplingJob {
    SamplingJob {
        id: id.to_string(),
        status,
        round_results: (1..=completed)
            .map(|round| RoundResult {
                round_number: round,
                sample_size: 100,
                ..Default::default()
            })
            .collect(),
        error_message: (status == JobStatus::Failed).then(|| "sampling failed".to_string()),
        completed_rounds: completed,
        total_rounds: total,
    }
}

/// Replays a fixed script of status responses, one per fetch.
///
/// Once the script runs out the last entry repeats, so a test that forgets a
/// terminal snapshot keeps polling instead of panicking.
pub struct ScriptedJobSource {
    script: Mutex<VecDeque<Result<SamplingJob, DatalensError>>>,
    last: Mutex<Option<SamplingJob>>,
    calls: AtomicUsize,
    latency: Duration,
}

impl ScriptedJobSource {
    pub fn new(script: Vec<Result<SamplingJob, DatalensError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    /// Delay every response by `latency` (use with a paused clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of status fetches issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobStatusSource for ScriptedJobSource {
    async fn job_status(&self, job_id: &str) -> Result<SamplingJob, DatalensError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.script.lock().await.pop_front();
        match next {
            Some(Ok(job)) => {
                *self.last.lock().await = Some(job.clone());
                Ok(job)
            }
            Some(Err(e)) => Err(e),
            None => match self.last.lock().await.clone() {
                Some(job) => Ok(job),
                None => Ok(job_snapshot(job_id, JobStatus::Pending, 0, 1)),
            },
        }
    }
}
