// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellable polling of a server-side sampling job.
//!
//! Each [`JobPoller::spawn`] starts one Tokio task that fetches the job
//! status, publishes the snapshot, and sleeps until the next fetch. Fetches
//! never overlap: the next sleep starts only after the previous fetch has
//! settled. Cancelling the [`PollHandle`] stops the task at its next await
//! point. A status fetch still in flight is dropped, which aborts its HTTP
//! request, so its response never reaches the snapshot or the observer.

use std::sync::Arc;

use datalens_config::PollingConfig;
use datalens_core::{DatalensError, JobStatus, JobStatusSource, SamplingJob};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::observer::JobObserver;
use crate::policy::PollPolicy;

/// How a poll ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(SamplingJob),
    /// The job reported `failed`; carries the backend's message.
    Failed(String),
    Cancelled,
    /// Polling stopped without a terminal status.
    GaveUp(String),
}

/// Starts polls against one status source.
#[derive(Clone)]
pub struct JobPoller {
    source: Arc<dyn JobStatusSource>,
    policy: PollPolicy,
}

impl JobPoller {
    pub fn new(source: Arc<dyn JobStatusSource>, config: &PollingConfig) -> Self {
        Self::with_policy(source, PollPolicy::from(config))
    }

    pub fn with_policy(source: Arc<dyn JobStatusSource>, policy: PollPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Poll `job_id` until it completes, fails, gives up, or is cancelled.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn spawn(&self, job_id: impl Into<String>, observer: Arc<dyn JobObserver>) -> PollHandle {
        let job_id = job_id.into();
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(None);

        let run = PollRun {
            job_id: job_id.clone(),
            source: Arc::clone(&self.source),
            observer,
            policy: self.policy,
            cancel: cancel.clone(),
            snapshots: tx,
        };
        debug!(job_id = %job_id, interval = ?self.policy.interval, "starting job poll");
        let task = tokio::spawn(run.run());

        PollHandle {
            job_id,
            cancel,
            snapshots: rx,
            task: Some(task),
        }
    }
}

impl std::fmt::Debug for JobPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobPoller")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Owner's side of a running poll. Dropping the handle cancels the poll.
#[derive(Debug)]
pub struct PollHandle {
    job_id: String,
    cancel: CancellationToken,
    snapshots: watch::Receiver<Option<SamplingJob>>,
    task: Option<JoinHandle<PollOutcome>>,
}

impl PollHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stop polling. No fetch starts after this returns, and a response
    /// already in flight is dropped unseen.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Latest snapshot, if any fetch has succeeded.
    pub fn snapshot(&self) -> Option<SamplingJob> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SamplingJob>> {
        self.snapshots.clone()
    }

    /// Wait for the poll to end. Dropping the returned future cancels the
    /// poll.
    pub async fn wait(mut self) -> PollOutcome {
        let Some(task) = self.task.take() else {
            return PollOutcome::Cancelled;
        };
        match task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => PollOutcome::Cancelled,
            Err(e) => {
                warn!(job_id = %self.job_id, error = %e, "poll task panicked");
                PollOutcome::GaveUp(format!("poll task failed: {e}"))
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct PollRun {
    job_id: String,
    source: Arc<dyn JobStatusSource>,
    observer: Arc<dyn JobObserver>,
    policy: PollPolicy,
    cancel: CancellationToken,
    snapshots: watch::Sender<Option<SamplingJob>>,
}

/// What to do after one fetch.
enum Step {
    Continue { failures: u32 },
    Stop(PollOutcome),
}

impl PollRun {
    async fn run(self) -> PollOutcome {
        let started = Instant::now();
        let mut failures = 0u32;

        loop {
            let fetched = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return self.cancelled(),
                result = self.source.job_status(&self.job_id) => result,
            };
            if self.cancel.is_cancelled() {
                return self.cancelled();
            }

            failures = match self.handle(fetched, failures) {
                Step::Continue { failures } => failures,
                Step::Stop(outcome) => return outcome,
            };

            if let Some(limit) = self.policy.max_duration {
                if started.elapsed() >= limit {
                    return self.give_up(format!("job did not finish within {}s", limit.as_secs()));
                }
            }

            let delay = self.policy.delay(failures);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return self.cancelled(),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn handle(&self, fetched: Result<SamplingJob, DatalensError>, failures: u32) -> Step {
        match fetched {
            Ok(job) => {
                self.snapshots.send_replace(Some(job.clone()));
                match job.status {
                    JobStatus::Completed => {
                        info!(
                            job_id = %self.job_id,
                            rounds = job.total_rounds,
                            sampled = job.total_sampled(),
                            "sampling job completed"
                        );
                        self.observer.on_complete(&job);
                        Step::Stop(PollOutcome::Completed(job))
                    }
                    JobStatus::Failed => {
                        let message = job
                            .error_message
                            .clone()
                            .unwrap_or_else(|| "sampling job failed".to_string());
                        warn!(job_id = %self.job_id, error = %message, "sampling job failed");
                        self.observer.on_failure(&message);
                        Step::Stop(PollOutcome::Failed(message))
                    }
                    JobStatus::Pending | JobStatus::Running => {
                        debug!(
                            job_id = %self.job_id,
                            status = %job.status,
                            completed = job.completed_rounds,
                            total = job.total_rounds,
                            "job in progress"
                        );
                        self.observer.on_progress(&job);
                        Step::Continue { failures: 0 }
                    }
                }
            }
            Err(e) if e.is_transient() => {
                let failures = failures + 1;
                if self.policy.exhausted(failures) {
                    return Step::Stop(self.give_up(format!(
                        "job status unavailable after {failures} attempts: {}",
                        e.user_message()
                    )));
                }
                warn!(
                    job_id = %self.job_id,
                    error = %e,
                    failures,
                    retry_in = ?self.policy.delay(failures),
                    "job status fetch failed, backing off"
                );
                Step::Continue { failures }
            }
            Err(e) => Step::Stop(self.give_up(e.user_message())),
        }
    }

    fn cancelled(&self) -> PollOutcome {
        debug!(job_id = %self.job_id, "job poll cancelled");
        PollOutcome::Cancelled
    }

    fn give_up(&self, reason: String) -> PollOutcome {
        warn!(job_id = %self.job_id, reason = %reason, "giving up on job");
        self.observer.on_failure(&reason);
        PollOutcome::GaveUp(reason)
    }
}
