// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `datalens sampling ...` commands, including live job progress.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Subcommand;
use datalens_client::ApiClient;
use datalens_config::PollingConfig;
use datalens_core::sampling::MultiRoundSamplingRequest;
use datalens_core::{DatalensError, SamplingJob};
use datalens_sampling::{JobObserver, JobPoller, PollOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::notify::Notice;
use crate::session::to_pretty;

#[derive(Subcommand, Debug)]
pub enum SamplingCommand {
    /// Show the columns of a dataset version.
    Columns {
        dataset_id: i64,
        version_id: i64,
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Submit a multi-round sampling job.
    Run {
        dataset_id: i64,
        version_id: i64,
        /// JSON file with the rounds to run.
        #[arg(long, short)]
        request: PathBuf,
        /// Follow the job until it finishes.
        #[arg(long)]
        watch: bool,
    },
    /// Show the status of a job.
    Job {
        job_id: String,
        #[arg(long)]
        watch: bool,
    },
    /// Fetch the merged sample of a finished job.
    Merged { job_id: String },
}

pub async fn run(
    client: &ApiClient,
    polling: &PollingConfig,
    command: SamplingCommand,
    json: bool,
) -> Result<(), DatalensError> {
    let sampling = client.sampling();
    match command {
        SamplingCommand::Columns {
            dataset_id,
            version_id,
            sheet,
        } => {
            let columns = sampling
                .columns(dataset_id, version_id, sheet.as_deref())
                .await?;
            if json {
                println!("{}", to_pretty(&columns)?);
                return Ok(());
            }
            for column in &columns.columns {
                let nullable = if column.nullable { "null" } else { "" };
                println!("  {:<32} {:<12} {nullable}", column.name, column.dtype);
            }
            if let Some(rows) = columns.total_rows {
                println!("  {rows} rows");
            }
        }
        SamplingCommand::Run {
            dataset_id,
            version_id,
            request,
            watch,
        } => {
            let body = read_request(&request)?;
            let submission = sampling
                .run_multi_round(dataset_id, version_id, &body)
                .await?;
            info!(job_id = %submission.job_id, rounds = body.rounds.len(), "sampling job submitted");
            if json && !watch {
                println!("{}", to_pretty(&submission)?);
                return Ok(());
            }
            Notice::success(format!("Submitted job {}", submission.job_id)).print();
            if watch {
                watch_job(client, polling, &submission.job_id, json).await?;
            }
        }
        SamplingCommand::Job { job_id, watch } => {
            if watch {
                watch_job(client, polling, &job_id, json).await?;
            } else {
                let job = sampling.job_status(&job_id).await?;
                if json {
                    println!("{}", to_pretty(&job)?);
                } else {
                    print_job(&job);
                }
            }
        }
        SamplingCommand::Merged { job_id } => {
            let merged = sampling.merged_sample(&job_id).await?;
            println!("{}", to_pretty(&merged)?);
        }
    }
    Ok(())
}

/// Parse a multi-round request file and check it before submitting.
pub fn read_request(path: &Path) -> Result<MultiRoundSamplingRequest, DatalensError> {
    let content = std::fs::read_to_string(path).map_err(|e| DatalensError::Storage {
        source: Box::new(e),
    })?;
    let request: MultiRoundSamplingRequest = serde_json::from_str(&content).map_err(|e| {
        DatalensError::invalid(format!("{} is not a valid sampling request: {e}", path.display()))
    })?;
    request.validate()?;
    Ok(request)
}

/// Poll `job_id` with a progress bar until it finishes or Ctrl-C.
async fn watch_job(
    client: &ApiClient,
    polling: &PollingConfig,
    job_id: &str,
    json: bool,
) -> Result<(), DatalensError> {
    let observer = Arc::new(ProgressObserver::new());
    let poller = JobPoller::new(Arc::new(client.clone()), polling);
    let handle = poller.spawn(job_id, observer);

    // Dropping the pending `wait` drops the handle, which cancels the poll.
    let outcome = tokio::select! {
        outcome = handle.wait() => outcome,
        _ = tokio::signal::ctrl_c() => PollOutcome::Cancelled,
    };

    match outcome {
        PollOutcome::Completed(job) => {
            if json {
                println!("{}", to_pretty(&job)?);
            } else {
                print_job(&job);
            }
            Notice::success(format!("Job {job_id} completed")).print();
            Ok(())
        }
        PollOutcome::Failed(message) => {
            Err(DatalensError::Internal(format!("sampling job {job_id} failed: {message}")))
        }
        PollOutcome::GaveUp(reason) => Err(DatalensError::Internal(format!(
            "stopped watching job {job_id}: {reason}"
        ))),
        PollOutcome::Cancelled => {
            Notice::success(format!(
                "Stopped watching. Resume with `datalens sampling job {job_id} --watch`"
            ))
            .print();
            Ok(())
        }
    }
}

fn print_job(job: &SamplingJob) {
    println!(
        "  job {}: {} ({}/{} rounds)",
        job.id, job.status, job.completed_rounds, job.total_rounds
    );
    for round in &job.round_results {
        println!(
            "    round {:<3} {:>10} rows  {}",
            round.round_number,
            round.sample_size,
            round.output_name.as_deref().unwrap_or("")
        );
    }
    if let Some(error) = &job.error_message {
        println!("  error: {error}");
    }
}

/// Renders poll callbacks as an indicatif progress bar; hidden when stderr
/// is not a terminal.
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new() -> Self {
        let bar = if std::io::stderr().is_terminal() {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} rounds {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }

    fn update(&self, job: &SamplingJob) {
        self.bar.set_length(u64::from(job.total_rounds));
        self.bar.set_position(u64::from(job.completed_rounds));
        self.bar.set_message(job.status.to_string());
    }
}

impl JobObserver for ProgressObserver {
    fn on_progress(&self, job: &SamplingJob) {
        self.update(job);
        self.bar.tick();
    }

    fn on_complete(&self, job: &SamplingJob) {
        self.update(job);
        self.bar.finish_with_message("completed");
    }

    fn on_failure(&self, message: &str) {
        self.bar.abandon_with_message(format!("failed: {message}"));
        Notice::error(message).print();
    }
}
