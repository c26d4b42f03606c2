// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-flight token refresh.
//!
//! At most one refresh runs at a time. Callers that arrive while one is in
//! flight await the same shared outcome instead of starting another. The
//! refresh runs on its own task, so it settles even if every caller gives up
//! waiting, and it clears the slot itself before its outcome is observed.

use std::future::Future;
use std::sync::Arc;

use datalens_core::DatalensError;
use futures::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Why a shared refresh failed. Cloned to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RefreshFailure {
    pub message: String,
}

impl RefreshFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<RefreshFailure> for DatalensError {
    fn from(failure: RefreshFailure) -> Self {
        DatalensError::unauthenticated(failure.message)
    }
}

type SharedRefresh = Shared<BoxFuture<'static, Result<(), RefreshFailure>>>;

#[derive(Default)]
pub struct RefreshCoordinator {
    in_flight: Arc<Mutex<Option<SharedRefresh>>>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Await the in-flight refresh, or start one with `start` if none is
    /// running. `start` is only called when this caller begins the refresh.
    pub async fn coordinate<F, Fut>(&self, start: F) -> Result<(), RefreshFailure>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), RefreshFailure>> + Send + 'static,
    {
        let shared = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some(running) => {
                    debug!("joining in-flight token refresh");
                    running.clone()
                }
                None => {
                    debug!("starting token refresh");
                    let refresh = self.spawn(start());
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };
        shared.await
    }

    /// Whether a refresh is currently in flight.
    pub async fn is_refreshing(&self) -> bool {
        self.in_flight.lock().await.is_some()
    }

    fn spawn<Fut>(&self, refresh: Fut) -> SharedRefresh
    where
        Fut: Future<Output = Result<(), RefreshFailure>> + Send + 'static,
    {
        let slot = Arc::clone(&self.in_flight);
        let task = tokio::spawn(async move {
            let outcome = refresh.await;
            // Only this task's refresh can occupy the slot until it is cleared.
            slot.lock().await.take();
            outcome
        });
        async move {
            task.await
                .unwrap_or_else(|e| Err(RefreshFailure::new(format!("refresh task failed: {e}"))))
        }
        .boxed()
        .shared()
    }
}
