// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted token endpoints.
//!
//! `MockAuthBackend` implements `AuthBackend` with queued outcomes and counts
//! every call, so tests can assert how many refreshes actually hit the wire.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use datalens_core::{AuthBackend, AuthTokens, DatalensError, LoginCredentials};

use crate::tokens::token_pair;

type Outcome = Result<AuthTokens, DatalensError>;

/// Mock `AuthBackend` with FIFO outcome queues.
///
/// When a queue is empty, login rejects with 401 and refresh issues a fresh
/// pair for `alice` valid for an hour.
pub struct MockAuthBackend {
    logins: Arc<Mutex<VecDeque<Outcome>>>,
    refreshes: Arc<Mutex<VecDeque<Outcome>>>,
    login_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    latency: Duration,
}

impl MockAuthBackend {
    pub fn new() -> Self {
        Self {
            logins: Arc::new(Mutex::new(VecDeque::new())),
            refreshes: Arc::new(Mutex::new(VecDeque::new())),
            login_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency` (use with a paused clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn push_login(&self, outcome: Outcome) {
        self.logins.lock().await.push_back(outcome);
    }

    pub async fn push_refresh(&self, outcome: Outcome) {
        self.refreshes.lock().await.push_back(outcome);
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    async fn settle(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for MockAuthBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn login(&self, _credentials: &LoginCredentials) -> Result<AuthTokens, DatalensError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.settle().await;
        self.logins.lock().await.pop_front().unwrap_or_else(|| {
            Err(DatalensError::Authentication {
                status: Some(401),
                message: "Incorrect username or password".into(),
            })
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<AuthTokens, DatalensError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.settle().await;
        self.refreshes
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(token_pair("alice", 2, 3600)))
    }
}
