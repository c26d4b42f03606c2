// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for DataLens integration tests.
//!
//! Provides token minting, scripted adapters and wiremock helpers for fast,
//! deterministic tests without a running backend.
//!
//! # Components
//!
//! - [`mint_token`] / [`token_pair`] - unsigned bearer tokens with chosen claims
//! - [`MockAuthBackend`] - scripted token endpoints with call counting
//! - [`ScriptedJobSource`] - scripted job status snapshots for the poller
//! - [`SequenceResponder`] - wiremock responder that walks a list of responses

pub mod mock_backend;
pub mod mock_jobs;
pub mod mock_server;
pub mod tokens;

pub use mock_backend::MockAuthBackend;
pub use mock_jobs::{job_snapshot, ScriptedJobSource};
pub use mock_server::{token_response, SequenceResponder};
pub use tokens::{access_token, mint_token, token_pair};
