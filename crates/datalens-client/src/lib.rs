// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticated REST client for the DataLens backend.
//!
//! [`Transport`] speaks HTTP, [`TokenClient`] implements the token endpoints
//! for the auth service, and [`ApiClient`] is the request pipeline with the
//! typed endpoint groups on top.

pub mod client;
pub mod endpoints;
pub mod request;
pub mod response;
pub mod token;
pub mod transport;

pub use client::{ApiClient, LogExpiry};
pub use endpoints::{AuthApi, DatasetUpload, DatasetsApi, ExploreApi, SamplingApi};
pub use request::{is_exempt, ApiRequest, QueryValue, RequestBody, EXEMPT_ENDPOINTS};
pub use response::ApiResponse;
pub use token::TokenClient;
pub use transport::Transport;
