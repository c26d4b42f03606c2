// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed endpoint groups. Each borrows the [`ApiClient`](crate::ApiClient)
//! and goes through its request pipeline.

pub mod auth;
pub mod datasets;
pub mod explore;
pub mod sampling;

pub use auth::AuthApi;
pub use datasets::{DatasetUpload, DatasetsApi};
pub use explore::ExploreApi;
pub use sampling::SamplingApi;
