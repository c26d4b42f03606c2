// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling loop for asynchronous multi-round sampling jobs.

pub mod observer;
pub mod poller;
pub mod policy;

pub use observer::{JobObserver, NoopObserver};
pub use poller::{JobPoller, PollHandle, PollOutcome};
pub use policy::PollPolicy;
