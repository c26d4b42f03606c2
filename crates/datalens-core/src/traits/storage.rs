// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable key/value storage for client state.

use crate::error::DatalensError;

/// String key/value store that survives process restarts.
///
/// Implementations must make `remove` idempotent: removing a missing key is
/// not an error.
pub trait KeyValueStorage: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, DatalensError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), DatalensError>;

    /// Deletes `key`.
    fn remove(&self, key: &str) -> Result<(), DatalensError>;
}
