// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: a resolvable base URL, positive
//! durations, and a coherent polling backoff.

use crate::diagnostic::ConfigError;
use crate::model::DatalensConfig;

/// Levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of failing on the first.
pub fn validate_config(config: &DatalensConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if let Err(message) = config.api.resolve_base_url() {
        fail(message);
    }

    if config.api.timeout_secs == 0 {
        fail("api.timeout_secs must be greater than 0".to_string());
    }

    if config.polling.interval_ms == 0 {
        fail("polling.interval_ms must be greater than 0".to_string());
    }

    if config.polling.max_backoff_ms < config.polling.interval_ms {
        fail(format!(
            "polling.max_backoff_ms ({}) must be at least polling.interval_ms ({})",
            config.polling.max_backoff_ms, config.polling.interval_ms
        ));
    }

    if config.polling.max_consecutive_failures == 0 {
        fail("polling.max_consecutive_failures must be at least 1".to_string());
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        fail(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.state_dir.trim().is_empty() {
        fail("storage.state_dir must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
