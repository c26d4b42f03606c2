// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Poll timing: fixed interval while healthy, exponential backoff on failure.

use std::time::Duration;

use datalens_config::PollingConfig;

/// Largest doubling exponent; keeps the multiplication from overflowing.
const MAX_BACKOFF_SHIFT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_backoff: Duration,
    pub max_consecutive_failures: u32,
    /// `None` polls until the job reaches a terminal status.
    pub max_duration: Option<Duration>,
}

impl PollPolicy {
    /// Delay before the next fetch after `failures` failed fetches in a row.
    ///
    /// Zero failures is the plain interval; each further failure doubles it,
    /// up to `max_backoff`.
    pub fn delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return self.interval;
        }
        let shift = (failures - 1).min(MAX_BACKOFF_SHIFT);
        self.interval
            .saturating_mul(1 << shift)
            .min(self.max_backoff.max(self.interval))
    }

    pub fn exhausted(&self, failures: u32) -> bool {
        failures >= self.max_consecutive_failures.max(1)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: config.interval(),
            max_backoff: config.max_backoff(),
            max_consecutive_failures: config.max_consecutive_failures,
            max_duration: config.max_duration(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
            max_consecutive_failures: 10,
            max_duration: None,
        }
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let p = policy();
        let delays: Vec<u64> = (0..7).map(|f| p.delay(f).as_secs()).collect();
        assert_eq!(delays, vec![2, 2, 4, 8, 16, 30, 30]);
        assert_eq!(p.delay(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn cap_below_interval_keeps_interval() {
        let p = PollPolicy {
            max_backoff: Duration::from_millis(500),
            ..policy()
        };
        assert_eq!(p.delay(3), Duration::from_secs(2));
    }

    #[test]
    fn exhaustion_threshold() {
        let p = PollPolicy {
            max_consecutive_failures: 3,
            ..policy()
        };
        assert!(!p.exhausted(2));
        assert!(p.exhausted(3));
    }

    #[test]
    fn from_config_defaults() {
        let p = PollPolicy::default();
        assert_eq!(p.interval, Duration::from_millis(2000));
        assert_eq!(p.max_backoff, Duration::from_millis(30_000));
        assert_eq!(p.max_consecutive_failures, 10);
        assert_eq!(p.max_duration, Some(Duration::from_secs(3600)));
    }
}
