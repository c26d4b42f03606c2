// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the DataLens client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Base URL used when none is configured and the environment is `development`.
pub const DEV_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Top-level DataLens configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatalensConfig {
    /// Backend location and HTTP behaviour.
    #[serde(default)]
    pub api: ApiConfig,

    /// Token grant parameters and refresh timing.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Sampling job polling policy.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Durable client storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Deployment environment; decides whether a missing base URL is an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the REST backend. Required in production.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub environment: Environment,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            environment: Environment::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

impl ApiConfig {
    /// Resolve the effective base URL.
    ///
    /// Falls back to [`DEV_API_BASE_URL`] in development; in production an
    /// unset URL is an error.
    pub fn resolve_base_url(&self) -> Result<Url, String> {
        let raw = match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => match self.environment {
                Environment::Development => DEV_API_BASE_URL,
                Environment::Production => {
                    return Err("api.base_url must be set in production".to_string());
                }
            },
        };
        let url = Url::parse(raw).map_err(|e| format!("api.base_url `{raw}` is not a valid URL: {e}"))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(format!(
                "api.base_url must use http or https, got `{other}`"
            )),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// OAuth password-grant parameters and refresh timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// `client_id` sent with the password grant.
    #[serde(default)]
    pub client_id: String,

    /// `client_secret` sent with the password grant.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Space-separated scopes requested at login.
    #[serde(default)]
    pub scope: String,

    /// Refresh this many seconds before the access token expires.
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: u64,

    /// Delay between refresh attempts after a transient failure.
    #[serde(default = "default_refresh_retry_delay_ms")]
    pub refresh_retry_delay_ms: u64,

    /// Schedule a background refresh ahead of expiry.
    #[serde(default = "default_auto_refresh")]
    pub auto_refresh: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            scope: String::new(),
            refresh_margin_secs: default_refresh_margin_secs(),
            refresh_retry_delay_ms: default_refresh_retry_delay_ms(),
            auto_refresh: default_auto_refresh(),
        }
    }
}

fn default_refresh_margin_secs() -> u64 {
    60
}

fn default_refresh_retry_delay_ms() -> u64 {
    1000
}

fn default_auto_refresh() -> bool {
    true
}

/// Polling policy for asynchronous sampling jobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollingConfig {
    /// Delay between status fetches.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Give up after this many failed fetches in a row.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    /// Upper bound on the backoff delay after failed fetches.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Stop polling after this many seconds. `0` polls until a terminal status.
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
            max_backoff_ms: default_max_backoff_ms(),
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_max_consecutive_failures() -> u32 {
    10
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_max_duration_secs() -> u64 {
    3600
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn max_duration(&self) -> Option<Duration> {
        (self.max_duration_secs > 0).then(|| Duration::from_secs(self.max_duration_secs))
    }
}

/// Durable client storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding persisted client state (one file per key).
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
        }
    }
}

fn default_state_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("datalens"))
        .unwrap_or_else(|| std::path::PathBuf::from(".datalens"))
        .to_string_lossy()
        .to_string()
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_falls_back_to_localhost() {
        let api = ApiConfig::default();
        let url = api.resolve_base_url().unwrap();
        assert_eq!(url.as_str(), DEV_API_BASE_URL);
    }

    #[test]
    fn production_requires_base_url() {
        let api = ApiConfig {
            environment: Environment::Production,
            ..Default::default()
        };
        let err = api.resolve_base_url().unwrap_err();
        assert!(err.contains("must be set in production"));
    }

    #[test]
    fn blank_base_url_counts_as_unset() {
        let api = ApiConfig {
            base_url: Some("   ".into()),
            environment: Environment::Production,
            ..Default::default()
        };
        assert!(api.resolve_base_url().is_err());
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        let api = ApiConfig {
            base_url: Some("not a url".into()),
            ..Default::default()
        };
        assert!(api.resolve_base_url().unwrap_err().contains("not a valid URL"));

        let api = ApiConfig {
            base_url: Some("ftp://data.example.com".into()),
            ..Default::default()
        };
        assert!(api.resolve_base_url().unwrap_err().contains("http or https"));
    }

    #[test]
    fn explicit_base_url_wins_in_production() {
        let api = ApiConfig {
            base_url: Some("https://data.example.com/api/v1".into()),
            environment: Environment::Production,
            ..Default::default()
        };
        assert_eq!(
            api.resolve_base_url().unwrap().as_str(),
            "https://data.example.com/api/v1"
        );
    }
}
