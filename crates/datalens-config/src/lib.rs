// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the DataLens client.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, environment variable overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use datalens_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("API: {:?}", config.api.resolve_base_url());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use datalens_core::DatalensError;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    ApiConfig, AuthConfig, DatalensConfig, Environment, LoggingConfig, PollingConfig,
    StorageConfig,
};

/// Load configuration from the XDG hierarchy and validate it.
///
/// On a Figment error the failures are turned into diagnostics with source
/// spans and typo suggestions.
pub fn load_and_validate() -> Result<DatalensConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            tracing::debug!(environment = ?config.api.environment, "configuration loaded");
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load configuration from a specific TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<DatalensConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read whichever config files exist, keyed by the path Figment reports.
fn collect_toml_sources() -> Vec<(String, String)> {
    let local = std::env::current_dir()
        .map(|d| d.join(loader::LOCAL_CONFIG_PATH))
        .unwrap_or_else(|_| loader::LOCAL_CONFIG_PATH.into());

    [
        local,
        loader::user_config_path(),
        loader::SYSTEM_CONFIG_PATH.into(),
    ]
    .into_iter()
    .filter_map(|path| {
        std::fs::read_to_string(&path)
            .ok()
            .map(|content| (path.display().to_string(), content))
    })
    .collect()
}

impl From<ConfigError> for DatalensError {
    fn from(err: ConfigError) -> Self {
        DatalensError::Config(err.to_string())
    }
}
