// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./datalens.toml` > `~/.config/datalens/datalens.toml` > `/etc/datalens/datalens.toml`
//! with environment variable overrides via the `DATALENS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::DatalensConfig;

/// Top-level sections, used to turn `DATALENS_<SECTION>_<KEY>` into `section.key`.
const SECTIONS: &[&str] = &["api", "auth", "polling", "storage", "logging"];

/// Legacy variable carried over from the web dashboard's build environment.
const LEGACY_BASE_URL_VAR: &str = "VITE_API_BASE_URL";

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/datalens/datalens.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "datalens.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("datalens/datalens.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/datalens/datalens.toml` (system-wide)
/// 3. `~/.config/datalens/datalens.toml` (user XDG config)
/// 4. `./datalens.toml` (local directory)
/// 5. `VITE_API_BASE_URL`
/// 6. `DATALENS_*` environment variables
pub fn load_config() -> Result<DatalensConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no environment).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<DatalensConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DatalensConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DatalensConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DatalensConfig::default()))
        .merge(Toml::file(path))
        .merge(legacy_env_provider())
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DatalensConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(legacy_env_provider())
        .merge(env_provider())
}

/// `DATALENS_*` variables, mapped section-first so that underscores inside
/// key names survive: `DATALENS_AUTH_CLIENT_ID` becomes `auth.client_id`,
/// not `auth.client.id`.
///
/// Only variables naming a config section are read. Others under the same
/// prefix, such as `DATALENS_PASSWORD`, belong to the CLI.
fn env_provider() -> Env {
    Env::prefixed("DATALENS_")
        .filter(|key| is_section_key(key.as_str()))
        .map(|key| map_env_key(key.as_str()).into())
}

fn legacy_env_provider() -> Env {
    Env::raw()
        .only(&[LEGACY_BASE_URL_VAR])
        .map(|_| "api.base_url".into())
}

/// True when a prefix-stripped env var name starts with `<section>_`.
pub(crate) fn is_section_key(key: &str) -> bool {
    section_of(&key.to_ascii_lowercase()).is_some()
}

fn section_of(key: &str) -> Option<(&'static str, &str)> {
    SECTIONS.iter().find_map(|section| {
        key.strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            .map(|rest| (*section, rest))
    })
}

/// Map a prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    match section_of(&key) {
        Some((section, rest)) => format!("{section}.{rest}"),
        None => key,
    }
}
