// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the DataLens configuration system.

use datalens_config::diagnostic::ConfigError;
use datalens_config::model::{DatalensConfig, Environment, DEV_API_BASE_URL};
use datalens_config::{load_and_validate_str, load_config, load_config_from_path, load_config_from_str};
use figment::Jail;

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[api]
base_url = "https://data.example.com/api/v1"
environment = "production"
timeout_secs = 10

[auth]
client_id = "dashboard"
client_secret = "s3cret"
scope = "datasets sampling"
refresh_margin_secs = 120
refresh_retry_delay_ms = 250
auto_refresh = false

[polling]
interval_ms = 500
max_consecutive_failures = 3
max_backoff_ms = 4000
max_duration_secs = 0

[storage]
state_dir = "/tmp/datalens-test"

[logging]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.api.environment, Environment::Production);
    assert_eq!(config.api.timeout_secs, 10);
    assert_eq!(config.auth.client_id, "dashboard");
    assert_eq!(config.auth.client_secret.as_deref(), Some("s3cret"));
    assert_eq!(config.auth.scope, "datasets sampling");
    assert_eq!(config.auth.refresh_margin_secs, 120);
    assert!(!config.auth.auto_refresh);
    assert_eq!(config.polling.interval_ms, 500);
    assert_eq!(config.polling.max_consecutive_failures, 3);
    assert!(config.polling.max_duration().is_none());
    assert_eq!(config.storage.state_dir, "/tmp/datalens-test");
    assert_eq!(config.logging.level, "debug");
    assert_eq!(
        config.api.resolve_base_url().unwrap().as_str(),
        "https://data.example.com/api/v1"
    );
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    assert_eq!(config.api.environment, Environment::Development);
    assert_eq!(config.api.resolve_base_url().unwrap().as_str(), DEV_API_BASE_URL);
    assert_eq!(config.auth.refresh_margin_secs, 60);
    assert_eq!(config.polling.interval_ms, 2000);
    assert_eq!(config.polling.max_backoff_ms, 30_000);
    assert_eq!(config.logging.level, "info");
    assert!(config.auth.auto_refresh);
}

#[test]
fn unknown_field_in_polling_produces_error() {
    let err = load_config_from_str("[polling]\nintervl_ms = 100\n").unwrap_err();
    assert!(err.to_string().contains("intervl_ms"), "got: {err}");
}

#[test]
fn unknown_top_level_section_rejected() {
    assert!(load_config_from_str("[telemetry]\nenabled = true\n").is_err());
}

/// `DATALENS_AUTH_CLIENT_ID` lands on `auth.client_id` once mapped.
#[test]
fn dotted_override_reaches_nested_key() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: DatalensConfig = Figment::new()
        .merge(Serialized::defaults(DatalensConfig::default()))
        .merge(Toml::string("[auth]\nclient_id = \"from-toml\"\n"))
        .merge(("auth.client_id", "from-env"))
        .extract()
        .expect("should merge override");

    assert_eq!(config.auth.client_id, "from-env");
}

#[test]
fn section_env_vars_override_file() {
    Jail::expect_with(|jail| {
        jail.create_file("datalens.toml", "[auth]\nclient_id = \"from-file\"\n")?;
        jail.set_env("DATALENS_AUTH_CLIENT_ID", "from-env");
        jail.set_env("DATALENS_POLLING_INTERVAL_MS", "750");

        let config = load_config_from_path(&jail.directory().join("datalens.toml"))?;
        assert_eq!(config.auth.client_id, "from-env");
        assert_eq!(config.polling.interval_ms, 750);
        Ok(())
    });
}

#[test]
fn new_base_url_var_wins_over_legacy() {
    Jail::expect_with(|jail| {
        jail.set_env("VITE_API_BASE_URL", "https://legacy.example.com/api/v1");
        jail.set_env("DATALENS_API_BASE_URL", "https://data.example.com/api/v1");

        let config = load_config()?;
        assert_eq!(
            config.api.base_url.as_deref(),
            Some("https://data.example.com/api/v1")
        );
        Ok(())
    });
}

#[test]
fn cli_only_env_vars_do_not_break_loading() {
    Jail::expect_with(|jail| {
        jail.set_env("DATALENS_PASSWORD", "secret");
        jail.set_env("DATALENS_LOGGING_LEVEL", "debug");

        let config = load_config()?;
        assert_eq!(config.logging.level, "debug");
        Ok(())
    });
}

#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: DatalensConfig = Figment::new()
        .merge(Serialized::defaults(DatalensConfig::default()))
        .merge(Toml::file("/nonexistent/path/datalens.toml"))
        .extract()
        .expect("missing file should be skipped");
    assert_eq!(config.polling.interval_ms, 2000);
}

#[test]
fn load_and_validate_suggests_correct_key() {
    let errors = load_and_validate_str("[auth]\nclient_idd = \"x\"\n").unwrap_err();
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, span, .. } => Some((suggestion.clone(), *span)),
        _ => None,
    });
    let (suggestion, span) = suggestion.expect("expected an UnknownKey error");
    assert_eq!(suggestion.as_deref(), Some("client_id"));
    assert!(span.is_some(), "inline source should yield a span");
}

#[test]
fn load_and_validate_reports_invalid_type() {
    let errors = load_and_validate_str("[api]\ntimeout_secs = \"soon\"\n").unwrap_err();
    let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    assert!(
        rendered.iter().any(|m| m.contains("timeout_secs") || m.contains("invalid type")),
        "got: {rendered:?}"
    );
}

#[test]
fn load_and_validate_runs_semantic_checks() {
    let errors =
        load_and_validate_str("[api]\nenvironment = \"production\"\n").unwrap_err();
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("base_url")));
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "scop".to_string(),
        suggestion: Some("scope".to_string()),
        valid_keys: "client_id, client_secret, scope".to_string(),
        span: None,
        src: None,
    };
    assert!(error.code().is_some());
    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `scope`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("scop"));
}

#[test]
fn config_error_converts_to_domain_error() {
    let err: datalens_core::DatalensError = ConfigError::Validation {
        message: "polling.interval_ms must be greater than 0".into(),
    }
    .into();
    assert!(err.to_string().contains("interval_ms"));
}
