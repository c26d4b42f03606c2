// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! DataLens - command-line client for the DataLens data platform.

mod datasets;
mod notify;
mod sampling;
mod session;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use datalens_auth::FileStorage;
use datalens_client::ApiClient;
use datalens_config::DatalensConfig;
use datalens_core::DatalensError;

use crate::datasets::DatasetsCommand;
use crate::notify::Notice;
use crate::sampling::SamplingCommand;
use crate::session::LoginRedirect;

/// DataLens - browse datasets and run sampling jobs.
#[derive(Parser, Debug)]
#[command(name = "datalens", version, about, long_about = None)]
struct Cli {
    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in with a username and password.
    Login {
        #[arg(long, short)]
        username: Option<String>,
    },
    /// Sign out and forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami {
        /// Only decode the stored token; do not contact the server.
        #[arg(long)]
        offline: bool,
    },
    /// Browse the dataset catalogue.
    #[command(subcommand)]
    Datasets(DatasetsCommand),
    /// Inspect columns and run sampling jobs.
    #[command(subcommand)]
    Sampling(SamplingCommand),
    /// Manage DataLens configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration, reporting every problem.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match datalens_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            datalens_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.logging.level);

    if let Commands::Config(ConfigCommand::Check) = cli.command {
        print_config_summary(&config);
        return;
    }

    let client = match build_client(&config) {
        Ok(client) => client,
        Err(e) => std::process::exit(notify::report(&e)),
    };

    let report: fn(&DatalensError) -> i32 = match cli.command {
        Commands::Login { .. } => notify::report_login,
        _ => notify::report,
    };
    let result = run(&client, &config, cli.command, cli.json).await;
    client.auth_service().shutdown();
    if let Err(e) = result {
        std::process::exit(report(&e));
    }
}

fn build_client(config: &DatalensConfig) -> Result<ApiClient, DatalensError> {
    let storage = FileStorage::new(&config.storage.state_dir);
    let client = ApiClient::from_config(config, Arc::new(storage))?
        .with_expiry_handler(Arc::new(LoginRedirect));
    Ok(client)
}

async fn run(
    client: &ApiClient,
    config: &DatalensConfig,
    command: Commands,
    json: bool,
) -> Result<(), DatalensError> {
    match command {
        Commands::Login { username } => session::login(client, username).await,
        Commands::Logout => session::logout(client).await,
        Commands::Whoami { offline } => session::whoami(client, offline, json).await,
        Commands::Datasets(command) => datasets::run(client, command, json).await,
        Commands::Sampling(command) => {
            sampling::run(client, &config.polling, command, json).await
        }
        Commands::Config(ConfigCommand::Check) => {
            print_config_summary(config);
            Ok(())
        }
    }
}

fn print_config_summary(config: &DatalensConfig) {
    Notice::success("configuration is valid").print();
    if let Ok(url) = config.api.resolve_base_url() {
        println!("  api.base_url:      {url}");
    }
    println!("  api.timeout_secs:  {}", config.api.timeout_secs);
    println!("  storage.state_dir: {}", config.storage.state_dir);
    println!("  logging.level:     {}", config.logging.level);
}

/// Initialize the tracing subscriber; `RUST_LOG` overrides `logging.level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("datalens={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sampling_run_with_watch() {
        let cli = Cli::try_parse_from([
            "datalens", "sampling", "run", "4", "2", "--request", "rounds.json", "--watch",
        ])
        .unwrap();
        match cli.command {
            Commands::Sampling(SamplingCommand::Run {
                dataset_id,
                version_id,
                watch,
                ..
            }) => {
                assert_eq!((dataset_id, version_id), (4, 2));
                assert!(watch);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn repeated_tags_are_collected() {
        let cli = Cli::try_parse_from([
            "datalens", "--json", "datasets", "list", "--tag", "q1", "--tag", "eu",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Datasets(DatasetsCommand::List { tags, .. }) => {
                assert_eq!(tags, vec!["q1", "eu"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn client_builds_from_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DatalensConfig::default();
        config.storage.state_dir = dir.path().to_string_lossy().to_string();
        let client = build_client(&config).unwrap();
        assert!(!client.auth_service().is_authenticated());
    }
}
