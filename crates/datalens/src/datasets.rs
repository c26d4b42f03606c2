// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `datalens datasets ...` commands.

use clap::Subcommand;
use datalens_client::ApiClient;
use datalens_core::dataset::{Dataset, DatasetListQuery, DatasetSearchQuery};
use datalens_core::DatalensError;

use crate::session::to_pretty;

#[derive(Subcommand, Debug)]
pub enum DatasetsCommand {
    /// List datasets.
    List {
        /// Only datasets whose name contains this text.
        #[arg(long)]
        name: Option<String>,
        /// Only datasets with this tag (repeatable).
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, default_value_t = 50)]
        limit: u64,
        #[arg(long, default_value_t = 0)]
        skip: u64,
    },
    /// Show one dataset with its versions.
    Show { id: i64 },
    /// Full-text search.
    Search {
        query: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Tolerate typos in the query.
        #[arg(long)]
        fuzzy: bool,
        #[arg(long, default_value_t = 20)]
        limit: u64,
    },
    /// List every tag in use.
    Tags,
}

pub async fn run(client: &ApiClient, command: DatasetsCommand, json: bool) -> Result<(), DatalensError> {
    let datasets = client.datasets();
    match command {
        DatasetsCommand::List {
            name,
            tags,
            limit,
            skip,
        } => {
            let query = DatasetListQuery {
                name,
                tags,
                limit: Some(limit),
                skip: Some(skip),
                ..Default::default()
            };
            let items = datasets.list(&query).await?;
            if json {
                println!("{}", to_pretty(&items)?);
            } else {
                print_table(&items);
            }
        }
        DatasetsCommand::Show { id } => {
            let dataset = datasets.get(id).await?;
            let versions = datasets.versions(id).await?;
            if json {
                println!(
                    "{}",
                    to_pretty(&serde_json::json!({"dataset": dataset, "versions": versions}))?
                );
                return Ok(());
            }
            println!("{} (#{})", dataset.name, dataset.id);
            if let Some(description) = &dataset.description {
                println!("  {description}");
            }
            if !dataset.tags.is_empty() {
                println!("  tags: {}", dataset.tags.join(", "));
            }
            println!("  versions:");
            for version in &versions {
                println!(
                    "    #{:<6} v{:<4} {:>10} rows  {:>4} cols  {}",
                    version.id,
                    version.version_number.map(|n| n.to_string()).unwrap_or_default(),
                    version.num_rows.map(|n| n.to_string()).unwrap_or_else(|| "?".into()),
                    version.num_columns.map(|n| n.to_string()).unwrap_or_else(|| "?".into()),
                    version.created_at.as_deref().unwrap_or("")
                );
            }
        }
        DatasetsCommand::Search {
            query,
            tags,
            fuzzy,
            limit,
        } => {
            let query = DatasetSearchQuery {
                query,
                tags,
                fuzzy: fuzzy.then_some(true),
                limit: Some(limit),
                ..Default::default()
            };
            let page = datasets.search(&query).await?;
            if json {
                println!("{}", to_pretty(&page)?);
            } else {
                print_table(&page.items);
                println!("  {} of {} matches", page.items.len(), page.total);
            }
        }
        DatasetsCommand::Tags => {
            let tags = datasets.tags().await?;
            if json {
                println!("{}", to_pretty(&tags)?);
            } else {
                for tag in tags {
                    println!("{tag}");
                }
            }
        }
    }
    Ok(())
}

fn print_table(items: &[Dataset]) {
    if items.is_empty() {
        println!("  no datasets");
        return;
    }
    for line in items.iter().map(table_row) {
        println!("{line}");
    }
}

fn table_row(dataset: &Dataset) -> String {
    let tags = if dataset.tags.is_empty() {
        String::new()
    } else {
        format!("[{}]", dataset.tags.join(", "))
    };
    format!("  #{:<6} {:<32} {tags}", dataset.id, truncate(&dataset.name, 32))
        .trim_end()
        .to_string()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(name: &str, tags: &[&str]) -> Dataset {
        serde_json::from_value(serde_json::json!({"id": 3, "name": name, "tags": tags})).unwrap()
    }

    #[test]
    fn row_shows_tags() {
        assert_eq!(
            table_row(&dataset("sales", &["q1", "eu"])),
            format!("  #3      {:<32} [q1, eu]", "sales")
        );
        assert_eq!(table_row(&dataset("sales", &[])), "  #3      sales");
    }

    #[test]
    fn long_names_are_truncated() {
        let name = "x".repeat(40);
        let short = truncate(&name, 10);
        assert_eq!(short.chars().count(), 10);
        assert!(short.ends_with('…'));
        assert_eq!(truncate("short", 10), "short");
    }
}
