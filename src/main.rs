mod cli;
mod client;
mod config;
mod dispatcher;
mod error;
mod reconciler;
mod resource;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::{error, info, warn};

use cli::Cli;
use client::TwClient;
use config::Document;
use resource::{ResourceType, PROVISION_ORDER};

#[derive(Debug, Default)]
struct RunSummary {
    applied: usize,
    failed: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if std::env::var_os("TOWER_ACCESS_TOKEN").is_none() {
        warn!("TOWER_ACCESS_TOKEN is not set; tw commands may fail to authenticate");
    }

    let doc = Document::load(&cli.config)
        .with_context(|| format!("invalid configuration {}", cli.config.display()))?;

    let client = TwClient::new(cli.tw_bin, cli.cli_config, cli.dry_run);
    let targets = target_types(&cli.targets, &doc);

    // Strictly sequential: one block at a time, one resource at a time, each
    // command run to completion before the next. A failed resource never
    // aborts the ones after it.
    let mut summary = RunSummary::default();
    for resource_type in &targets {
        for spec in doc.parse_block(resource_type) {
            match dispatcher::apply(&client, resource_type, &spec) {
                Ok(()) => summary.applied += 1,
                Err(e) => {
                    error!("{resource_type}: {e}");
                    summary.failed += 1;
                }
            }
        }
    }

    info!(
        "run complete: {} applied, {} failed",
        summary.applied, summary.failed
    );
    if !cli.quiet {
        if summary.failed == 0 {
            println!("  {} {} resources applied", "✓".green(), summary.applied);
        } else {
            println!(
                "  {} {} applied, {} failed (see log)",
                "!".yellow(),
                summary.applied,
                summary.failed
            );
        }
    }
    Ok(())
}

/// Blocks to process: the ones the user named, or every block present in the
/// document, known types first in provision order, custom blocks after in
/// document order.
fn target_types(requested: &[String], doc: &Document) -> Vec<ResourceType> {
    if !requested.is_empty() {
        return requested
            .iter()
            .map(|name| ResourceType::from_block_name(name))
            .collect();
    }

    let present = doc.block_names();
    let mut targets: Vec<ResourceType> = PROVISION_ORDER
        .iter()
        .filter(|ty| present.iter().any(|block| block == ty.as_str()))
        .cloned()
        .collect();
    for block in &present {
        let ty = ResourceType::from_block_name(block);
        if matches!(ty, ResourceType::Custom(_)) {
            targets.push(ty);
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_blocks_run_in_provision_order() {
        let doc = Document::from_yaml_str(
            "pipelines: []\ncredentials: []\norganizations: []\n",
        )
        .unwrap();
        let targets = target_types(&[], &doc);
        assert_eq!(
            targets,
            [
                ResourceType::Organizations,
                ResourceType::Credentials,
                ResourceType::Pipelines
            ]
        );
    }

    #[test]
    fn custom_blocks_run_last_in_document_order() {
        let doc = Document::from_yaml_str("info: []\ncredentials: []\n").unwrap();
        let targets = target_types(&[], &doc);
        assert_eq!(
            targets,
            [
                ResourceType::Credentials,
                ResourceType::Custom("info".to_string())
            ]
        );
    }

    #[test]
    fn explicit_targets_keep_the_given_order() {
        let doc = Document::from_yaml_str("credentials: []\n").unwrap();
        let requested = vec!["launch".to_string(), "credentials".to_string()];
        let targets = target_types(&requested, &doc);
        assert_eq!(targets, [ResourceType::Launch, ResourceType::Credentials]);
    }
}
