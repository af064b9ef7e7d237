//! evidex: expertise evidence extraction from a bibliographic store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod args;

use args::{Cli, Command};
use evidex_core::{EvidexConfig, Expert, SourceInputRef};
use evidex_runtime::EvidencePipeline;
use evidex_store::{ImportBatch, SqliteDocumentStore};

fn resolve_config_path() -> PathBuf {
    std::env::var("EVIDEX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("evidex.json"))
}

fn build_pipeline(config: &EvidexConfig) -> EvidencePipeline {
    let store = Arc::new(SqliteDocumentStore::open(&config.store, config.source.clone()));
    info!("Document store: {}", config.store.describe());
    EvidencePipeline::from_config(config, store.clone(), store)
}

fn sorted(experts: impl IntoIterator<Item = Expert>) -> Vec<Expert> {
    let mut experts: Vec<Expert> = experts.into_iter().collect();
    experts.sort_by(|a, b| a.id().cmp(b.id()));
    experts
}

fn print_experts(experts: impl IntoIterator<Item = Expert>) -> anyhow::Result<()> {
    for expert in sorted(experts) {
        println!("{}", serde_json::to_string(&expert)?);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config_path = resolve_config_path();
    let mut config = EvidexConfig::load(Some(config_path.as_path()))?;

    match command {
        Command::Experts => {
            let pipeline = build_pipeline(&config);
            print_experts(pipeline.list_experts()?)?;
        }
        Command::Find { pattern } => {
            let pipeline = build_pipeline(&config);
            print_experts(pipeline.find_experts(&pattern)?)?;
        }
        Command::Collect(collect) => {
            if let Some(technique) = collect.technique {
                config.technique = technique;
            }
            if let Some(language) = collect.language {
                config.language = language;
            }
            let input = SourceInputRef::new(collect.input.unwrap_or_else(|| config.source.clone()));

            let pipeline = build_pipeline(&config);
            let expert = pipeline
                .list_experts()?
                .into_iter()
                .find(|e| e.id() == collect.expert_id)
                .ok_or_else(|| anyhow!("No expert with id {}", collect.expert_id))?;
            let report = pipeline.collect_report(&expert, &input)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let batch: ImportBatch = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", file.display()))?;
            let store = SqliteDocumentStore::create(&config.store.database, config.source.clone())?;
            let report = store.import(&batch)?;
            info!(
                "Imported {} authors, {} documents into {}",
                report.authors, report.documents, config.store.database
            );
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    Ok(())
}
