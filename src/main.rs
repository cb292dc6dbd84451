//! Dramatis - builds character profiles from a long narrative text.

use anyhow::{Context, bail};
use clap::Parser;
use dramatis::config::loader::ConfigLoader;
use dramatis::observability::init_tracing;
use dramatis::oracle::create_oracle_backend;
use dramatis::services::{DocumentIngestor, IngestOutcome};
use dramatis::storage::StorageFactory;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "dramatis")]
#[command(version)]
#[command(about = "Incremental character profile builder for long-form narrative text")]
struct Cli {
    /// UTF-8 source document
    #[arg(env = "DRAMATIS_INPUT")]
    input: PathBuf,

    /// Configuration file path (defaults to ./dramatis.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => ConfigLoader::load_from(path),
        None => ConfigLoader::load(),
    }
    .context("failed to load configuration")?;

    let _guard = init_tracing(&config.logging)?;
    ConfigLoader::validate(&config)?;
    info!(
        app = %config.app_name,
        environment = %config.environment,
        store = %config.store.backend,
        oracle = %config.oracle.backend,
        "configuration loaded"
    );

    let store = StorageFactory::create(&config.store).await?;
    let backend = create_oracle_backend(&config.oracle)?;
    let ingestor = DocumentIngestor::from_config(&config, store.clone(), backend)?;

    let outcome = tokio::select! {
        outcome = ingestor.ingest_file(&cli.input) => outcome?,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, aborting run");
            store.close().await?;
            bail!("run aborted by user");
        }
    };

    match outcome {
        IngestOutcome::Completed(report) => {
            info!(
                steps = report.steps.len(),
                profiles = report.profiles.len(),
                elapsed_ms = report.elapsed_ms,
                "run completed"
            );
            println!("{}", serde_json::to_string_pretty(&report.profiles)?);
        }
        IngestOutcome::Rejected(verdict) => {
            warn!(
                ratio = verdict.arabic_ratio,
                lang = ?verdict.detected_lang,
                votes = verdict.votes,
                "document rejected by the language gate, nothing ingested"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parses_input_and_config() {
        let cli = Cli::try_parse_from(["dramatis", "novel.txt", "--config", "custom.toml"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("novel.txt"));
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));

        let cli = Cli::try_parse_from(["dramatis", "-c", "other.toml", "novel.txt"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("other.toml")));
    }
}
