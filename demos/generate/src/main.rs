//! Lists templates or generates one learning artifact.
//!
//! ```text
//! generate list
//! generate run <technique> <input.json> [--version <v>] [--offline <response.json>]
//! ```
//!
//! Without `--offline` the OpenAI adapter is used (`OPENAI_API_KEY` required).
//! With it, the given file is replayed as the oracle's only completion.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use learn_studio::adapters::openai::{OpenAiClient, OpenAiConfig};
use learn_studio::adapters::scripted::ScriptedClient;
use learn_studio::prelude::*;
use learn_studio::telemetry::{TelemetryConfig, init_tracing};
use tracing::info;

/// Learning artifact generator
#[derive(Debug, Parser)]
#[command(name = "generate")]
#[command(about = "List templates or generate one learning artifact")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the latest template of every technique
    List,
    /// Generate one artifact from a JSON input document
    Run {
        /// Technique id (mnemonic_it, story_it, flashcards_index_it, coach_it)
        #[arg(value_parser = Technique::from_str)]
        technique: Technique,
        /// Path to the input JSON document
        input: PathBuf,
        /// Template version (latest when omitted)
        #[arg(long)]
        version: Option<String>,
        /// Replay this response file instead of calling the provider
        #[arg(long)]
        offline: Option<PathBuf>,
    },
}

async fn client_for(
    config: &StudioConfig,
    offline: Option<PathBuf>,
) -> Result<Arc<dyn CompletionClient>> {
    if let Some(path) = offline {
        let response = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        return Ok(Arc::new(ScriptedClient::with_responses([response])));
    }

    let mut openai =
        OpenAiConfig::from_env(config.oracle.model.clone()).with_timeout(config.oracle.timeout());
    if let Some(base_url) = &config.oracle.base_url {
        openai = openai.with_base_url(base_url)?;
    }
    Ok(Arc::new(OpenAiClient::new(openai)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&TelemetryConfig::from_env()?)?;

    let config = StudioConfig::from_env()?;
    let templates = Arc::new(TemplateStore::builtin()?);

    match cli.command {
        Command::List => {
            let offline: Arc<dyn CompletionClient> = Arc::new(ScriptedClient::new());
            let orchestrator = GenerationOrchestrator::from_config(&config, templates, offline)?;
            for meta in orchestrator.list_templates() {
                println!(
                    "{}@{}  inputs={}  maxAnswerLength={}",
                    meta.technique,
                    meta.version,
                    meta.input_fields.join(","),
                    meta.guardrails.max_answer_length
                );
            }
        }
        Command::Run {
            technique,
            input,
            version,
            offline,
        } => {
            let document = tokio::fs::read_to_string(&input)
                .await
                .with_context(|| format!("reading {}", input.display()))?;
            let payload: serde_json::Value =
                serde_json::from_str(&document).context("input is not JSON")?;

            let client = client_for(&config, offline).await?;
            let orchestrator = GenerationOrchestrator::from_config(&config, templates, client)?;
            let artifact = orchestrator
                .generate(technique, &payload, version.as_deref())
                .await?;
            info!(id = %artifact.id, attempts = artifact.attempts, "artifact ready");
            println!("{}", serde_json::to_string_pretty(&artifact)?);
        }
    }

    Ok(())
}
