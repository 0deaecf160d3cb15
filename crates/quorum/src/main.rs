use std::io::Read;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quorum_models::{CycleInput, MarketSnapshot, QuorumConfig};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "quorum", about = "Deterministic aggregation of decision agents")]
struct Cli {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate pre-collected agent submissions (CycleInput JSON)
    Aggregate {
        /// Read input from a file instead of stdin
        #[arg(short, long)]
        input: Option<String>,

        /// Additional mandatory guardrail id (repeatable)
        #[arg(short, long)]
        mandatory: Vec<String>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Run the configured agents against a MarketSnapshot JSON
    Evaluate {
        /// Read input from a file instead of stdin
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable (respects RUST_LOG)
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Aggregate {
            input,
            mandatory,
            pretty,
        } => {
            let json = read_input(input.as_deref())?;
            let cycle: CycleInput =
                serde_json::from_str(&json).context("Failed to parse CycleInput JSON")?;
            info!(submissions = cycle.submissions.len(), "Aggregating cycle");

            let decision = quorum::aggregate_cycle(&config, &cycle, &mandatory)
                .context("Aggregation failed")?;
            print_json(&decision, pretty)?;
        }
        Command::Evaluate { input, pretty } => {
            let json = read_input(input.as_deref())?;
            let snapshot: MarketSnapshot =
                serde_json::from_str(&json).context("Failed to parse MarketSnapshot JSON")?;

            let collector = quorum::build_collector(&config).context("Failed to build collector")?;
            let report = quorum::evaluate(&collector, &snapshot)
                .await
                .map_err(|e| anyhow::anyhow!("Evaluation failed: {e}"))?;
            print_json(&report, pretty)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&str>) -> Result<QuorumConfig> {
    let Some(path) = path else {
        return Ok(QuorumConfig::default());
    };
    let config_str =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read config: {path}"))?;
    toml::from_str(&config_str).with_context(|| format!("Failed to parse config: {path}"))
}

fn read_input(path: Option<&str>) -> Result<String> {
    if let Some(path) = path {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read input: {path}"))
    } else {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        Ok(buf)
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}
