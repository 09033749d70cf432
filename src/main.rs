//! runecove - deterministic scavenger-hunt progression engine
//!
//! Server-side binary: headless scripted runs plus ledger administration.

mod commands;
mod config;
mod headless;
mod save;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::ServerConfig;
use headless::ScriptedOutcome;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "runecove", version, about = "Rune hunt progression engine")]
struct Cli {
    /// Path to the server config TOML (defaults to config/runecove.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the scripted headless hunt and write its event stream.
    Simulate {
        /// Maximum ticks to simulate.
        #[arg(long, default_value_t = 5_000)]
        ticks: u64,
        /// Override the JSONL event output path from the config.
        #[arg(long)]
        events: Option<PathBuf>,
        /// Lose the boss battle instead of capturing.
        #[arg(long)]
        lose: bool,
    },
    /// Run one admin command against the persisted ledger.
    ///
    /// Examples: `runecove hunt progress 1`, `runecove hunt dialogue clear`.
    Hunt {
        /// Command words, e.g. `stage 1 3`.
        #[arg(trailing_var_arg = true, required = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<()> {
    // WARN by default, overridable via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ServerConfig::load_from_path(path),
        None => ServerConfig::load(),
    };

    match cli.command {
        Command::Simulate {
            ticks,
            events,
            lose,
        } => {
            let events_path = events.unwrap_or_else(|| config.events_path.clone());
            let outcome = if lose {
                ScriptedOutcome::Defeat
            } else {
                ScriptedOutcome::Capture
            };
            info!(ticks, ?events_path, ?outcome, "starting headless hunt");
            let summary = headless::run(&config, ticks, Some(&events_path), outcome)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Hunt { args } => {
            let command = commands::parse_command(&args.join(" "))
                .map_err(|err| anyhow::anyhow!("{err}"))?;
            let mut ledger = save::load_ledger(&config.ledger_path)?;
            let now_ms = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);
            let output = commands::execute_command(&mut ledger, command, now_ms);
            for line in &output.lines {
                println!("{line}");
            }
            if ledger.take_dirty() {
                save::save_ledger(&config.ledger_path, &ledger)?;
            }
        }
    }

    Ok(())
}
