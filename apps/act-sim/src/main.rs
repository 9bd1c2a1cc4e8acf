//! # act-sim
//!
//! Replays scripted goal scenarios against an in-memory action server.
//!
//! - `act-sim run <scenario.toml> [--config server.toml] [--events log.jsonl]`
//!   — run a scenario, printing one JSON line per step on stdout
//! - `act-sim defaults` — print the default server options as TOML

mod events_log;
mod scenario;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use act_server::{NotificationSink, ServerOptions};

use crate::events_log::JsonlSink;
use crate::scenario::Scenario;

/// Action server scenario runner.
#[derive(Parser)]
#[command(name = "act-sim", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file.
    Run {
        /// Scenario TOML file.
        scenario: PathBuf,
        /// Server options TOML file (defaults apply when absent).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Append server events to this JSONL file.
        #[arg(long)]
        events: Option<PathBuf>,
    },
    /// Print the default server options.
    Defaults,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the step records.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("act_server=info".parse()?)
                .add_directive("act_sim=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            scenario,
            config,
            events,
        } => run(scenario, config, events),
        Commands::Defaults => {
            print!("{}", ServerOptions::default().to_toml()?);
            Ok(())
        }
    }
}

fn run(scenario_path: PathBuf, config: Option<PathBuf>, events: Option<PathBuf>) -> Result<()> {
    let options = match &config {
        Some(path) => ServerOptions::load(path)?,
        None => ServerOptions::default(),
    };
    let scenario = Scenario::load(&scenario_path)?;
    tracing::info!(
        scenario = %scenario_path.display(),
        steps = scenario.steps.len(),
        "running scenario"
    );

    let mut sinks: Vec<Box<dyn NotificationSink>> = Vec::new();
    if let Some(path) = &events {
        sinks.push(Box::new(JsonlSink::new(path)));
    }
    let records = scenario.run_with_sinks(options, sinks)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for record in &records {
        writeln!(out, "{}", serde_json::to_string(record)?)?;
    }
    Ok(())
}
