//! Command line front end: replay recorded sessions, check configs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use handwave::{replay_session, PipelineConfig, RecordedSession};

#[derive(Parser)]
#[command(
    name = "handwave",
    about = "Replay and inspect recorded hand-tracking sessions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded session and print the event trace
    Replay {
        /// Path to the recorded session JSON
        input: PathBuf,

        /// Write the trace here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pipeline config JSON; defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Check a pipeline config file against its allowed ranges
    Validate {
        /// Path to the config JSON
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handwave=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay {
            input,
            output,
            config,
        } => run_replay(input, output, config),
        Commands::Validate { config } => run_validate(config),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: PipelineConfig =
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn run_replay(
    input: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config.as_ref())?;
    let session = RecordedSession::load(&input)
        .with_context(|| format!("loading session {}", input.display()))?;
    info!("replaying {} ({} frames)", input.display(), session.frames.len());

    let outcome = replay_session(&session, &config)?;

    let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();
    for trace in &outcome.trace {
        for event in &trace.events {
            *counts.entry(event.kind().as_str()).or_insert(0) += 1;
        }
    }
    for (kind, count) in &counts {
        info!("{:>5} x {}", count, kind);
    }
    info!(
        "{} events over {} ticks, {} malformed hands dropped",
        outcome.stats.events_emitted, outcome.stats.ticks, outcome.stats.malformed_hands
    );

    let json = serde_json::to_string_pretty(&outcome)?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("writing trace {}", path.display()))?;
            info!("trace written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_validate(config: PathBuf) -> anyhow::Result<()> {
    let loaded = load_config(Some(&config))?;
    info!("{} is valid", config.display());
    println!("{}", serde_json::to_string_pretty(&loaded)?);
    Ok(())
}
