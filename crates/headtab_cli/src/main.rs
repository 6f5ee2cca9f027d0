//! headtab simulator
//!
//! Replays a gesture trace against a container and prints the resulting
//! state after every step.

use anyhow::{Context, Result};
use clap::Parser;
use headtab::ContainerConfig;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod trace;

use trace::{Simulator, Trace};

#[derive(Parser)]
#[command(name = "headtab-sim")]
#[command(about = "Replay gesture traces against a collapsible header container", long_about = None)]
#[command(version)]
struct Cli {
    /// Trace file (JSON, or TOML with a .toml extension)
    #[arg(required_unless_present = "dump_config")]
    trace: Option<PathBuf>,

    /// Container configuration file or directory containing headtab.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frames per second used for frame steps
    #[arg(long, default_value = "60")]
    fps: u32,

    /// Print one JSON object per step
    #[arg(long)]
    json: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ContainerConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ContainerConfig::default(),
    };

    if cli.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let Some(path) = cli.trace else {
        anyhow::bail!("no trace given");
    };
    let trace = Trace::load(&path)?;
    tracing::info!(scenes = trace.scenes.len(), steps = trace.steps.len(), "replaying trace");

    let mut sim = Simulator::new(config, &trace, cli.fps)?;
    for snapshot in sim.run(&trace.steps) {
        if cli.json {
            println!("{}", serde_json::to_string(&snapshot)?);
        } else {
            println!("{}", snapshot.line());
        }
    }
    tracing::info!(
        commands = sim.scroll_commands(),
        active = sim.container().active_index(),
        "trace finished"
    );

    Ok(())
}
