//! voxstream - chunked voxel world generation and streaming storage
//!
//! Headless driver: loads the generation config, streams chunks around spawn,
//! and optionally writes a metrics report and a per-tick event log.

mod config;
mod headless;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "voxstream", version, about = "Stream procedurally generated voxel chunks")]
struct Cli {
    /// World generation config (TOML).
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the world seed from the config file.
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum scheduler ticks to run.
    #[arg(long, default_value_t = 500)]
    ticks: u64,

    /// View radius around spawn, in chunks.
    #[arg(long, default_value_t = 2)]
    radius: i32,

    /// Sleep between ticks at the configured tick interval.
    #[arg(long)]
    realtime: bool,

    /// Write a JSON metrics report here.
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Write one JSON line per tick here.
    #[arg(long)]
    events: Option<PathBuf>,

    /// Write the effective config to this path and exit.
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // WARN by default; RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    info!("Starting voxstream v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut worldgen = config::load_from_path(&cli.config);
    if let Some(seed) = cli.seed {
        worldgen.world_seed = seed;
    }

    if let Some(path) = &cli.dump_config {
        config::save_to_path(&worldgen, path)?;
        info!(path = %path.display(), "config written");
        return Ok(());
    }

    headless::run(headless::HeadlessConfig {
        worldgen,
        radius: cli.radius.max(0),
        max_ticks: cli.ticks,
        realtime: cli.realtime,
        metrics: cli.metrics,
        events: cli.events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let cli = Cli::parse_from(["voxstream"]);
        assert_eq!(cli.config, PathBuf::from("config/worldgen.toml"));
        assert_eq!(cli.ticks, 500);
        assert_eq!(cli.radius, 2);
        assert!(cli.seed.is_none());
    }

    #[test]
    fn overrides_parse() {
        let cli = Cli::parse_from([
            "voxstream",
            "--seed",
            "42",
            "--radius",
            "3",
            "--events",
            "target/events.jsonl",
        ]);
        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.radius, 3);
        assert_eq!(cli.events, Some(PathBuf::from("target/events.jsonl")));
    }
}
