//! Stealth simulator binary.
//!
//! ```bash
//! # Bundled courtyard scenario, transitions on stderr
//! cargo run -p stealth-client
//!
//! # Another data directory, JSON tick reports on stdout
//! cargo run -p stealth-client -- --data-dir ./content --scenario rooftops --json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use stealth_client::{SimConfig, logging, sim};

/// Runs a scripted stealth scenario
#[derive(Parser, Debug)]
#[command(name = "stealth-sim")]
#[command(about = "Runs a scripted stealth scenario", long_about = None)]
#[command(version)]
struct Cli {
    /// Content directory with scoring.toml, guards.ron, and scenarios/
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Scenario name under scenarios/
    #[arg(short, long)]
    scenario: Option<String>,

    /// Number of ticks to run
    #[arg(short = 'n', long)]
    ticks: Option<u64>,

    /// Fixed timestep in seconds
    #[arg(long)]
    tick_seconds: Option<f64>,

    /// Session seed for schedule jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Log directory name
    #[arg(long)]
    session_id: Option<String>,

    /// Print every tick report as a JSON line
    #[arg(long)]
    json: bool,

    /// List the available scenarios and exit
    #[arg(long)]
    list: bool,
}

impl Cli {
    fn apply(&self, mut config: SimConfig) -> SimConfig {
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if let Some(scenario) = &self.scenario {
            config.scenario = scenario.clone();
        }
        if let Some(ticks) = self.ticks {
            config.ticks = ticks;
        }
        if let Some(seconds) = self.tick_seconds.filter(|s| *s > 0.0) {
            config.tick_seconds = seconds;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(session_id) = &self.session_id {
            config.session_id = Some(session_id.clone());
        }
        config
    }
}

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.apply(SimConfig::from_env());
    let factory = config.content_factory();

    if cli.list {
        for name in factory.list_scenarios()? {
            println!("{name}");
        }
        return Ok(());
    }

    let _guard = logging::setup_logging(&config.session_id())?;
    tracing::info!("Starting stealth-sim: {:?}", config);

    let summary = sim::run(&config, &factory, |report| {
        if cli.json {
            println!("{}", serde_json::to_string(report)?);
        }
        Ok(())
    })?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
